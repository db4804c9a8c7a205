mod apply;
mod collection;
mod config;
mod conflict;
mod entry;
mod history;
mod planner;
mod sequence;
mod template;

pub use apply::{commit, rename_entry, CommitReport, EntryOutcome, OutcomeStatus, RenameError};
pub use collection::{AddReport, CollectionEvent, EntryCollection, SubscriptionId};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use conflict::ClaimedTargets;
pub use entry::{is_plain_file_name, EntryError, EntryKey, FileEntry};
pub use history::{
    ExpressionHistory, FileHistoryStore, HistoryStore, MemoryHistoryStore,
    DEFAULT_SOURCE_EXPRESSIONS, DEFAULT_TARGET_EXPRESSIONS, SOURCE_TAG, TARGET_TAG,
};
pub use planner::{replan, PlanStats, RenameRule};
pub use sequence::{apply_sequence, DEFAULT_SEQUENCE_MARKER};
pub use template::{
    compute_target, parse_replacement, CompiledRule, ReplacementPart, TemplateError,
};
