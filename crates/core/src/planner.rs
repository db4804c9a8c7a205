use crate::conflict::ClaimedTargets;
use crate::entry::FileEntry;
use crate::sequence::{apply_sequence, DEFAULT_SEQUENCE_MARKER};
use crate::template::{CompiledRule, TemplateError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameRule {
    pub source_pattern: String,
    pub target_template: String,
    pub case_sensitive: bool,
    pub replace_all: bool,
    pub sequenced: bool,
    pub sequence_start: i64,
    pub sequence_marker: char,
}

impl Default for RenameRule {
    fn default() -> Self {
        Self {
            source_pattern: String::new(),
            target_template: String::new(),
            case_sensitive: false,
            replace_all: false,
            sequenced: false,
            sequence_start: 1,
            sequence_marker: DEFAULT_SEQUENCE_MARKER,
        }
    }
}

impl RenameRule {
    pub fn new(source_pattern: impl Into<String>, target_template: impl Into<String>) -> Self {
        Self {
            source_pattern: source_pattern.into(),
            target_template: target_template.into(),
            ..Self::default()
        }
    }

    pub fn compile(&self) -> Result<CompiledRule, TemplateError> {
        CompiledRule::compile(
            &self.source_pattern,
            &self.target_template,
            self.case_sensitive,
            self.replace_all,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub renames: usize,
    pub unchanged: usize,
    pub conflicts: usize,
}

/// Recomputes every entry's target name and conflict flag in collection order.
///
/// An empty pattern resets all targets to their sources. A pattern that fails
/// to compile returns the error before any entry is touched, so the previous
/// plan stays visible.
pub fn replan(entries: &mut [FileEntry], rule: &RenameRule) -> Result<PlanStats, TemplateError> {
    if rule.source_pattern.is_empty() {
        for entry in entries.iter_mut() {
            entry.reset_target();
        }
        return Ok(PlanStats {
            unchanged: entries.len(),
            ..PlanStats::default()
        });
    }

    let compiled = rule.compile()?;
    let mut stats = PlanStats::default();
    let mut claimed = ClaimedTargets::new();
    let mut counter = rule.sequence_start;

    for entry in entries.iter_mut() {
        let Some(replaced) = compiled.apply(entry.source_name()) else {
            entry.reset_target();
            stats.unchanged += 1;
            continue;
        };

        let (target, next) =
            apply_sequence(&replaced, counter, rule.sequenced, rule.sequence_marker);
        counter = next;
        entry.set_target_name(target);

        if entry.is_same_name() {
            entry.set_conflict(false);
            stats.unchanged += 1;
            continue;
        }

        let conflict = claimed.check_and_claim(entry);
        entry.set_conflict(conflict);
        if conflict {
            stats.conflicts += 1;
        } else {
            stats.renames += 1;
        }
        debug!(
            source = entry.source_name(),
            target = entry.target_name(),
            conflict,
            "planned rename"
        );
    }

    info!(
        renames = stats.renames,
        unchanged = stats.unchanged,
        conflicts = stats.conflicts,
        "plan updated"
    );
    Ok(stats)
}
