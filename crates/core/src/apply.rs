use crate::entry::FileEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("source and target are the same path: {0}")]
    IdenticalPath(PathBuf),
    #[error("target is not a plain file name: {0:?}")]
    InvalidTargetName(String),
    #[error("target already exists: {0}")]
    TargetExists(PathBuf),
    #[error("unable to rename {from} to {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Renamed,
    SkippedConflict,
    SkippedUnchanged,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitReport {
    pub outcomes: Vec<EntryOutcome>,
    pub renamed: usize,
    pub skipped_conflict: usize,
    pub skipped_unchanged: usize,
    pub failed: usize,
}

impl CommitReport {
    fn record(&mut self, source_path: PathBuf, target_path: PathBuf, status: OutcomeStatus) {
        match &status {
            OutcomeStatus::Renamed => self.renamed += 1,
            OutcomeStatus::SkippedConflict => self.skipped_conflict += 1,
            OutcomeStatus::SkippedUnchanged => self.skipped_unchanged += 1,
            OutcomeStatus::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(EntryOutcome {
            source_path,
            target_path,
            status,
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
    }
}

/// Renames every planned entry in order. Conflicted and unchanged entries are
/// skipped; a failed rename flags its entry as conflicted and the batch goes on.
///
/// Targets freed or occupied by earlier renames of the same batch are not
/// re-planned; an entry whose target is still held on disk simply fails.
pub fn commit(entries: &mut [FileEntry]) -> CommitReport {
    let mut report = CommitReport::default();

    for entry in entries.iter_mut() {
        let source_path = entry.source_path();
        let target_path = entry.target_path();

        if entry.is_conflict() {
            report.record(source_path, target_path, OutcomeStatus::SkippedConflict);
            continue;
        }
        if entry.is_same_name() {
            report.record(source_path, target_path, OutcomeStatus::SkippedUnchanged);
            continue;
        }

        match rename_entry(entry) {
            Ok(()) => {
                info!(from = %source_path.display(), to = %target_path.display(), "renamed");
                report.record(source_path, target_path, OutcomeStatus::Renamed);
            }
            Err(err) => {
                warn!(error = %err, "rename failed");
                entry.set_conflict(true);
                report.record(
                    source_path,
                    target_path,
                    OutcomeStatus::Failed {
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    info!(
        renamed = report.renamed,
        skipped_conflict = report.skipped_conflict,
        skipped_unchanged = report.skipped_unchanged,
        failed = report.failed,
        "commit finished"
    );
    report
}

pub fn rename_entry(entry: &mut FileEntry) -> Result<(), RenameError> {
    if !entry.has_plain_target_name() {
        return Err(RenameError::InvalidTargetName(entry.target_name().to_string()));
    }
    let from = entry.source_path();
    let to = entry.target_path();

    if entry.source_target_paths_identical() {
        return Err(RenameError::IdenticalPath(from));
    }

    // fs::rename replaces an existing target on Unix.
    if fs::symlink_metadata(&to).is_ok() && !is_same_file(&from, &to) {
        return Err(RenameError::TargetExists(to));
    }

    fs::rename(&from, &to).map_err(|source| RenameError::Io {
        from: from.clone(),
        to: to.clone(),
        source,
    })?;
    entry.mark_renamed();
    Ok(())
}

/// True when both paths name one file, as a case-only rename does on a
/// case-insensitive volume.
#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}
