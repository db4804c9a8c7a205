use crate::entry::FileEntry;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Default)]
pub struct ClaimedTargets {
    paths: HashSet<String>,
}

impl ClaimedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether `entry`'s planned target collides, then claims it.
    /// The first entry to claim a path wins; later ones conflict.
    /// A target that is not a plain file name always conflicts and claims
    /// nothing.
    pub fn check_and_claim(&mut self, entry: &FileEntry) -> bool {
        if !entry.has_plain_target_name() {
            return true;
        }
        let identical = entry.source_target_paths_identical();
        let newly_claimed = self.paths.insert(claim_key(&entry.target_path()));
        identical || !newly_claimed
    }

    pub fn is_claimed(&self, path: &Path) -> bool {
        self.paths.contains(&claim_key(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn claim_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
