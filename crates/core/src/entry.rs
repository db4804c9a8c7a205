use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),
    #[error("file name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),
    #[error("cannot resolve absolute path for {path}: {source}")]
    Absolute {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    source_name: String,
    target_name: String,
    folder_path: PathBuf,
    is_conflict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    name: String,
    folder: String,
}

impl FileEntry {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EntryError> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|source| EntryError::Absolute {
            path: path.to_path_buf(),
            source,
        })?;
        let name = absolute
            .file_name()
            .ok_or_else(|| EntryError::NoFileName(absolute.clone()))?
            .to_str()
            .ok_or_else(|| EntryError::NonUtf8Name(absolute.clone()))?
            .to_string();
        let folder = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self::new(folder, name))
    }

    pub fn new(folder_path: impl Into<PathBuf>, source_name: impl Into<String>) -> Self {
        let source_name = source_name.into();
        Self {
            target_name: source_name.clone(),
            source_name,
            folder_path: folder_path.into(),
            is_conflict: false,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn folder_path(&self) -> &Path {
        &self.folder_path
    }

    pub fn is_conflict(&self) -> bool {
        self.is_conflict
    }

    pub fn is_same_name(&self) -> bool {
        self.source_name == self.target_name
    }

    pub fn source_path(&self) -> PathBuf {
        self.folder_path.join(&self.source_name)
    }

    pub fn target_path(&self) -> PathBuf {
        self.folder_path.join(&self.target_name)
    }

    /// Byte-for-byte equality of the two full paths. Unlike `is_same_name`
    /// this is a degenerate rename rather than a "nothing to do" state.
    pub fn source_target_paths_identical(&self) -> bool {
        self.source_path().as_os_str() == self.target_path().as_os_str()
    }

    /// False when the target would leave the entry's folder or name no file.
    pub fn has_plain_target_name(&self) -> bool {
        is_plain_file_name(&self.target_name)
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            name: self.source_name.to_lowercase(),
            folder: self.folder_path.to_string_lossy().to_lowercase(),
        }
    }

    pub fn same_entry(&self, other: &FileEntry) -> bool {
        self.key() == other.key()
    }

    /// Returns true when the value changed.
    pub fn set_target_name(&mut self, target_name: impl Into<String>) -> bool {
        let target_name = target_name.into();
        if self.target_name == target_name {
            return false;
        }
        self.target_name = target_name;
        true
    }

    pub fn set_conflict(&mut self, is_conflict: bool) -> bool {
        if self.is_conflict == is_conflict {
            return false;
        }
        self.is_conflict = is_conflict;
        true
    }

    pub fn reset_target(&mut self) -> bool {
        let target_changed = self.set_target_name(self.source_name.clone());
        let conflict_changed = self.set_conflict(false);
        target_changed || conflict_changed
    }

    pub(crate) fn mark_renamed(&mut self) {
        self.source_name = self.target_name.clone();
        self.is_conflict = false;
    }
}

pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.chars().any(std::path::is_separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("dog.jpg"));
        assert!(is_plain_file_name("..dog"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../dog"));
        assert!(!is_plain_file_name("sub/dog"));
    }

    #[test]
    fn new_entry_targets_its_own_name() {
        let entry = FileEntry::new("/photos", "cat.jpg");
        assert_eq!(entry.target_name(), "cat.jpg");
        assert!(entry.is_same_name());
        assert!(!entry.is_conflict());
    }

    #[test]
    fn from_path_splits_folder_and_name() {
        let entry = FileEntry::from_path("/test/path/File.txt").expect("entry");
        assert_eq!(entry.source_name(), "File.txt");
        assert_eq!(entry.folder_path(), Path::new("/test/path"));
        assert_eq!(entry.source_path(), PathBuf::from("/test/path/File.txt"));
    }

    #[test]
    fn from_path_makes_relative_paths_absolute() {
        let entry = FileEntry::from_path("relative.txt").expect("entry");
        assert!(entry.folder_path().is_absolute());
    }

    #[test]
    fn identity_ignores_case() {
        let pairs = [
            ("/Test/Path/FILE.txt", "/Test/Path/file.txt"),
            ("/Test/PATH/File.txt", "/Test/path/File.txt"),
            ("/Test/Path/File.txt", "/test/Path/File.txt"),
        ];
        for (a, b) in pairs {
            let a = FileEntry::from_path(a).expect("entry a");
            let b = FileEntry::from_path(b).expect("entry b");
            assert!(a.same_entry(&b), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn identity_distinguishes_folders() {
        let a = FileEntry::from_path("/Test/Path1/File.txt").expect("entry a");
        let b = FileEntry::from_path("/Test/Path2/File.txt").expect("entry b");
        assert!(!a.same_entry(&b));
    }

    #[test]
    fn setters_report_changes() {
        let mut entry = FileEntry::new("/x", "cat");
        assert!(entry.set_target_name("dog"));
        assert!(!entry.set_target_name("dog"));
        assert!(!entry.is_same_name());
        assert!(entry.set_conflict(true));
        assert!(!entry.set_conflict(true));
        assert!(entry.reset_target());
        assert!(entry.is_same_name());
        assert!(!entry.is_conflict());
    }

    #[test]
    fn case_only_rename_is_not_identical_path() {
        let mut entry = FileEntry::new("/x", "FILE.txt");
        entry.set_target_name("file.txt");
        assert!(!entry.is_same_name());
        assert!(!entry.source_target_paths_identical());
    }

    #[test]
    fn mark_renamed_adopts_target() {
        let mut entry = FileEntry::new("/x", "cat");
        entry.set_target_name("dog");
        entry.set_conflict(true);
        entry.mark_renamed();
        assert_eq!(entry.source_name(), "dog");
        assert!(entry.is_same_name());
        assert!(!entry.is_conflict());
    }
}
