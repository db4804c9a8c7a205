use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SOURCE_TAG: &str = "source";
pub const TARGET_TAG: &str = "target";

pub const DEFAULT_SOURCE_EXPRESSIONS: &[&str] = &[r"IMG_(\d{4})(\d\d)(\d\d)", r"\.jpeg$"];
pub const DEFAULT_TARGET_EXPRESSIONS: &[&str] = &["$1-$2-$3 IMG", ".jpg"];

/// Tagged string-list storage for previously entered expressions.
pub trait HistoryStore {
    fn read_list(&self, tag: &str) -> Result<Vec<String>>;
    fn write_list(&mut self, tag: &str, values: &[String]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("{tag}.json"))
    }
}

impl HistoryStore for FileHistoryStore {
    fn read_list(&self, tag: &str) -> Result<Vec<String>> {
        let path = self.path_for(tag);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("could not read history: {}", path.display()))?;
        // A corrupt file is treated as empty history.
        Ok(serde_json::from_str::<Vec<String>>(&raw).unwrap_or_default())
    }

    fn write_list(&mut self, tag: &str, values: &[String]) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("could not create history directory: {}", self.dir.display())
        })?;
        let path = self.path_for(tag);
        let body = serde_json::to_string_pretty(values).context("could not serialize history")?;
        fs::write(&path, body)
            .with_context(|| format!("could not write history: {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    lists: HashMap<String, Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn read_list(&self, tag: &str) -> Result<Vec<String>> {
        Ok(self.lists.get(tag).cloned().unwrap_or_default())
    }

    fn write_list(&mut self, tag: &str, values: &[String]) -> Result<()> {
        self.lists.insert(tag.to_string(), values.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionHistory {
    tag: String,
    entries: Vec<String>,
}

impl ExpressionHistory {
    /// Loads stored entries; `defaults` are kept only when nothing is stored.
    pub fn load(store: &dyn HistoryStore, tag: &str, defaults: &[&str]) -> Result<Self> {
        let stored = store.read_list(tag)?;
        let entries = if stored.is_empty() {
            defaults.iter().map(|s| s.to_string()).collect()
        } else {
            stored
        };
        Ok(Self {
            tag: tag.to_string(),
            entries,
        })
    }

    pub fn load_sources(store: &dyn HistoryStore) -> Result<Self> {
        Self::load(store, SOURCE_TAG, DEFAULT_SOURCE_EXPRESSIONS)
    }

    pub fn load_targets(store: &dyn HistoryStore) -> Result<Self> {
        Self::load(store, TARGET_TAG, DEFAULT_TARGET_EXPRESSIONS)
    }

    /// Appends `text` and saves. Blank or already-known text is ignored.
    pub fn remember(&mut self, store: &mut dyn HistoryStore, text: &str) -> Result<bool> {
        if text.trim().is_empty() || self.entries.iter().any(|e| e == text) {
            return Ok(false);
        }
        self.entries.push(text.to_string());
        store.write_list(&self.tag, &self.entries)?;
        Ok(true)
    }

    pub fn forget(&mut self, store: &mut dyn HistoryStore, text: &str) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e != text);
        if self.entries.len() == before {
            return Ok(false);
        }
        store.write_list(&self.tag, &self.entries)?;
        Ok(true)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_used_when_nothing_stored() {
        let store = MemoryHistoryStore::new();
        let history = ExpressionHistory::load_sources(&store).expect("load");
        assert_eq!(history.entries(), DEFAULT_SOURCE_EXPRESSIONS);
    }

    #[test]
    fn remember_skips_blank_and_duplicates() {
        let mut store = MemoryHistoryStore::new();
        let mut history = ExpressionHistory::load(&store, "t", &[]).expect("load");
        assert!(history.remember(&mut store, "cat").expect("remember"));
        assert!(!history.remember(&mut store, "cat").expect("remember"));
        assert!(!history.remember(&mut store, "   ").expect("remember"));
        assert_eq!(store.read_list("t").expect("read"), vec!["cat".to_string()]);
    }

    #[test]
    fn stored_entries_replace_defaults() {
        let mut store = MemoryHistoryStore::new();
        store
            .write_list(TARGET_TAG, &["dog".to_string()])
            .expect("write");
        let history = ExpressionHistory::load_targets(&store).expect("load");
        assert_eq!(history.entries(), ["dog".to_string()]);
    }

    #[test]
    fn file_store_round_trips_and_forgets() {
        let temp = tempdir().expect("tempdir");
        let mut store = FileHistoryStore::new(temp.path().join("history"));
        let values: Vec<String> = ["111", "222", "333", "444"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        store.write_list("test", &values).expect("write");
        assert_eq!(store.read_list("test").expect("read").len(), 4);

        let mut history = ExpressionHistory::load(&store, "test", &[]).expect("load");
        assert!(history.forget(&mut store, "222").expect("forget"));
        assert!(!history.forget(&mut store, "222").expect("forget"));
        assert_eq!(store.read_list("test").expect("read").len(), 3);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let temp = tempdir().expect("tempdir");
        let store = FileHistoryStore::new(temp.path());
        fs::write(temp.path().join("source.json"), "{not json").expect("write");
        assert!(store.read_list(SOURCE_TAG).expect("read").is_empty());
    }
}
