use crate::apply::{commit, CommitReport};
use crate::entry::{EntryKey, FileEntry};
use crate::planner::{replan, PlanStats, RenameRule};
use crate::template::TemplateError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    Added { index: usize },
    Removed { index: usize },
    Updated { index: usize },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CollectionEvent)>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddReport {
    pub added: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

#[derive(Default)]
pub struct EntryCollection {
    entries: Vec<FileEntry>,
    keys: HashMap<EntryKey, usize>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl EntryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds files and, recursively, the files inside directories. Within a
    /// directory its files come before its subdirectories, each sorted by name.
    pub fn add_paths<I, P>(&mut self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                self.add_directory(path, &mut report);
            } else {
                self.add_file(path, &mut report);
            }
        }
        report
    }

    /// Returns false when the path was already present or could not be used.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> bool {
        let report = self.add_paths([path]);
        report.added > 0
    }

    fn add_directory(&mut self, root: &Path, report: &mut AddReport) {
        let walker = WalkDir::new(root).sort_by(files_before_directories);
        for item in walker {
            match item {
                Ok(item) if item.file_type().is_dir() => continue,
                Ok(item) => self.add_file(item.path(), report),
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "directory walk failed");
                    report.errors.push(err.to_string());
                }
            }
        }
    }

    fn add_file(&mut self, path: &Path, report: &mut AddReport) {
        let entry = match FileEntry::from_path(path) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "path skipped");
                report.errors.push(err.to_string());
                return;
            }
        };
        if self.push(entry) {
            report.added += 1;
        } else {
            debug!(path = %path.display(), "already in list");
            report.duplicates += 1;
        }
    }

    /// Appends an entry unless one with the same case-insensitive identity is
    /// already present.
    pub fn push(&mut self, entry: FileEntry) -> bool {
        let key = entry.key();
        if self.keys.contains_key(&key) {
            return false;
        }
        self.keys.insert(key, 1);
        self.entries.push(entry);
        debug_assert_eq!(
            self.keys.values().sum::<usize>(),
            self.entries.len(),
            "entry keys out of sync"
        );
        let index = self.entries.len() - 1;
        self.notify(CollectionEvent::Added { index });
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<FileEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        self.release_key(&entry.key());
        self.notify(CollectionEvent::Removed { index });
        Some(entry)
    }

    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&FileEntry) -> bool,
    {
        let mut removed = 0usize;
        let mut index = 0usize;
        while index < self.entries.len() {
            if predicate(&self.entries[index]) {
                self.remove(index);
                removed += 1;
            } else {
                index += 1;
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
        self.notify(CollectionEvent::Cleared);
    }

    pub fn contains_path(&self, path: impl AsRef<Path>) -> bool {
        FileEntry::from_path(path)
            .map(|entry| self.keys.contains_key(&entry.key()))
            .unwrap_or(false)
    }

    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn target_paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(FileEntry::target_path).collect()
    }

    /// Re-plans every entry. On a pattern error nothing changes and no
    /// notification is sent.
    pub fn replan(&mut self, rule: &RenameRule) -> Result<PlanStats, TemplateError> {
        let before = self.entries.clone();
        let stats = replan(&mut self.entries, rule)?;
        self.notify_changed(&before);
        Ok(stats)
    }

    pub fn commit(&mut self) -> CommitReport {
        let before = self.entries.clone();
        let report = commit(&mut self.entries);
        self.rebuild_keys();
        self.notify_changed(&before);
        report
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CollectionEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, event: CollectionEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    fn notify_changed(&mut self, before: &[FileEntry]) {
        let changed: Vec<usize> = self
            .entries
            .iter()
            .zip(before)
            .enumerate()
            .filter(|(_, (now, then))| now != then)
            .map(|(index, _)| index)
            .collect();
        for index in changed {
            self.notify(CollectionEvent::Updated { index });
        }
    }

    fn release_key(&mut self, key: &EntryKey) {
        if let Some(count) = self.keys.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.keys.remove(key);
            }
        }
    }

    /// Renames can leave two entries differing only by case (`cat` -> `dog`
    /// next to `DOG` on a case-sensitive volume). Both stay listed; the key
    /// is held until the last of them is removed.
    fn rebuild_keys(&mut self) {
        self.keys.clear();
        for entry in &self.entries {
            *self.keys.entry(entry.key()).or_insert(0) += 1;
        }
        if self.keys.len() != self.entries.len() {
            warn!("entries now differ only by case");
        }
    }
}

impl std::fmt::Debug for EntryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCollection")
            .field("entries", &self.entries)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

fn files_before_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}
