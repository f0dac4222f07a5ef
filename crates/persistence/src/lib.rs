#![deny(warnings)]

//! Persistence layer: durable key/value storage and the bookmarked player list.

use ore_core::Bookmark;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Key holding the serialized bookmark list.
pub const BOOKMARKS_KEY: &str = "bookmarkedPlayerTags";

/// Returns the default directory used for local saves.
pub fn default_store_dir() -> &'static str {
    "./saves"
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Named string values that survive process restarts.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Overwrite `key` in full.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile store, handy for tests and sessions that should not persist.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Bookmarked players, deduplicated by tag and mirrored to a store.
///
/// The store is the source of truth across restarts: the list is read once
/// on load and rewritten in full after every change.
pub struct BookmarkBook {
    store: Box<dyn KeyValueStore + Send>,
    entries: Vec<Bookmark>,
}

impl std::fmt::Debug for BookmarkBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookmarkBook")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl BookmarkBook {
    /// Read bookmarks from `store`. Unreadable or malformed content is
    /// discarded and the key cleared.
    pub fn load<S: KeyValueStore + Send + 'static>(store: S) -> Self {
        let mut store: Box<dyn KeyValueStore + Send> = Box::new(store);
        let entries = match store.get(BOOKMARKS_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<Vec<Bookmark>>(&text) {
                Ok(list) => dedup_by_tag(list),
                Err(e) => {
                    warn!(error = %e, "discarding malformed bookmarks");
                    if let Err(e) = store.remove(BOOKMARKS_KEY) {
                        warn!(error = %e, "failed to clear malformed bookmarks");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read bookmarks");
                Vec::new()
            }
        };
        Self { store, entries }
    }

    pub fn entries(&self) -> &[Bookmark] {
        &self.entries
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|b| b.tag == tag)
    }

    /// Append a bookmark. Returns `false` when the tag is already saved.
    pub fn add(&mut self, bookmark: Bookmark) -> Result<bool, StoreError> {
        if self.contains(&bookmark.tag) {
            return Ok(false);
        }
        info!(tag = %bookmark.tag, name = %bookmark.name, "bookmark added");
        self.entries.push(bookmark);
        self.persist()?;
        Ok(true)
    }

    /// Drop the bookmark for `tag`. Returns `false` when none matched.
    pub fn remove(&mut self, tag: &str) -> Result<bool, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|b| b.tag != tag);
        if self.entries.len() == before {
            return Ok(false);
        }
        info!(%tag, "bookmark removed");
        self.persist()?;
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let text = serde_json::to_string(&self.entries)?;
        self.store.set(BOOKMARKS_KEY, &text)
    }
}

fn dedup_by_tag(list: Vec<Bookmark>) -> Vec<Bookmark> {
    let mut out: Vec<Bookmark> = Vec::with_capacity(list.len());
    for b in list {
        if !out.iter().any(|seen| seen.tag == b.tag) {
            out.push(b);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(tag: &str, name: &str) -> Bookmark {
        Bookmark {
            tag: tag.to_string(),
            name: name.to_string(),
        }
    }

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ore-persistence-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn default_dir_is_relative() {
        assert!(default_store_dir().starts_with("./"));
    }

    #[test]
    fn adding_existing_tag_is_noop() {
        let mut book = BookmarkBook::load(MemoryStore::default());
        assert!(book.add(bm("#2PP", "Alice")).unwrap());
        assert!(!book.add(bm("#2PP", "Renamed")).unwrap());
        assert_eq!(book.entries(), &[bm("#2PP", "Alice")]);
    }

    #[test]
    fn remove_unknown_tag_reports_false() {
        let mut book = BookmarkBook::load(MemoryStore::default());
        book.add(bm("#A", "a")).unwrap();
        assert!(!book.remove("#B").unwrap());
        assert!(book.remove("#A").unwrap());
        assert!(book.entries().is_empty());
    }

    #[test]
    fn malformed_content_is_discarded_and_cleared() {
        let mut store = MemoryStore::default();
        store.set(BOOKMARKS_KEY, "{not json").unwrap();
        let book = BookmarkBook::load(store);
        assert!(book.entries().is_empty());
    }

    #[test]
    fn duplicate_tags_in_storage_collapse() {
        let mut store = MemoryStore::default();
        store
            .set(
                BOOKMARKS_KEY,
                r##"[{"tag":"#A","name":"a"},{"tag":"#A","name":"again"},{"tag":"#B","name":"b"}]"##,
            )
            .unwrap();
        let book = BookmarkBook::load(store);
        assert_eq!(book.entries(), &[bm("#A", "a"), bm("#B", "b")]);
    }

    #[test]
    fn file_store_survives_reload() {
        let dir = temp_dir("reload");
        {
            let mut book = BookmarkBook::load(FileStore::open(&dir).unwrap());
            book.add(bm("#P1", "One")).unwrap();
            book.add(bm("#P2", "Two")).unwrap();
            book.remove("#P1").unwrap();
        }
        let book = BookmarkBook::load(FileStore::open(&dir).unwrap());
        assert_eq!(book.entries(), &[bm("#P2", "Two")]);
        let raw = FileStore::open(&dir).unwrap().get(BOOKMARKS_KEY).unwrap().unwrap();
        assert_eq!(raw, r##"[{"tag":"#P2","name":"Two"}]"##);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_clears_corrupt_file() {
        let dir = temp_dir("corrupt");
        let mut store = FileStore::open(&dir).unwrap();
        store.set(BOOKMARKS_KEY, "[[[").unwrap();
        let book = BookmarkBook::load(store);
        assert!(book.entries().is_empty());
        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get(BOOKMARKS_KEY).unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
