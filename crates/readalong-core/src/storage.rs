//! Keyed blob storage.
//!
//! Every persisted concern is one opaque blob under a string key. Reads
//! never fail: a missing, unreadable or malformed blob is simply "no data".
//! Writes report errors so callers can log them, but the in-memory copy
//! stays the source of truth for the running session.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const KEY_PREFIX: &str = "book-friends";

/// Per-book persisted concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    Glossary,
    Favorites,
    Bookmarks,
    ReadingStats,
}

impl Concern {
    fn as_str(self) -> &'static str {
        match self {
            Concern::Glossary => "glossary",
            Concern::Favorites => "favorites",
            Concern::Bookmarks => "bookmarks",
            Concern::ReadingStats => "reading-stats",
        }
    }
}

/// Key for a per-book collection, e.g. `book-friends-glossary-win-friends`.
pub fn storage_key(concern: Concern, book_id: &str) -> String {
    format!("{KEY_PREFIX}-{}-{book_id}", concern.as_str())
}

/// Key for a global preference, e.g. `book-friends-theme`.
pub fn global_key(name: &str) -> String {
    format!("{KEY_PREFIX}-{name}")
}

pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Process-local store, used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(name)
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), "Failed to read stored blob: {err}");
                }
                None
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create_dir_all {}", self.root.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("write {}", path.display()))?;
        debug!(key, bytes = value.len(), "Stored blob");
        Ok(())
    }
}

/// Decode a JSON blob; `None` when absent or malformed.
pub fn load_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Option<T> {
    let bytes = store.get(key)?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, "Ignoring malformed stored value: {err}");
            None
        }
    }
}

/// Decode a JSON array blob; anything else yields an empty list.
pub fn load_list<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Vec<T> {
    load_json::<Vec<T>>(store, key).unwrap_or_default()
}

/// Encode and store `value`, logging instead of failing.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn BlobStore, key: &str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(key, "Failed to encode value for storage: {err}");
            return;
        }
    };
    if let Err(err) = store.set(key, &bytes) {
        warn!(key, "Failed to persist value: {err:#}");
    }
}

/// Read a plain UTF-8 blob (preferences are stored unquoted).
pub fn load_string(store: &dyn BlobStore, key: &str) -> Option<String> {
    let bytes = store.get(key)?;
    String::from_utf8(bytes).ok()
}

pub fn save_string(store: &dyn BlobStore, key: &str, value: &str) {
    if let Err(err) = store.set(key, value.as_bytes()) {
        warn!(key, "Failed to persist value: {err:#}");
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// Entry id such as `bm-1718000000000-3fa9c1e`.
pub fn generate_id(prefix: &str) -> String {
    let millis = now_millis();
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(millis.to_le_bytes());
    hasher.update(count.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("{prefix}-{millis}-{}", &hash[..7])
}

/// Store whose writes always fail, for exercising the degraded paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ReadOnlyStore;

#[cfg(test)]
impl BlobStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, key: &str, _value: &[u8]) -> Result<()> {
        anyhow::bail!("read-only store refused {key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_writes_are_swallowed() {
        let store = ReadOnlyStore;
        save_json(&store, "k", &vec![1, 2, 3]);
        save_string(&store, "k", "v");
        assert!(load_list::<u32>(&store, "k").is_empty());
    }

    #[test]
    fn keys_are_namespaced_by_concern_and_book() {
        assert_eq!(
            storage_key(Concern::Glossary, "win-friends"),
            "book-friends-glossary-win-friends"
        );
        assert_eq!(
            storage_key(Concern::ReadingStats, "x"),
            "book-friends-reading-stats-x"
        );
        assert_eq!(global_key("theme"), "book-friends-theme");
    }

    #[test]
    fn corrupt_payloads_degrade_to_empty() {
        let store = MemoryStore::new();
        store.set("k", b"not json").expect("set");
        assert!(load_list::<String>(&store, "k").is_empty());

        store.set("k", br#"{"an": "object"}"#).expect("set");
        assert!(load_list::<String>(&store, "k").is_empty());

        assert!(load_list::<String>(&store, "missing").is_empty());

        store.set("k", br#"["a","b"]"#).expect("set");
        assert_eq!(load_list::<String>(&store, "k"), vec!["a", "b"]);
    }

    #[test]
    fn file_store_round_trips_and_sanitizes_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("state"));
        assert!(store.get("book-friends-theme").is_none());

        save_string(&store, "book-friends-theme", "dark");
        assert_eq!(
            load_string(&store, "book-friends-theme").as_deref(),
            Some("dark")
        );

        save_json(&store, "weird/key:1", &vec![1, 2, 3]);
        assert!(dir.path().join("state").join("weird_key_1").exists());
        assert_eq!(load_list::<i32>(&store, "weird/key:1"), vec![1, 2, 3]);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id("bm");
        let b = generate_id("bm");
        assert!(a.starts_with("bm-"));
        assert_ne!(a, b);
    }
}
