//! Persisted cart storage.
//!
//! The cart is persisted as a single key holding the whole serialized line
//! sequence. It is read once when the cart is restored and overwritten
//! wholesale after every mutation; concurrent sessions are not merged, the
//! last writer wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::LineItem;

/// Errors from a persisted cart store.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The stored snapshot exists but cannot be decoded.
    #[error("corrupt cart snapshot: {0}")]
    Corrupt(String),

    /// The store refused the operation.
    #[error("cart store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value storage for the cart snapshot.
pub trait CartStore {
    /// Read the stored snapshot.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Corrupt` if a snapshot exists but does not
    /// decode, or another variant if the store cannot be read.
    fn load(&self) -> Result<Option<Vec<LineItem>>, CartStoreError>;

    /// Replace the stored snapshot with `items`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, items: &[LineItem]) -> Result<(), CartStoreError>;
}

fn decode(raw: &str) -> Result<Vec<LineItem>, CartStoreError> {
    serde_json::from_str(raw).map_err(|e| CartStoreError::Corrupt(e.to_string()))
}

// =============================================================================
// FileCartStore
// =============================================================================

/// A JSON object file used as a key-value store.
///
/// Other keys in the file are preserved on write. Writes go to a sibling
/// temp file that is then renamed over the target.
/// A file that cannot be decoded is overwritten on the next write; one that
/// cannot be read at all fails the write.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
    key: String,
}

impl FileCartStore {
    /// Create a store backed by `path`, holding the cart under `key`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<Option<Map<String, Value>>, CartStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(CartStoreError::Corrupt(
                "store file is not a JSON object".to_string(),
            )),
            Err(e) => Err(CartStoreError::Corrupt(e.to_string())),
        }
    }
}

impl CartStore for FileCartStore {
    fn load(&self) -> Result<Option<Vec<LineItem>>, CartStoreError> {
        let Some(mut object) = self.read_object()? else {
            return Ok(None);
        };

        match object.remove(&self.key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| CartStoreError::Corrupt(e.to_string())),
        }
    }

    fn save(&self, items: &[LineItem]) -> Result<(), CartStoreError> {
        // Only undecodable content is overwritten; read failures propagate
        let mut object = match self.read_object() {
            Ok(object) => object.unwrap_or_default(),
            Err(CartStoreError::Corrupt(reason)) => {
                warn!(
                    %reason,
                    path = %self.path.display(),
                    "Overwriting corrupt cart store file"
                );
                Map::new()
            }
            Err(e) => return Err(e),
        };
        object.insert(self.key.clone(), serde_json::to_value(items)?);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            serde_json::to_writer(&mut file, &Value::Object(object))?;
            file.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// =============================================================================
// MemoryCartStore
// =============================================================================

/// In-process store holding the raw serialized snapshot.
///
/// Can be seeded with arbitrary (even corrupt) content and told to fail
/// writes, which makes it the store of choice for tests.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    raw: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryCartStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a raw snapshot string.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            ..Self::default()
        }
    }

    /// The raw stored snapshot, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }

    /// The decoded stored snapshot, if any and decodable.
    #[must_use]
    pub fn stored_items(&self) -> Option<Vec<LineItem>> {
        self.raw().and_then(|raw| decode(&raw).ok())
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Option<Vec<LineItem>>, CartStoreError> {
        let raw = self
            .raw
            .lock()
            .map_err(|_| CartStoreError::Unavailable("Lock poisoned".to_string()))?
            .clone();
        raw.as_deref().map(decode).transpose()
    }

    fn save(&self, items: &[LineItem]) -> Result<(), CartStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CartStoreError::Unavailable("writes disabled".to_string()));
        }
        let raw = serde_json::to_string(items)?;
        *self
            .raw
            .lock()
            .map_err(|_| CartStoreError::Unavailable("Lock poisoned".to_string()))? = Some(raw);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<S: CartStore + ?Sized> CartStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<Vec<LineItem>>, CartStoreError> {
        (**self).load()
    }

    fn save(&self, items: &[LineItem]) -> Result<(), CartStoreError> {
        (**self).save(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str) -> LineItem {
        LineItem::new(id, "bottle", "Scent", Decimal::new(100, 0), 1)
    }

    // =========================================================================
    // FileCartStore
    // =========================================================================

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCartStore::new(dir.path().join("cart.json"), "parfumCart");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip_and_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCartStore::new(dir.path().join("state/cart.json"), "parfumCart");
        store.save(&[line("A"), line("B")]).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].product_id.as_str(), "B");
    }

    #[test]
    fn test_file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileCartStore::new(&path, "parfumCart");
        store.save(&[line("A")]).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert!(raw["parfumCart"].is_array());
    }

    #[test]
    fn test_file_store_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, r#"{"parfumCart": "not a list"}"#).unwrap();

        let store = FileCartStore::new(&path, "parfumCart");
        assert!(matches!(store.load(), Err(CartStoreError::Corrupt(_))));
    }

    #[test]
    fn test_file_store_overwrites_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, "{{{").unwrap();

        let store = FileCartStore::new(&path, "parfumCart");
        store.save(&[line("A")]).unwrap();
        assert_eq!(store.load().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_read_failure_blocks_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let store = FileCartStore::new(&path, "parfumCart");
        assert!(matches!(store.save(&[line("A")]), Err(CartStoreError::Io(_))));
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.join("keep").exists());
    }

    // =========================================================================
    // MemoryCartStore
    // =========================================================================

    #[test]
    fn test_memory_store_fail_writes() {
        let store = MemoryCartStore::new();
        store.set_fail_writes(true);
        assert!(store.save(&[line("A")]).is_err());
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        store.save(&[line("A")]).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.stored_items().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_corrupt_raw() {
        let store = MemoryCartStore::with_raw("[{]");
        assert!(matches!(store.load(), Err(CartStoreError::Corrupt(_))));
    }
}
