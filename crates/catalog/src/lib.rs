use std::collections::BTreeMap;

/// Errors from the persistent dataset store.
///
/// `Blocked` is the one callers must treat as informational: a `clear`
/// could not complete because the backing store kept a handle open. It is
/// retryable and never fatal to a dataset switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Blocked,
    Unavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Blocked => write!(f, "store deletion blocked by an open handle"),
            StoreError::Unavailable => write!(f, "browser storage unavailable"),
            StoreError::Corrupt(msg) => write!(f, "store corrupt: {msg}"),
            StoreError::Io(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key-value persistence for fetched dataset payloads.
///
/// Payloads are the raw JSON text of one dataset resource; keys are the
/// fixed resource storage keys. Entries survive page reloads until
/// `clear()` succeeds.
pub trait DatasetStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, payload: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<bool, StoreError>;
    /// Removes every entry in the namespace.
    ///
    /// Returns `StoreError::Blocked` when deletion could not fully complete;
    /// the store may be left partially cleared and the caller may retry.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Content-hash version id for a dataset payload.
///
/// Used to detect that a cached entry belongs to a different dataset than
/// the one currently selected.
pub fn payload_version_id(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

/// In-memory store used natively and under test.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: BTreeMap<String, String>,
    block_next_clear: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test support: makes the next `clear()` report `Blocked` once, the
    /// way a real backing store does when another handle is still open.
    pub fn block_next_clear(&mut self) {
        self.block_next_clear = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DatasetStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, payload: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if self.block_next_clear {
            self.block_next_clear = false;
            return Err(StoreError::Blocked);
        }
        self.entries.clear();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{DatasetStore, StoreError};

    // Keep per-chunk strings relatively small to reduce peak wasm
    // allocations when payloads run to several megabytes of JSON.
    const PAYLOAD_CHUNK_CHARS: usize = 64_000;

    /// `localStorage`-backed store; payloads are chunked across entries
    /// with an index record so one oversized `set_item` cannot fail the
    /// whole put.
    #[derive(Debug)]
    pub struct LocalStorageStore {
        key_prefix: String,
    }

    impl LocalStorageStore {
        pub fn new(key_prefix: impl Into<String>) -> Result<Self, StoreError> {
            let store = Self {
                key_prefix: key_prefix.into(),
            };
            // Probe availability up front so callers learn about disabled
            // storage at construction, not mid-load.
            window_local_storage()?;
            Ok(store)
        }

        fn index_key(&self) -> String {
            format!("{}.index", self.key_prefix)
        }

        fn chunk_count_key(&self, key: &str) -> String {
            format!("{}.{}.count", self.key_prefix, key)
        }

        fn chunk_key(&self, key: &str, idx: usize) -> String {
            format!("{}.{}.{}", self.key_prefix, key, idx)
        }

        fn load_index(&self) -> Result<Vec<String>, StoreError> {
            let storage = window_local_storage()?;
            let raw = storage
                .get_item(&self.index_key())
                .map_err(|e| StoreError::Io(format!("get_item(index) failed: {:?}", e)))?;
            let Some(raw) = raw else {
                return Ok(Vec::new());
            };
            if raw.trim().is_empty() {
                return Ok(Vec::new());
            }
            let mut keys = serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            keys.sort();
            keys.dedup();
            Ok(keys)
        }

        fn save_index(&self, mut keys: Vec<String>) -> Result<(), StoreError> {
            keys.sort();
            keys.dedup();
            let storage = window_local_storage()?;
            let raw = serde_json::to_string(&keys).map_err(|e| StoreError::Io(e.to_string()))?;
            storage
                .set_item(&self.index_key(), &raw)
                .map_err(|e| StoreError::Io(format!("set_item(index) failed: {:?}", e)))?;
            Ok(())
        }

        fn load_chunk_count(&self, key: &str) -> Result<usize, StoreError> {
            let storage = window_local_storage()?;
            let raw = storage
                .get_item(&self.chunk_count_key(key))
                .map_err(|e| StoreError::Io(format!("get_item(count) failed: {:?}", e)))?;
            let Some(raw) = raw else {
                return Ok(0);
            };
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(0);
            }
            raw.parse::<usize>()
                .map_err(|e| StoreError::Corrupt(format!("invalid chunk count: {e}")))
        }

        fn remove_chunks(&self, key: &str) -> Result<(), StoreError> {
            let storage = window_local_storage()?;
            let count = self.load_chunk_count(key)?;
            for i in 0..count {
                let _ = storage.remove_item(&self.chunk_key(key, i));
            }
            let _ = storage.remove_item(&self.chunk_count_key(key));
            Ok(())
        }
    }

    impl DatasetStore for LocalStorageStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            let count = self.load_chunk_count(key)?;
            if count == 0 {
                return Ok(None);
            }
            let storage = window_local_storage()?;
            let mut out = String::new();
            for i in 0..count {
                let chunk = storage
                    .get_item(&self.chunk_key(key, i))
                    .map_err(|e| StoreError::Io(format!("get_item(chunk) failed: {:?}", e)))?
                    .ok_or_else(|| StoreError::Corrupt("missing payload chunk".to_string()))?;
                out.push_str(&chunk);
            }
            Ok(Some(out))
        }

        fn put(&mut self, key: &str, payload: &str) -> Result<(), StoreError> {
            let storage = window_local_storage()?;

            // Clean up any previous payload for this key first.
            self.remove_chunks(key)?;

            let mut count = 0usize;
            let mut start = 0usize;
            while start < payload.len() {
                let mut end = (start + PAYLOAD_CHUNK_CHARS).min(payload.len());
                // Respect char boundaries; JSON payloads are ASCII in
                // practice but ids are caller-supplied.
                while !payload.is_char_boundary(end) {
                    end -= 1;
                }
                storage
                    .set_item(&self.chunk_key(key, count), &payload[start..end])
                    .map_err(|e| StoreError::Io(format!("set_item(chunk) failed: {:?}", e)))?;
                count += 1;
                start = end;
            }

            storage
                .set_item(&self.chunk_count_key(key), &count.to_string())
                .map_err(|e| StoreError::Io(format!("set_item(count) failed: {:?}", e)))?;

            let mut keys = self.load_index()?;
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
                self.save_index(keys)?;
            }
            Ok(())
        }

        fn delete(&mut self, key: &str) -> Result<bool, StoreError> {
            let existed = self.load_chunk_count(key)? > 0;
            self.remove_chunks(key)?;
            let mut keys = self.load_index()?;
            let before = keys.len();
            keys.retain(|k| k != key);
            if keys.len() != before {
                self.save_index(keys)?;
            }
            Ok(existed)
        }

        fn clear(&mut self) -> Result<(), StoreError> {
            let keys = self.load_index()?;
            let mut blocked = false;
            for key in &keys {
                if self.remove_chunks(key).is_err() {
                    // Keep going; report Blocked once at the end so a retry
                    // can finish the job.
                    blocked = true;
                }
            }
            let storage = window_local_storage()?;
            let _ = storage.remove_item(&self.index_key());
            if blocked {
                log::warn!("dataset store clear left entries behind; retryable");
                return Err(StoreError::Blocked);
            }
            Ok(())
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, StoreError> {
        let win = web_sys::window().ok_or(StoreError::Unavailable)?;
        win.local_storage()
            .map_err(|e| StoreError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(StoreError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageStore {
    pub fn new(_key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        Err(StoreError::Unavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl DatasetStore for LocalStorageStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn put(&mut self, _key: &str, _payload: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn delete(&mut self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}
