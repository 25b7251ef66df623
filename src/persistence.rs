//! Storage layer for AeroChain
//!
//! The engine only needs a key-value byte store. [`Persistence`] is that
//! store; [`LedgerStore`] binds one to a key and owns the chain's on-disk
//! encoding.

use crate::blockchain::Block;
use crate::error::LedgerError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Key the chain is stored under unless configured otherwise.
pub const DEFAULT_LEDGER_KEY: &str = "aerochain_ledger";

/// Abstraction for persistence backends. A `put` must either fully replace
/// the value or leave the previous value readable.
pub trait Persistence: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LedgerError>;
}

/// SQLite-backed store with a single key-value table.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to open database: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to create kv table: {}", e)))?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }
}

impl Persistence for Database {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::StoreUnavailable("Mutex poisoned".to_string()))?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, Vec<u8>>(0)
        })
        .optional()
        .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to read {}: {}", key, e)))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LedgerError> {
        let conn_guard = self
            .conn
            .lock()
            .map_err(|_| LedgerError::StoreUnavailable("Mutex poisoned".to_string()))?;
        let tx = conn_guard.unchecked_transaction().map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, bytes],
        )
        .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to write {}: {}", key, e)))?;

        tx.commit().map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }
}

/// Directory-backed store: one file per key, replaced by atomic rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LedgerError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LedgerError::InvalidInput(format!(
                "Storage key {:?} may only contain ASCII letters, digits, '_' and '-'",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Persistence for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::StoreUnavailable(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LedgerError> {
        let path = self.path_for(key)?;

        // Temp file must live in the same directory for the rename to be atomic.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
///
/// Clones share the same entries, so a test can keep a handle and inspect or
/// tamper with what the engine wrote.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get`/`put` fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Persistence for InMemoryPersistence {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.check_available()?;
        let entries = self
            .entries
            .lock()
            .map_err(|_| LedgerError::StoreUnavailable("Mutex poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LedgerError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LedgerError::StoreUnavailable("Mutex poisoned".to_string()))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// The chain's view of a [`Persistence`] backend: one key, JSON encoding.
pub struct LedgerStore {
    backend: Box<dyn Persistence>,
    key: String,
}

impl LedgerStore {
    pub fn new(backend: Box<dyn Persistence>) -> Self {
        Self::with_key(backend, DEFAULT_LEDGER_KEY)
    }

    pub fn with_key(backend: Box<dyn Persistence>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted chain. `None` only when the key holds nothing; a
    /// stored empty array comes back as an empty chain for validation to flag.
    pub fn load(&self) -> Result<Option<Vec<Block>>, LedgerError> {
        let Some(bytes) = self.backend.get(&self.key)? else {
            debug!(key = %self.key, "ledger.store.load: absent");
            return Ok(None);
        };

        let chain: Vec<Block> = serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::Serialization(format!("Stored chain under {} is unreadable: {}", self.key, e))
        })?;
        debug!(key = %self.key, blocks = chain.len(), "ledger.store.load");
        Ok(Some(chain))
    }

    pub fn save(&self, chain: &[Block]) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(chain)?;
        self.backend.put(&self.key, &bytes)?;
        debug!(key = %self.key, blocks = chain.len(), bytes = bytes.len(), "ledger.store.save");
        Ok(())
    }
}
