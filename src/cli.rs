//! Shared helpers for the AeroChain binaries

use crate::blockchain::Ledger;
use crate::config::{load_config, Config, StorageBackend};
use crate::error::LedgerError;
use crate::persistence::{Database, FileStore, InMemoryPersistence, LedgerStore, Persistence};
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the storage backend described by `config`.
pub fn open_persistence(config: &Config) -> Result<Box<dyn Persistence>, LedgerError> {
    let storage = &config.storage;
    let backend: Box<dyn Persistence> = match storage.backend {
        StorageBackend::Sqlite => {
            if let Some(parent) = Path::new(&storage.path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| {
                        LedgerError::StoreUnavailable(format!(
                            "Failed to create data dir {:?}: {}",
                            parent, e
                        ))
                    })?;
                }
            }
            Box::new(Database::open(&storage.path)?)
        }
        StorageBackend::File => Box::new(FileStore::open(&storage.path)?),
        StorageBackend::Memory => Box::new(InMemoryPersistence::new()),
    };

    info!(
        backend = ?storage.backend,
        path = %storage.path,
        key = %storage.key,
        "ledger.store_opened"
    );
    Ok(backend)
}

pub fn open_ledger(config: &Config) -> Result<Ledger, LedgerError> {
    let backend = open_persistence(config)?;
    Ok(Ledger::new(LedgerStore::with_key(backend, config.storage.key.clone())))
}

/// Load configuration and open the ledger it points at.
pub fn open_ledger_from_config() -> Result<(Config, Ledger), LedgerError> {
    let config = load_config()?;
    let ledger = open_ledger(&config)?;
    Ok((config, ledger))
}

/// Shorten a hex digest for table display.
pub fn short_hash(hash: &str) -> String {
    if hash.len() > 16 {
        format!("{}...{}", &hash[..8], &hash[hash.len() - 6..])
    } else {
        hash.to_string()
    }
}
