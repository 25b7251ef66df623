use crate::crypto::{HashFunction, Sha256Hasher};
use crate::error::LedgerError;
use crate::persistence::{LedgerStore, Persistence};
use crate::record::types::write_str;
use crate::record::{Record, RecordInput};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::validation::{validate_chain, ValidationReport};

/// `previous_hash` of the genesis block. Never a valid digest output.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// 2023-01-01T00:00:00.000Z in epoch milliseconds.
pub const GENESIS_TIMESTAMP: i64 = 1672531200000;
pub const GENESIS_RECORD_ID: &str = "genesis_id";

const DIGEST_DOMAIN: &[u8] = b"aerochain.block.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    /// Epoch milliseconds of the append, not of the maintenance action.
    pub created_at: i64,
    pub record: Record,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Recompute this block's digest from its stored fields.
    pub fn compute_hash(&self, hasher: &dyn HashFunction) -> String {
        digest(
            hasher,
            &self.record,
            self.created_at,
            &self.previous_hash,
            self.index,
        )
    }
}

/// Canonical byte encoding of everything a block hash commits to.
pub fn canonical_bytes(record: &Record, created_at: i64, previous_hash: &str, index: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    buf.extend_from_slice(DIGEST_DOMAIN);
    record.write_canonical(&mut buf);
    buf.extend_from_slice(&created_at.to_le_bytes());
    write_str(&mut buf, previous_hash);
    buf.extend_from_slice(&index.to_le_bytes());
    buf
}

pub fn digest(
    hasher: &dyn HashFunction,
    record: &Record,
    created_at: i64,
    previous_hash: &str,
    index: u64,
) -> String {
    hasher.hash(&canonical_bytes(record, created_at, previous_hash, index))
}

pub fn genesis_record() -> Record {
    Record {
        id: GENESIS_RECORD_ID.to_string(),
        subject_id: "N/A".to_string(),
        occurred_at: "2023-01-01T00:00:00.000Z".to_string(),
        performed_by: "System".to_string(),
        description: "Ledger Initialized - Genesis Block".to_string(),
        replaced_parts: Vec::new(),
    }
}

pub fn genesis_block(hasher: &dyn HashFunction) -> Block {
    let record = genesis_record();
    let hash = digest(hasher, &record, GENESIS_TIMESTAMP, GENESIS_PREVIOUS_HASH, 0);
    Block {
        index: 0,
        created_at: GENESIS_TIMESTAMP,
        record,
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        hash,
    }
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The ledger engine. Owns every mutation of the chain; the store owns durability.
///
/// `append` and first-time genesis creation run under one exclusive lock, so
/// a shared `Arc<Ledger>` never produces two blocks with the same index.
/// Reads (`validate`, loading an existing chain) take no lock.
///
/// Operations on an empty store create the genesis block first. A store that
/// holds a chain is never rewritten except by `append`.
pub struct Ledger {
    store: LedgerStore,
    hasher: Box<dyn HashFunction>,
    clock: Clock,
    write_lock: Mutex<()>,
}

impl Ledger {
    /// Create a ledger over `store` using SHA-256 and the wall clock.
    pub fn new(store: LedgerStore) -> Self {
        Self {
            store,
            hasher: Box::new(Sha256Hasher),
            clock: Box::new(wall_clock_millis),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a ledger over `backend` under the default storage key.
    pub fn with_persistence(backend: Box<dyn Persistence>) -> Self {
        Self::new(LedgerStore::new(backend))
    }

    pub fn with_hasher(mut self, hasher: Box<dyn HashFunction>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the source of `created_at` timestamps.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Return the current chain, creating and persisting the genesis block
    /// if the store holds none.
    pub fn initialize(&self) -> Result<Vec<Block>, LedgerError> {
        if let Some(chain) = self.store.load()? {
            return Ok(chain);
        }
        let _guard = self.write_lock.lock();
        self.load_or_create()
    }

    // Caller must hold `write_lock`.
    fn load_or_create(&self) -> Result<Vec<Block>, LedgerError> {
        if let Some(chain) = self.store.load()? {
            return Ok(chain);
        }

        let genesis = genesis_block(self.hasher.as_ref());
        let chain = vec![genesis];
        self.store.save(&chain)?;
        info!(
            key = %self.store.key(),
            hash = %chain[0].hash,
            hasher = self.hasher.name(),
            "ledger.genesis_created"
        );
        Ok(chain)
    }

    /// Append a record at the tail and persist the extended chain.
    pub fn append(&self, input: RecordInput) -> Result<Block, LedgerError> {
        input.validate()?;

        let _guard = self.write_lock.lock();
        let mut chain = self.load_or_create()?;
        let prev = chain.last().ok_or_else(|| {
            LedgerError::Serialization(format!(
                "Stored chain under {} has no blocks to append to",
                self.store.key()
            ))
        })?;

        let index = prev.index.checked_add(1).ok_or_else(|| {
            LedgerError::Serialization(format!("Tail index {} cannot be extended", prev.index))
        })?;
        let created_at = (self.clock)();
        let previous_hash = prev.hash.clone();
        let record = input.into_record(format!("rec_{}", index));
        let hash = digest(self.hasher.as_ref(), &record, created_at, &previous_hash, index);

        let block = Block {
            index,
            created_at,
            record,
            previous_hash,
            hash,
        };

        chain.push(block.clone());
        self.store.save(&chain)?;

        info!(
            index = block.index,
            record_id = %block.record.id,
            subject_id = %block.record.subject_id,
            hash = %block.hash,
            "ledger.block_appended"
        );
        Ok(block)
    }

    /// Recompute every digest and link of the stored chain.
    ///
    /// The result is computed fresh on each call and never cached.
    pub fn validate(&self) -> Result<ValidationReport, LedgerError> {
        let chain = match self.store.load()? {
            Some(chain) => chain,
            None => self.initialize()?,
        };

        let report = validate_chain(&chain, self.hasher.as_ref());
        if let (Some(index), Some(reason)) = (report.first_invalid_index, report.reason) {
            warn!(index, reason = ?reason, blocks = chain.len(), "ledger.validation_failed");
        }
        Ok(report)
    }
}
