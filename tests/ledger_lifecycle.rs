//! Integration tests for the ledger engine over real storage backends

use aerochain::blockchain::{genesis_block, Ledger, Violation};
use aerochain::crypto::{HashFunction, Sha256Hasher};
use aerochain::error::LedgerError;
use aerochain::persistence::{
    Database, FileStore, InMemoryPersistence, LedgerStore, Persistence, DEFAULT_LEDGER_KEY,
};
use aerochain::record::RecordInput;
use tempfile::TempDir;

fn filter_change() -> RecordInput {
    RecordInput::new("N123AB", "2024-03-01T10:00:00.000Z", "J. Rivera", "Replaced filter")
        .with_parts(["Oil filter"])
}

/// Rewrite the stored chain through `edit`, bypassing the engine.
fn tamper(mem: &InMemoryPersistence, edit: impl FnOnce(&mut serde_json::Value)) {
    let raw = mem.get(DEFAULT_LEDGER_KEY).unwrap().unwrap();
    let mut json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    edit(&mut json);
    mem.put(DEFAULT_LEDGER_KEY, &serde_json::to_vec(&json).unwrap())
        .unwrap();
}

#[test]
fn test_end_to_end_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let mem = InMemoryPersistence::new();
    let ledger = Ledger::with_persistence(Box::new(mem.clone()));

    let chain = ledger.initialize()?;
    assert_eq!(chain.len(), 1);

    let block = ledger.append(RecordInput {
        description: "Replaced filter".to_string(),
        ..Default::default()
    })?;
    let chain = ledger.initialize()?;
    assert_eq!(chain.len(), 2);
    assert_eq!(block.index, 1);
    assert_eq!(block.previous_hash, chain[0].hash);

    assert!(ledger.validate()?.is_valid);

    // Flip one character of the genesis description in the store.
    tamper(&mem, |json| {
        json[0]["record"]["description"] = "Ledger Initialized - Genesis Blocc".into();
    });

    let report = ledger.validate()?;
    assert!(!report.is_valid);
    assert_eq!(report.first_invalid_index, Some(0));
    assert_eq!(report.reason, Some(Violation::HashMismatch));

    Ok(())
}

#[test]
fn test_validation_is_recomputed_per_call() -> Result<(), Box<dyn std::error::Error>> {
    let mem = InMemoryPersistence::new();
    let ledger = Ledger::with_persistence(Box::new(mem.clone()));
    ledger.append(filter_change())?;
    ledger.append(filter_change())?;
    assert!(ledger.validate()?.is_valid);

    tamper(&mem, |json| {
        json[2]["previousHash"] = "not-the-real-hash".into();
    });
    let report = ledger.validate()?;
    assert_eq!(report.first_invalid_index, Some(2));
    assert_eq!(report.reason, Some(Violation::LinkageBroken));

    Ok(())
}

#[test]
fn test_rejected_append_leaves_store_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let mem = InMemoryPersistence::new();
    let ledger = Ledger::with_persistence(Box::new(mem.clone()));
    ledger.append(filter_change())?;
    let before = mem.get(DEFAULT_LEDGER_KEY)?;

    for description in ["", "    ", "\n\t"] {
        let err = ledger
            .append(RecordInput {
                description: description.to_string(),
                ..filter_change()
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    assert_eq!(mem.get(DEFAULT_LEDGER_KEY)?, before);
    Ok(())
}

#[test]
fn test_validate_auto_initializes_empty_store() -> Result<(), Box<dyn std::error::Error>> {
    let mem = InMemoryPersistence::new();
    let ledger = Ledger::with_persistence(Box::new(mem.clone()));

    assert!(ledger.validate()?.is_valid);
    assert!(mem.get(DEFAULT_LEDGER_KEY)?.is_some());
    Ok(())
}

#[test]
fn test_store_unavailable_propagates() {
    let mem = InMemoryPersistence::new();
    mem.set_unavailable(true);
    let ledger = Ledger::with_persistence(Box::new(mem));

    assert!(matches!(ledger.initialize(), Err(LedgerError::StoreUnavailable(_))));
    assert!(matches!(ledger.validate(), Err(LedgerError::StoreUnavailable(_))));
    assert!(matches!(
        ledger.append(filter_change()),
        Err(LedgerError::StoreUnavailable(_))
    ));
}

#[test]
fn test_sqlite_ledger_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ledger.db");
    let path = path.to_str().ok_or("non-utf8 temp path")?;

    let appended = {
        let ledger = Ledger::with_persistence(Box::new(Database::open(path)?));
        ledger.append(filter_change())?;
        ledger.append(filter_change().with_parts(Vec::<String>::new()))?
    };

    let reopened = Ledger::with_persistence(Box::new(Database::open(path)?));
    let chain = reopened.initialize()?;
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[2], appended);
    assert!(reopened.validate()?.is_valid);
    Ok(())
}

#[test]
fn test_file_store_ledger_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    let first = {
        let ledger = Ledger::with_persistence(Box::new(FileStore::open(dir.path())?));
        ledger.append(filter_change())?
    };

    let store = LedgerStore::with_key(Box::new(FileStore::open(dir.path())?), DEFAULT_LEDGER_KEY);
    let reopened = Ledger::new(store);
    let next = reopened.append(filter_change())?;
    assert_eq!(next.index, 2);
    assert_eq!(next.previous_hash, first.hash);
    assert!(reopened.validate()?.is_valid);
    Ok(())
}

#[test]
fn test_separate_keys_hold_separate_chains() -> Result<(), Box<dyn std::error::Error>> {
    let mem = InMemoryPersistence::new();
    let fleet_a = Ledger::new(LedgerStore::with_key(Box::new(mem.clone()), "fleet_a"));
    let fleet_b = Ledger::new(LedgerStore::with_key(Box::new(mem.clone()), "fleet_b"));

    fleet_a.append(filter_change())?;
    assert_eq!(fleet_a.initialize()?.len(), 2);
    assert_eq!(fleet_b.initialize()?.len(), 1);
    Ok(())
}

/// FNV-1a, to show the engine works with any deterministic hash.
struct Fnv1a;

impl HashFunction for Fnv1a {
    fn name(&self) -> &'static str {
        "fnv1a-64"
    }

    fn hash(&self, bytes: &[u8]) -> String {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in bytes {
            h ^= u64::from(*b);
            h = h.wrapping_mul(0x100000001b3);
        }
        format!("fnv-{:016x}", h)
    }
}

#[test]
fn test_custom_hash_function() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Ledger::with_persistence(Box::new(InMemoryPersistence::new()))
        .with_hasher(Box::new(Fnv1a));

    let chain = ledger.initialize()?;
    assert!(chain[0].hash.starts_with("fnv-"));
    assert_ne!(chain[0], genesis_block(&Sha256Hasher));

    let block = ledger.append(filter_change())?;
    assert!(block.hash.starts_with("fnv-"));
    assert!(ledger.validate()?.is_valid);
    Ok(())
}
