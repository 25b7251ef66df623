//! Read-only views derived from a loaded chain.

use serde::Serialize;
use std::collections::HashSet;

use super::chain::Block;

/// Summary figures over the maintenance records in a chain, genesis excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_records: usize,
    pub latest_index: u64,
    /// `created_at` of the newest record, if any.
    pub last_recorded_at: Option<i64>,
    /// Number of distinct subjects with at least one record.
    pub subjects: usize,
}

impl LedgerStats {
    pub fn from_chain(chain: &[Block]) -> Self {
        let records: Vec<&Block> = chain.iter().filter(|b| !b.is_genesis()).collect();
        let subjects: HashSet<String> = records
            .iter()
            .map(|b| normalize_subject(&b.record.subject_id))
            .collect();

        Self {
            total_records: records.len(),
            latest_index: chain.last().map_or(0, |b| b.index),
            last_recorded_at: records.last().map(|b| b.created_at),
            subjects: subjects.len(),
        }
    }
}

/// Blocks recording work on `subject_id`, newest first. Matching ignores
/// case and surrounding whitespace.
pub fn subject_history<'a>(chain: &'a [Block], subject_id: &str) -> Vec<&'a Block> {
    let wanted = normalize_subject(subject_id);
    chain
        .iter()
        .rev()
        .filter(|b| !b.is_genesis() && normalize_subject(&b.record.subject_id) == wanted)
        .collect()
}

fn normalize_subject(subject_id: &str) -> String {
    subject_id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::core::chain::Ledger;
    use crate::persistence::InMemoryPersistence;
    use crate::record::RecordInput;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn fleet_chain() -> Vec<Block> {
        let now = AtomicI64::new(1_000);
        let ledger = Ledger::with_persistence(Box::new(InMemoryPersistence::new()))
            .with_clock(move || now.fetch_add(1, Ordering::SeqCst));
        for (subject, action) in [
            ("N123AB", "Replaced filter"),
            ("N456CD", "Tire rotation"),
            ("n123ab ", "Oil change"),
        ] {
            ledger
                .append(RecordInput::new(subject, "2024-01-01T00:00:00Z", "Crew", action))
                .unwrap();
        }
        ledger.initialize().unwrap()
    }

    #[test]
    fn test_stats_exclude_genesis() {
        let chain = fleet_chain();
        let stats = LedgerStats::from_chain(&chain);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.latest_index, 3);
        assert_eq!(stats.last_recorded_at, Some(chain[3].created_at));
        assert_eq!(stats.subjects, 2);
    }

    #[test]
    fn test_stats_on_genesis_only_chain() {
        let chain = vec![crate::blockchain::genesis_block(&crate::crypto::Sha256Hasher)];
        let stats = LedgerStats::from_chain(&chain);
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.latest_index, 0);
        assert_eq!(stats.last_recorded_at, None);
        assert_eq!(stats.subjects, 0);
    }

    #[test]
    fn test_subject_history_newest_first() {
        let chain = fleet_chain();
        let history = subject_history(&chain, "N123AB");
        let actions: Vec<&str> = history.iter().map(|b| b.record.description.as_str()).collect();
        assert_eq!(actions, vec!["Oil change", "Replaced filter"]);
        assert!(subject_history(&chain, "N/A").is_empty());
    }
}
