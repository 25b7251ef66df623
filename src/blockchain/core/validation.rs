use crate::crypto::HashFunction;
use serde::{Deserialize, Serialize};

use super::chain::{Block, GENESIS_PREVIOUS_HASH};

/// Why a block failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Violation {
    /// Block 0 does not carry index 0 and the `"0"` previous hash.
    GenesisMalformed,
    /// Index is not its predecessor's index plus one.
    IndexGap,
    /// `previous_hash` differs from the predecessor's `hash`.
    LinkageBroken,
    /// Stored hash differs from the recomputed digest.
    HashMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Position of the first failing block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_invalid_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Violation>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            first_invalid_index: None,
            reason: None,
        }
    }

    pub fn invalid(index: usize, reason: Violation) -> Self {
        Self {
            is_valid: false,
            first_invalid_index: Some(index as u64),
            reason: Some(reason),
        }
    }
}

/// Walk the whole chain and report the first block that breaks an invariant.
///
/// Each block is checked for linkage before its digest. Block 0 is checked
/// against the genesis shape instead of a predecessor. A chain with no blocks
/// lacks its genesis and fails at position 0.
pub fn validate_chain(chain: &[Block], hasher: &dyn HashFunction) -> ValidationReport {
    if chain.is_empty() {
        return ValidationReport::invalid(0, Violation::GenesisMalformed);
    }

    let mut previous: Option<&Block> = None;

    for (position, block) in chain.iter().enumerate() {
        if let Some(violation) = check_linkage(previous, block) {
            return ValidationReport::invalid(position, violation);
        }
        if block.compute_hash(hasher) != block.hash {
            return ValidationReport::invalid(position, Violation::HashMismatch);
        }
        previous = Some(block);
    }

    ValidationReport::valid()
}

fn check_linkage(previous: Option<&Block>, block: &Block) -> Option<Violation> {
    match previous {
        None => {
            if block.index != 0 || block.previous_hash != GENESIS_PREVIOUS_HASH {
                return Some(Violation::GenesisMalformed);
            }
        }
        Some(prev) => {
            if prev.index.checked_add(1) != Some(block.index) {
                return Some(Violation::IndexGap);
            }
            if block.previous_hash != prev.hash {
                return Some(Violation::LinkageBroken);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::core::chain::{genesis_block, Ledger};
    use crate::crypto::Sha256Hasher;
    use crate::persistence::InMemoryPersistence;
    use crate::record::RecordInput;

    fn built_chain(len: usize) -> Vec<Block> {
        let ledger = Ledger::with_persistence(Box::new(InMemoryPersistence::new()));
        for i in 1..len {
            ledger
                .append(
                    RecordInput::new(
                        format!("N{}", i),
                        "2024-05-01T08:30:00.000Z",
                        "Inspector",
                        format!("Routine check #{}", i),
                    )
                    .with_parts(vec![format!("Part {}", i)]),
                )
                .unwrap();
        }
        ledger.initialize().unwrap()
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        let chain = vec![genesis_block(&Sha256Hasher)];
        assert_eq!(validate_chain(&chain, &Sha256Hasher), ValidationReport::valid());
    }

    #[test]
    fn test_empty_chain_is_missing_genesis() {
        let report = validate_chain(&[], &Sha256Hasher);
        assert!(!report.is_valid);
        assert_eq!(report.first_invalid_index, Some(0));
        assert_eq!(report.reason, Some(Violation::GenesisMalformed));
    }

    #[test]
    fn test_built_chain_is_valid() {
        let chain = built_chain(6);
        assert!(validate_chain(&chain, &Sha256Hasher).is_valid);
    }

    #[test]
    fn test_record_tamper_reports_that_block() {
        let chain = built_chain(5);
        for k in 0..chain.len() {
            let mutations: [fn(&mut Block); 6] = [
                |b| b.record.id.push('x'),
                |b| b.record.subject_id.push('x'),
                |b| b.record.occurred_at.push('x'),
                |b| b.record.performed_by.push('x'),
                |b| b.record.description.push('x'),
                |b| b.record.replaced_parts.push("Bolt".to_string()),
            ];
            for mutate in mutations {
                let mut tampered = chain.clone();
                mutate(&mut tampered[k]);
                let report = validate_chain(&tampered, &Sha256Hasher);
                assert!(!report.is_valid);
                assert_eq!(report.first_invalid_index, Some(k as u64));
                assert_eq!(report.reason, Some(Violation::HashMismatch));
            }
        }
    }

    #[test]
    fn test_linkage_break_reports_that_block() {
        let chain = built_chain(5);
        for k in 1..chain.len() {
            let mut tampered = chain.clone();
            tampered[k].previous_hash = "deadbeef".to_string();
            let report = validate_chain(&tampered, &Sha256Hasher);
            assert_eq!(report.first_invalid_index, Some(k as u64));
            assert_eq!(report.reason, Some(Violation::LinkageBroken));
        }

        let mut tampered = chain.clone();
        tampered[0].previous_hash = "1".to_string();
        let report = validate_chain(&tampered, &Sha256Hasher);
        assert_eq!(report.first_invalid_index, Some(0));
        assert_eq!(report.reason, Some(Violation::GenesisMalformed));
    }

    #[test]
    fn test_rehashed_tamper_breaks_successor_linkage() {
        let mut chain = built_chain(4);
        chain[1].record.description = "Nothing happened".to_string();
        chain[1].hash = chain[1].compute_hash(&Sha256Hasher);

        let report = validate_chain(&chain, &Sha256Hasher);
        assert_eq!(report.first_invalid_index, Some(2));
        assert_eq!(report.reason, Some(Violation::LinkageBroken));
    }

    #[test]
    fn test_index_gap_detected() {
        let mut chain = built_chain(4);
        chain.remove(2);
        let report = validate_chain(&chain, &Sha256Hasher);
        assert_eq!(report.first_invalid_index, Some(2));
        assert_eq!(report.reason, Some(Violation::IndexGap));
    }

    #[test]
    fn test_created_at_tamper_detected() {
        let mut chain = built_chain(3);
        chain[2].created_at += 1;
        let report = validate_chain(&chain, &Sha256Hasher);
        assert_eq!(report.first_invalid_index, Some(2));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let json = serde_json::to_value(ValidationReport::invalid(3, Violation::LinkageBroken)).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["firstInvalidIndex"], 3);
        assert_eq!(json["reason"], "linkageBroken");

        let json = serde_json::to_value(ValidationReport::valid()).unwrap();
        assert_eq!(json, serde_json::json!({ "isValid": true }));
    }
}
