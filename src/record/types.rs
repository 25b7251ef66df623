//! Maintenance record types for AeroChain
use serde::{Deserialize, Serialize};

/// The payload of a block: one maintenance action on one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Assigned by the ledger, never by the caller.
    pub id: String,
    /// What was maintained, e.g. an aircraft tail number.
    pub subject_id: String,
    /// ISO-8601 time of the real-world action.
    pub occurred_at: String,
    pub performed_by: String,
    pub description: String,
    pub replaced_parts: Vec<String>,
}

/// A record as submitted by a caller, before the ledger assigns its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    #[serde(default)]
    pub subject_id: String,
    #[serde(default)]
    pub occurred_at: String,
    #[serde(default)]
    pub performed_by: String,
    /// Left empty when omitted so the description check reports it.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub replaced_parts: Vec<String>,
}

impl RecordInput {
    pub fn new(
        subject_id: impl Into<String>,
        occurred_at: impl Into<String>,
        performed_by: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            occurred_at: occurred_at.into(),
            performed_by: performed_by.into(),
            description: description.into(),
            replaced_parts: Vec::new(),
        }
    }

    pub fn with_parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replaced_parts = parts.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the ledger-assigned id.
    pub fn into_record(self, id: String) -> Record {
        Record {
            id,
            subject_id: self.subject_id,
            occurred_at: self.occurred_at,
            performed_by: self.performed_by,
            description: self.description,
            replaced_parts: self.replaced_parts,
        }
    }
}

impl Record {
    /// Append this record's fields to `buf` in a fixed order, each string
    /// length-prefixed, so equal records always encode to equal bytes.
    pub fn write_canonical(&self, buf: &mut Vec<u8>) {
        write_str(buf, &self.id);
        write_str(buf, &self.subject_id);
        write_str(buf, &self.occurred_at);
        write_str(buf, &self.performed_by);
        write_str(buf, &self.description);
        buf.extend_from_slice(&(self.replaced_parts.len() as u64).to_le_bytes());
        for part in &self.replaced_parts {
            write_str(buf, part);
        }
    }
}

pub(crate) fn write_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}
