/// Validation of caller-submitted records
use crate::error::LedgerError;
use crate::record::types::RecordInput;

impl RecordInput {
    /// Only the description is checked; every other field is passed through
    /// as given.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.description.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
