//! Error types for AeroChain

use thiserror::Error;

/// Failures the ledger engine can raise.
///
/// An integrity violation is not in this list: `validate` reports a broken
/// chain as data in its [`ValidationReport`](crate::blockchain::ValidationReport).
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The backing medium could not complete a `load` or `save`.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// Caller input rejected before any store interaction.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Stored bytes could not be decoded into a chain, or a chain could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::StoreUnavailable(format!("database error: {}", err))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_store_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only medium");
        let err: LedgerError = io.into();
        assert!(matches!(err, LedgerError::StoreUnavailable(_)));
        assert!(err.to_string().contains("read-only medium"));
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let json_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: LedgerError = json_err.into();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }
}
