// crates/verinet-core/src/error.rs

use thiserror::Error;

/// Protocol-wide error taxonomy for VeriNet.
///
/// Component crates define their own typed errors and convert into this
/// enum at the command boundary.
#[derive(Debug, Error)]
pub enum VeriNetError {
    /// Missing or malformed required configuration. Fatal, nothing executed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller lacks the required admin/role identity. State unchanged.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Malformed or out-of-range claim data.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate issuer claim or duplicate reward. Existing state unchanged.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// The ledger rejected the transaction. Not retried automatically.
    #[error("Ledger submission error: {0}")]
    LedgerSubmission(String),

    /// Confirmation was not observed within the bound. The wait may be retried.
    #[error("Ledger timeout: {0}")]
    LedgerTimeout(String),

    /// Storage layer error (RocksDB, IPFS).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error (key parsing, signing).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl VeriNetError {
    /// Whether the failed operation may be retried as-is.
    pub fn is_retriable(&self) -> bool {
        matches!(self, VeriNetError::LedgerTimeout(_))
    }
}

impl From<serde_json::Error> for VeriNetError {
    fn from(e: serde_json::Error) -> Self {
        VeriNetError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for VeriNetError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        VeriNetError::Crypto(e.to_string())
    }
}

impl From<hex::FromHexError> for VeriNetError {
    fn from(e: hex::FromHexError) -> Self {
        VeriNetError::Serialization(format!("invalid hex: {}", e))
    }
}
