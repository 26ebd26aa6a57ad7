// crates/verinet-ledger/src/error.rs

use std::time::Duration;

use thiserror::Error;

use verinet_core::error::VeriNetError;
use verinet_core::ledger::TxId;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger rejected the transaction (or it reverted). Re-check
    /// preconditions before resubmitting.
    #[error("transaction rejected: {0}")]
    Submission(String),

    #[error("insufficient funds: need {needed} wei, pool holds {available} wei")]
    InsufficientFunds { needed: u128, available: u128 },

    /// Confirmation not observed in time. The transaction may still land;
    /// wait on `tx` again rather than resubmitting.
    #[error("confirmation of {tx} not observed within {waited:?}")]
    ConfirmationTimeout { tx: TxId, waited: Duration },

    /// The ledger endpoint could not be reached or answered nonsense.
    #[error("ledger transport error: {0}")]
    Transport(String),
}

impl LedgerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LedgerError::ConfirmationTimeout { .. })
    }

    /// The ledger definitively refused or reverted the transaction.
    ///
    /// Timeouts and transport failures leave the outcome unknown: the
    /// transaction may still land.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::Submission(_) | LedgerError::InsufficientFunds { .. }
        )
    }
}

impl From<LedgerError> for VeriNetError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ConfirmationTimeout { .. } => VeriNetError::LedgerTimeout(e.to_string()),
            other => VeriNetError::LedgerSubmission(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_refusals_count_as_rejection() {
        assert!(LedgerError::Submission("reverted".into()).is_rejection());
        assert!(LedgerError::InsufficientFunds {
            needed: 2,
            available: 1
        }
        .is_rejection());
        assert!(!LedgerError::Transport("connection reset".into()).is_rejection());
        let timeout = LedgerError::ConfirmationTimeout {
            tx: TxId("0x1".into()),
            waited: Duration::from_secs(1),
        };
        assert!(!timeout.is_rejection());
        assert!(timeout.is_timeout());
    }
}
