// crates/verinet-core/src/ledger.rs
//
// Ledger receipt types shared by the publisher, the stores, and the records
// that reference confirmed transactions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt for a transaction the ledger has finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx_id: TxId,
    /// Block (or sequence) number the transaction was included in.
    pub block: u64,
    pub confirmed_at: DateTime<Utc>,
}
