// crates/verinet-ledger/src/lib.rs
//
// verinet-ledger: Access to the external ledger VeriNet publishes to.
//
// Every ledger interaction is two-phase: submit a transaction, then wait for
// its confirmation. `LedgerPublisher` bounds the wait with a timeout and never
// retries on its own; retry policy belongs to the caller.

pub mod error;
pub mod jsonrpc;
pub mod local;
pub mod publisher;
pub mod types;

use async_trait::async_trait;

use verinet_core::ledger::{Confirmation, TxId};

pub use error::LedgerError;
pub use jsonrpc::JsonRpcLedger;
pub use local::LocalLedger;
pub use publisher::{LedgerPublisher, PublisherConfig};
pub use types::{LedgerTx, StateQuery, StateValue};

/// The ledger as seen by VeriNet.
///
/// Implementations do not bound `wait_for_confirmation`; the publisher does.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submit a transaction and return its handle.
    async fn submit_transaction(&self, tx: &LedgerTx) -> Result<TxId, LedgerError>;

    /// Block until the transaction is final.
    async fn wait_for_confirmation(&self, tx: &TxId) -> Result<Confirmation, LedgerError>;

    /// Read contract state.
    async fn read_contract_state(&self, query: &StateQuery) -> Result<StateValue, LedgerError>;
}
