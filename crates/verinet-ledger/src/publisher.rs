// crates/verinet-ledger/src/publisher.rs
//
// LedgerPublisher: the only path from VeriNet to the ledger.
//
// Every write is submit-then-wait. The wait is bounded by the configured
// confirmation timeout; a timeout surfaces as `ConfirmationTimeout` carrying
// the transaction id so the caller can wait again through `confirm`.

use std::sync::Arc;
use std::time::Duration;

use verinet_core::crypto::hash_bytes;
use verinet_core::digest::{Address, SchemaId};
use verinet_core::ledger::{Confirmation, TxId};

use crate::error::LedgerError;
use crate::types::{LedgerTx, StateQuery, StateValue};
use crate::Ledger;

/// Address of the reward pool account when none is configured.
pub fn default_reward_pool() -> Address {
    let digest = hash_bytes(b"verinet:reward-pool");
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    Address(addr)
}

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub confirmation_timeout: Duration,
    /// Account that funds reward transfers.
    pub reward_pool: Address,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            reward_pool: default_reward_pool(),
        }
    }
}

pub struct LedgerPublisher {
    ledger: Arc<dyn Ledger>,
    config: PublisherConfig,
}

impl LedgerPublisher {
    pub fn new(ledger: Arc<dyn Ledger>, config: PublisherConfig) -> Self {
        Self { ledger, config }
    }

    pub fn reward_pool(&self) -> Address {
        self.config.reward_pool
    }

    /// Record an attestation payload under `schema` and wait for it to land.
    pub async fn publish(
        &self,
        payload: &[u8],
        schema: SchemaId,
    ) -> Result<Confirmation, LedgerError> {
        let tx_id = self.submit_attestation(payload, schema).await?;
        self.confirm(&tx_id).await
    }

    /// First half of `publish`, for callers that persist the transaction id
    /// before waiting on it.
    pub async fn submit_attestation(
        &self,
        payload: &[u8],
        schema: SchemaId,
    ) -> Result<TxId, LedgerError> {
        let tx = LedgerTx::Attest {
            schema,
            data: payload.to_vec(),
        };
        let tx_id = self.ledger.submit_transaction(&tx).await?;
        tracing::info!("Submitted attestation {} under schema {}", tx_id, schema);
        Ok(tx_id)
    }

    /// Pay `amount` wei from the reward pool to `to` and wait for it to land.
    pub async fn transfer(&self, to: Address, amount: u128) -> Result<Confirmation, LedgerError> {
        let tx_id = self.submit_transfer(to, amount).await?;
        self.confirm(&tx_id).await
    }

    /// First half of `transfer`. Callers that must remember the transaction
    /// before waiting on it use this together with `confirm`.
    pub async fn submit_transfer(&self, to: Address, amount: u128) -> Result<TxId, LedgerError> {
        let tx = LedgerTx::Transfer {
            from: self.config.reward_pool,
            to,
            amount,
        };
        let tx_id = self.ledger.submit_transaction(&tx).await?;
        tracing::info!("Submitted transfer {} of {} wei to {}", tx_id, amount, to);
        Ok(tx_id)
    }

    /// Wait for an already submitted transaction, bounded by the configured timeout.
    pub async fn confirm(&self, tx_id: &TxId) -> Result<Confirmation, LedgerError> {
        let waited = self.config.confirmation_timeout;
        match tokio::time::timeout(waited, self.ledger.wait_for_confirmation(tx_id)).await {
            Ok(Ok(confirmation)) => {
                tracing::debug!("Transaction {} confirmed in block {}", tx_id, confirmation.block);
                Ok(confirmation)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!("Transaction {} not confirmed within {:?}", tx_id, waited);
                Err(LedgerError::ConfirmationTimeout {
                    tx: tx_id.clone(),
                    waited,
                })
            }
        }
    }

    /// Mint `amount` wei to `to` (normally the reward pool).
    pub async fn mint(&self, to: Address, amount: u128) -> Result<Confirmation, LedgerError> {
        let tx_id = self
            .ledger
            .submit_transaction(&LedgerTx::Mint { to, amount })
            .await?;
        tracing::info!("Submitted mint {} of {} wei to {}", tx_id, amount, to);
        self.confirm(&tx_id).await
    }

    pub async fn balance_of(&self, who: Address) -> Result<u128, LedgerError> {
        match self
            .ledger
            .read_contract_state(&StateQuery::BalanceOf(who))
            .await?
        {
            StateValue::Amount(amount) => Ok(amount),
            other => Err(LedgerError::Transport(format!(
                "Unexpected answer to balance query: {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts everything, never confirms.
    struct StallingLedger {
        submitted: AtomicUsize,
    }

    #[async_trait]
    impl Ledger for StallingLedger {
        async fn submit_transaction(&self, _tx: &LedgerTx) -> Result<TxId, LedgerError> {
            let n = self.submitted.fetch_add(1, Ordering::SeqCst);
            Ok(TxId(format!("0xstall{}", n)))
        }

        async fn wait_for_confirmation(&self, _tx: &TxId) -> Result<Confirmation, LedgerError> {
            std::future::pending::<()>().await;
            unreachable!()
        }

        async fn read_contract_state(&self, _q: &StateQuery) -> Result<StateValue, LedgerError> {
            Ok(StateValue::Block(0))
        }
    }

    /// Rejects every submission.
    struct RejectingLedger;

    #[async_trait]
    impl Ledger for RejectingLedger {
        async fn submit_transaction(&self, _tx: &LedgerTx) -> Result<TxId, LedgerError> {
            Err(LedgerError::Submission("paused".to_string()))
        }

        async fn wait_for_confirmation(&self, tx: &TxId) -> Result<Confirmation, LedgerError> {
            Ok(Confirmation {
                tx_id: tx.clone(),
                block: 1,
                confirmed_at: Utc::now(),
            })
        }

        async fn read_contract_state(&self, _q: &StateQuery) -> Result<StateValue, LedgerError> {
            Ok(StateValue::Amount(7))
        }
    }

    fn config(timeout_ms: u64) -> PublisherConfig {
        PublisherConfig {
            confirmation_timeout: Duration::from_millis(timeout_ms),
            ..PublisherConfig::default()
        }
    }

    #[tokio::test]
    async fn test_confirmation_timeout_carries_tx_id() {
        let ledger = Arc::new(StallingLedger {
            submitted: AtomicUsize::new(0),
        });
        let publisher = LedgerPublisher::new(ledger.clone(), config(20));

        let err = publisher.transfer(Address([1; 20]), 10).await.unwrap_err();
        match err {
            LedgerError::ConfirmationTimeout { tx, .. } => assert_eq!(tx.0, "0xstall0"),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(publisher.confirm(&TxId("0xstall0".into())).await.unwrap_err().is_timeout());
        assert_eq!(ledger.submitted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submission_error_is_not_retried() {
        let publisher = LedgerPublisher::new(Arc::new(RejectingLedger), config(20));
        let err = publisher.publish(&[0u8; 64], SchemaId::ZERO).await.unwrap_err();
        assert!(matches!(err, LedgerError::Submission(_)));
    }

    #[tokio::test]
    async fn test_balance_of_reads_amount() {
        let publisher = LedgerPublisher::new(Arc::new(RejectingLedger), config(20));
        assert_eq!(publisher.balance_of(Address([2; 20])).await.unwrap(), 7);
    }

    #[test]
    fn test_default_pool_is_stable() {
        assert_eq!(default_reward_pool(), default_reward_pool());
        assert_ne!(default_reward_pool(), Address::ZERO);
    }
}
