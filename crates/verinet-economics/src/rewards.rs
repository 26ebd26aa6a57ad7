// crates/verinet-economics/src/rewards.rs
//
// RewardEngine: tiered reward issuance, at most once per (validator, result).
//
// Issuance is guarded by the RewardStore's compare-and-swap reservation:
//   1. reserve the key (a second caller gets AlreadyRewarded);
//   2. submit the transfer and remember its transaction id;
//   3. wait for confirmation, then record the reward.
// Only a definitive rejection (refused or reverted) releases the key. When
// the outcome is unknown (timeout, transport failure) the key keeps the
// transaction id, and the next call for the same key waits on that
// transaction instead of paying again. A transport failure during submission
// leaves the key reserved: nothing can tell whether the transfer was sent,
// so the reward is held for reconciliation rather than risked twice.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use verinet_consensus::{Authority, Role};
use verinet_core::digest::{Address, ResultRef};
use verinet_core::error::VeriNetError;
use verinet_core::ledger::{Confirmation, TxId};
use verinet_core::reward::{Reservation, RewardKey, RewardRecord, ScoreTier};
use verinet_core::traits::RewardStore;
use verinet_ledger::{LedgerError, LedgerPublisher};

use crate::tiers::RewardTierTable;
use crate::token::{Vnt, Wei};

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("tier {0} is not in the reward table")]
    InvalidTier(ScoreTier),

    #[error("{validator} was already rewarded for result {result}")]
    AlreadyRewarded {
        validator: Address,
        result: ResultRef,
    },

    #[error("{requested_by} does not hold the admin role")]
    Unauthorized { requested_by: Address },

    #[error("reward amount must be positive")]
    ZeroAmount,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] VeriNetError),
}

impl From<RewardError> for VeriNetError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::InvalidTier(_) | RewardError::ZeroAmount => {
                VeriNetError::Validation(e.to_string())
            }
            RewardError::AlreadyRewarded { .. } => VeriNetError::Duplicate(e.to_string()),
            RewardError::Unauthorized { .. } => VeriNetError::Authorization(e.to_string()),
            RewardError::Ledger(inner) => inner.into(),
            RewardError::Store(inner) => inner,
        }
    }
}

pub struct RewardEngine {
    table: RewardTierTable,
    store: Arc<dyn RewardStore>,
    publisher: Arc<LedgerPublisher>,
    authority: Arc<dyn Authority>,
}

impl RewardEngine {
    pub fn new(
        table: RewardTierTable,
        store: Arc<dyn RewardStore>,
        publisher: Arc<LedgerPublisher>,
        authority: Arc<dyn Authority>,
    ) -> Self {
        Self {
            table,
            store,
            publisher,
            authority,
        }
    }

    pub fn table(&self) -> &RewardTierTable {
        &self.table
    }

    fn require_admin(&self, requested_by: Address) -> Result<(), RewardError> {
        if self.authority.has_role(&requested_by, Role::Admin) {
            Ok(())
        } else {
            Err(RewardError::Unauthorized { requested_by })
        }
    }

    /// Pay `validator` the amount of `tier` for contributing to `result`.
    /// Admin only.
    pub async fn reward(
        &self,
        validator: Address,
        tier: ScoreTier,
        result: ResultRef,
        requested_by: Address,
    ) -> Result<RewardRecord, RewardError> {
        if let Err(e) = self.require_admin(requested_by) {
            tracing::warn!("Rejected reward for {} from non-admin {}", validator, requested_by);
            return Err(e);
        }
        let amount = self
            .table
            .amount_for(tier)
            .ok_or(RewardError::InvalidTier(tier))?;
        let key = RewardKey::new(validator, result);

        let reservation = match self.store.reserve(&key).await {
            Ok(reservation) => reservation,
            Err(VeriNetError::Duplicate(_)) => {
                return Err(RewardError::AlreadyRewarded { validator, result });
            }
            Err(e) => return Err(RewardError::Store(e)),
        };

        let tx_id = match reservation {
            Reservation::Fresh => self.submit(&key, amount).await?,
            Reservation::Resume(tx_id) => {
                tracing::info!(
                    "Resuming reward {} on earlier transfer {}",
                    key.storage_key(),
                    tx_id
                );
                tx_id
            }
        };

        let confirmation = self.await_transfer(&key, &tx_id).await?;

        let record = RewardRecord {
            validator,
            tier,
            amount,
            result,
            issued_at: Utc::now(),
            confirmation,
        };
        match self.store.complete(&record).await {
            Ok(()) => {}
            Err(VeriNetError::Duplicate(_)) => {
                // A concurrent resume of the same transfer recorded it first.
                return Err(RewardError::AlreadyRewarded { validator, result });
            }
            Err(e) => return Err(RewardError::Store(e)),
        }

        tracing::info!(
            "Rewarded {} with {} (tier {}) for result {}",
            validator,
            Vnt::from_wei(amount),
            tier,
            result
        );
        Ok(record)
    }

    async fn submit(&self, key: &RewardKey, amount: Wei) -> Result<TxId, RewardError> {
        let tx_id = match self.publisher.submit_transfer(key.validator, amount).await {
            Ok(tx_id) => tx_id,
            Err(e) if e.is_rejection() => {
                tracing::warn!("Reward transfer for {} rejected: {}", key.storage_key(), e);
                self.store.release(key).await?;
                return Err(e.into());
            }
            Err(e) => {
                tracing::error!(
                    "Reward transfer for {} may or may not have been sent ({}); key held for reconciliation",
                    key.storage_key(),
                    e
                );
                return Err(e.into());
            }
        };
        // If this write fails the key stays Reserved: no second payment, but
        // the reward needs manual reconciliation against the ledger.
        if let Err(e) = self.store.mark_submitted(key, &tx_id).await {
            tracing::error!(
                "Transfer {} for {} submitted but not recorded: {}",
                tx_id,
                key.storage_key(),
                e
            );
            return Err(e.into());
        }
        Ok(tx_id)
    }

    async fn await_transfer(&self, key: &RewardKey, tx_id: &TxId) -> Result<Confirmation, RewardError> {
        match self.publisher.confirm(tx_id).await {
            Ok(confirmation) => Ok(confirmation),
            Err(e) if e.is_rejection() => {
                tracing::warn!("Reward transfer {} failed: {}", tx_id, e);
                self.store.release(key).await?;
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(
                    "Reward {} pending on {} ({}); retry to resume the wait",
                    key.storage_key(),
                    tx_id,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Mint `amount` wei into the reward pool. Admin only.
    pub async fn fund(&self, amount: Wei, requested_by: Address) -> Result<Confirmation, RewardError> {
        if let Err(e) = self.require_admin(requested_by) {
            tracing::warn!("Rejected pool funding from non-admin {}", requested_by);
            return Err(e);
        }
        if amount == 0 {
            return Err(RewardError::ZeroAmount);
        }
        let pool = self.publisher.reward_pool();
        let confirmation = self.publisher.mint(pool, amount).await?;
        tracing::info!("Funded reward pool {} with {}", pool, Vnt::from_wei(amount));
        Ok(confirmation)
    }

    pub async fn balance_of(&self, who: Address) -> Result<Wei, RewardError> {
        Ok(self.publisher.balance_of(who).await?)
    }

    pub async fn pool_balance(&self) -> Result<Wei, RewardError> {
        self.balance_of(self.publisher.reward_pool()).await
    }

    pub async fn records(&self) -> Result<Vec<RewardRecord>, RewardError> {
        Ok(self.store.list_records().await?)
    }
}
