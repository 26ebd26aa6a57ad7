// crates/verinet-core/src/reward.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::{Address, ResultRef};
use crate::ledger::{Confirmation, TxId};

/// Discrete reward bucket. The tier table maps it to an amount.
pub type ScoreTier = u8;

/// Idempotence key for reward issuance: one reward per validator per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardKey {
    pub validator: Address,
    pub result: ResultRef,
}

impl RewardKey {
    pub fn new(validator: Address, result: ResultRef) -> Self {
        Self { validator, result }
    }

    /// Stable string form used as a storage key suffix.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.validator, self.result)
    }
}

/// A reward issuance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub validator: Address,
    pub tier: ScoreTier,
    /// Amount in wei.
    pub amount: u128,
    pub result: ResultRef,
    pub issued_at: DateTime<Utc>,
    pub confirmation: Confirmation,
}

impl RewardRecord {
    pub fn key(&self) -> RewardKey {
        RewardKey::new(self.validator, self.result)
    }
}

/// State of an idempotence key in the reward store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardStatus {
    /// Claimed by an issuer; no transaction submitted yet.
    Reserved,
    /// Transfer submitted but not yet confirmed.
    Submitted(TxId),
    /// Transfer confirmed and recorded.
    Completed(RewardRecord),
}

/// Outcome of a successful reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// The key was free; the caller now owns it and must submit.
    Fresh,
    /// A transfer was submitted earlier and never confirmed; the caller
    /// should wait on it rather than resubmit.
    Resume(TxId),
}
