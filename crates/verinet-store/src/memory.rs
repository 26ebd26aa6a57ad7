// crates/verinet-store/src/memory.rs
//
// In-memory implementation of every VeriNet store trait.
//
// Used by tests and by embedders that do not need durability. Each map sits
// behind its own tokio Mutex so compare-and-swap operations are atomic.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use verinet_core::aggregation::AggregationResult;
use verinet_core::digest::{ClaimRef, ResultRef, SubjectId};
use verinet_core::error::VeriNetError;
use verinet_core::ledger::TxId;
use verinet_core::participant::Participant;
use verinet_core::reward::{Reservation, RewardKey, RewardRecord, RewardStatus};
use verinet_core::traits::{RegistryStore, ResultStore, RevocationStore, RewardStore};

use crate::status;

#[derive(Debug, Default)]
pub struct MemoryStore {
    participants: Mutex<Vec<Participant>>,
    /// Results in insertion order.
    results: Mutex<Vec<AggregationResult>>,
    pending: Mutex<HashMap<ResultRef, TxId>>,
    rewards: Mutex<HashMap<RewardKey, RewardStatus>>,
    revoked: Mutex<HashSet<ClaimRef>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn load_participants(&self) -> Result<Vec<Participant>, VeriNetError> {
        Ok(self.participants.lock().await.clone())
    }

    async fn save_participants(&self, participants: &[Participant]) -> Result<(), VeriNetError> {
        *self.participants.lock().await = participants.to_vec();
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_result(&self, result: &AggregationResult) -> Result<bool, VeriNetError> {
        let mut results = self.results.lock().await;
        if results.iter().any(|r| r.id == result.id) {
            return Ok(false);
        }
        results.push(result.clone());
        self.pending.lock().await.remove(&result.id);
        Ok(true)
    }

    async fn record_pending(&self, id: &ResultRef, tx: &TxId) -> Result<(), VeriNetError> {
        self.pending.lock().await.insert(*id, tx.clone());
        Ok(())
    }

    async fn pending_attestation(&self, id: &ResultRef) -> Result<Option<TxId>, VeriNetError> {
        Ok(self.pending.lock().await.get(id).cloned())
    }

    async fn clear_pending(&self, id: &ResultRef) -> Result<(), VeriNetError> {
        self.pending.lock().await.remove(id);
        Ok(())
    }

    async fn get_result(&self, id: &ResultRef) -> Result<Option<AggregationResult>, VeriNetError> {
        let results = self.results.lock().await;
        Ok(results.iter().find(|r| r.id == *id).cloned())
    }

    async fn results_for_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<AggregationResult>, VeriNetError> {
        let results = self.results.lock().await;
        Ok(results
            .iter()
            .filter(|r| r.subject == *subject)
            .cloned()
            .collect())
    }

    async fn list_results(&self) -> Result<Vec<AggregationResult>, VeriNetError> {
        Ok(self.results.lock().await.clone())
    }
}

#[async_trait]
impl RewardStore for MemoryStore {
    async fn reserve(&self, key: &RewardKey) -> Result<Reservation, VeriNetError> {
        let mut rewards = self.rewards.lock().await;
        let (reservation, write) = status::on_reserve(key, rewards.get(key))?;
        if let Some(new_status) = write {
            rewards.insert(*key, new_status);
        }
        Ok(reservation)
    }

    async fn mark_submitted(&self, key: &RewardKey, tx: &TxId) -> Result<(), VeriNetError> {
        let mut rewards = self.rewards.lock().await;
        let next = status::on_submit(key, rewards.get(key), tx)?;
        rewards.insert(*key, next);
        Ok(())
    }

    async fn complete(&self, record: &RewardRecord) -> Result<(), VeriNetError> {
        let key = record.key();
        let mut rewards = self.rewards.lock().await;
        status::on_complete(&key, rewards.get(&key))?;
        rewards.insert(key, RewardStatus::Completed(record.clone()));
        Ok(())
    }

    async fn release(&self, key: &RewardKey) -> Result<(), VeriNetError> {
        let mut rewards = self.rewards.lock().await;
        if status::releasable(rewards.get(key)) {
            rewards.remove(key);
        }
        Ok(())
    }

    async fn get_record(&self, key: &RewardKey) -> Result<Option<RewardRecord>, VeriNetError> {
        let rewards = self.rewards.lock().await;
        Ok(match rewards.get(key) {
            Some(RewardStatus::Completed(record)) => Some(record.clone()),
            _ => None,
        })
    }

    async fn list_records(&self) -> Result<Vec<RewardRecord>, VeriNetError> {
        let rewards = self.rewards.lock().await;
        let mut records: Vec<RewardRecord> = rewards
            .values()
            .filter_map(|s| match s {
                RewardStatus::Completed(record) => Some(record.clone()),
                _ => None,
            })
            .collect();
        records.sort_by_key(|r| r.issued_at);
        Ok(records)
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn revoke(&self, claim: &ClaimRef) -> Result<bool, VeriNetError> {
        Ok(self.revoked.lock().await.insert(*claim))
    }

    async fn is_revoked(&self, claim: &ClaimRef) -> Result<bool, VeriNetError> {
        Ok(self.revoked.lock().await.contains(claim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use verinet_core::digest::Address;
    use verinet_core::ledger::Confirmation;

    fn record(validator: u8) -> RewardRecord {
        RewardRecord {
            validator: Address([validator; 20]),
            tier: 2,
            amount: 25,
            result: ResultRef([9u8; 32]),
            issued_at: Utc::now(),
            confirmation: Confirmation {
                tx_id: TxId(format!("0x{:02x}", validator)),
                block: 1,
                confirmed_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_reward_lifecycle() {
        let store = MemoryStore::new();
        let rec = record(1);
        let key = rec.key();

        assert_eq!(store.reserve(&key).await.unwrap(), Reservation::Fresh);
        assert!(store.reserve(&key).await.is_err());

        store.mark_submitted(&key, &rec.confirmation.tx_id).await.unwrap();
        assert_eq!(
            store.reserve(&key).await.unwrap(),
            Reservation::Resume(rec.confirmation.tx_id.clone())
        );

        store.complete(&rec).await.unwrap();
        assert!(matches!(
            store.complete(&rec).await,
            Err(VeriNetError::Duplicate(_))
        ));
        assert!(matches!(
            store.reserve(&key).await,
            Err(VeriNetError::Duplicate(_))
        ));
        assert_eq!(store.get_record(&key).await.unwrap(), Some(rec));
        assert_eq!(store.list_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_release_frees_key_but_not_completed() {
        let store = MemoryStore::new();
        let rec = record(2);
        let key = rec.key();

        store.reserve(&key).await.unwrap();
        store.release(&key).await.unwrap();
        assert_eq!(store.reserve(&key).await.unwrap(), Reservation::Fresh);

        store.complete(&rec).await.unwrap();
        store.release(&key).await.unwrap();
        assert!(store.get_record(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_result_is_insert_if_absent() {
        let store = MemoryStore::new();
        let subject = SubjectId::from_content(b"s");
        let first = AggregationResult::new(subject, 88, 85, vec![ClaimRef([1; 32])]);
        let mut again = first.clone();
        again.mean_accuracy = 10;

        assert!(store.insert_result(&first).await.unwrap());
        assert!(!store.insert_result(&again).await.unwrap());
        assert_eq!(
            store.get_result(&first.id).await.unwrap().unwrap().mean_accuracy,
            88
        );
        assert_eq!(store.results_for_subject(&subject).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storing_result_clears_pending_attestation() {
        let store = MemoryStore::new();
        let result = AggregationResult::new(SubjectId::from_content(b"p"), 60, 50, vec![ClaimRef([3; 32])]);
        let tx = TxId("0xfeed".to_string());

        store.record_pending(&result.id, &tx).await.unwrap();
        assert_eq!(store.pending_attestation(&result.id).await.unwrap(), Some(tx));

        store.insert_result(&result).await.unwrap();
        assert_eq!(store.pending_attestation(&result.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revocation_marks_once() {
        let store = MemoryStore::new();
        let claim = ClaimRef([4u8; 32]);
        assert!(!store.is_revoked(&claim).await.unwrap());
        assert!(store.revoke(&claim).await.unwrap());
        assert!(!store.revoke(&claim).await.unwrap());
        assert!(store.is_revoked(&claim).await.unwrap());
    }
}
