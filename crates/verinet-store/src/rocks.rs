// crates/verinet-store/src/rocks.rs
//
// RocksDB-backed persistent storage for VeriNet state.
//
// Key format:
//   - `registry:participants`        -> JSON Vec<Participant> (registration order)
//   - `result:{result_ref}`          -> JSON AggregationResult
//   - `subject:{subject}:{result}`   -> empty value (secondary index)
//   - `pending:{result}`             -> JSON TxId of an unconfirmed attestation
//   - `reward:{validator}:{result}`  -> JSON RewardStatus
//   - `revoked:{claim_ref}`          -> empty value
//
// Other crates may keep opaque blobs here through `put_bytes`/`get_bytes`
// (the local ledger snapshot lives under `ledger:`).

use async_trait::async_trait;
use rocksdb::{DBWithThreadMode, MultiThreaded, Options};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use verinet_core::aggregation::AggregationResult;
use verinet_core::digest::{ClaimRef, ResultRef, SubjectId};
use verinet_core::error::VeriNetError;
use verinet_core::ledger::TxId;
use verinet_core::participant::Participant;
use verinet_core::reward::{Reservation, RewardKey, RewardRecord, RewardStatus};
use verinet_core::traits::{RegistryStore, ResultStore, RevocationStore, RewardStore};

use crate::status;

const PARTICIPANTS_KEY: &[u8] = b"registry:participants";

/// RocksDB wrapper implementing the VeriNet store traits.
#[derive(Debug)]
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    /// Serializes read-modify-write sequences (reward CAS, result insert).
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, VeriNetError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path).map_err(|e| {
            VeriNetError::Storage(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn result_key(id: &ResultRef) -> Vec<u8> {
        format!("result:{}", id).into_bytes()
    }

    fn pending_key(id: &ResultRef) -> Vec<u8> {
        format!("pending:{}", id).into_bytes()
    }

    fn subject_key(subject: &SubjectId, id: &ResultRef) -> Vec<u8> {
        format!("subject:{}:{}", subject, id).into_bytes()
    }

    fn reward_key(key: &RewardKey) -> Vec<u8> {
        format!("reward:{}", key.storage_key()).into_bytes()
    }

    fn revoked_key(claim: &ClaimRef) -> Vec<u8> {
        format!("revoked:{}", claim).into_bytes()
    }

    /// Put raw bytes into RocksDB, mapping errors to VeriNetError::Storage.
    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), VeriNetError> {
        self.db
            .put(key, value)
            .map_err(|e| VeriNetError::Storage(format!("RocksDB put failed: {}", e)))
    }

    /// Get raw bytes from RocksDB, mapping errors to VeriNetError::Storage.
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VeriNetError> {
        self.db
            .get(key)
            .map_err(|e| VeriNetError::Storage(format!("RocksDB get failed: {}", e)))
    }

    fn delete_raw(&self, key: &[u8]) -> Result<(), VeriNetError> {
        self.db
            .delete(key)
            .map_err(|e| VeriNetError::Storage(format!("RocksDB delete failed: {}", e)))
    }

    fn put_json<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), VeriNetError> {
        let json = serde_json::to_vec(value)?;
        self.put_raw(key, &json)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, VeriNetError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Collect `(key, value)` pairs whose key starts with `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, VeriNetError> {
        let mut out = Vec::new();
        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item
                .map_err(|e| VeriNetError::Storage(format!("RocksDB iteration error: {}", e)))?;

            // Without a prefix extractor the iterator runs past the prefix.
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }

    /// Store a value under an arbitrary key.
    pub fn put_bytes(&self, key: &[u8], value: &[u8]) -> Result<(), VeriNetError> {
        self.put_raw(key, value)
    }

    /// Retrieve a value by arbitrary key.
    pub fn get_bytes(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VeriNetError> {
        self.get_raw(key)
    }

    fn reward_status(&self, key: &RewardKey) -> Result<Option<RewardStatus>, VeriNetError> {
        self.get_json(&Self::reward_key(key))
    }
}

#[async_trait]
impl RegistryStore for RocksStore {
    async fn load_participants(&self) -> Result<Vec<Participant>, VeriNetError> {
        Ok(self.get_json(PARTICIPANTS_KEY)?.unwrap_or_default())
    }

    async fn save_participants(&self, participants: &[Participant]) -> Result<(), VeriNetError> {
        self.put_json(PARTICIPANTS_KEY, &participants)
    }
}

#[async_trait]
impl ResultStore for RocksStore {
    async fn insert_result(&self, result: &AggregationResult) -> Result<bool, VeriNetError> {
        let _guard = self.write_lock.lock().await;
        let key = Self::result_key(&result.id);
        if self.get_raw(&key)?.is_some() {
            return Ok(false);
        }
        self.put_json(&key, result)?;
        self.put_raw(&Self::subject_key(&result.subject, &result.id), &[])?;
        self.delete_raw(&Self::pending_key(&result.id))?;
        Ok(true)
    }

    async fn record_pending(&self, id: &ResultRef, tx: &TxId) -> Result<(), VeriNetError> {
        self.put_json(&Self::pending_key(id), tx)
    }

    async fn pending_attestation(&self, id: &ResultRef) -> Result<Option<TxId>, VeriNetError> {
        self.get_json(&Self::pending_key(id))
    }

    async fn clear_pending(&self, id: &ResultRef) -> Result<(), VeriNetError> {
        self.delete_raw(&Self::pending_key(id))
    }

    async fn get_result(&self, id: &ResultRef) -> Result<Option<AggregationResult>, VeriNetError> {
        self.get_json(&Self::result_key(id))
    }

    async fn results_for_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<AggregationResult>, VeriNetError> {
        let prefix = format!("subject:{}:", subject);
        let mut results = Vec::new();
        for (key, _) in self.scan_prefix(prefix.as_bytes())? {
            let suffix = std::str::from_utf8(&key[prefix.len()..]).unwrap_or("");
            if let Ok(id) = suffix.parse::<ResultRef>() {
                if let Some(result) = self.get_json(&Self::result_key(&id))? {
                    results.push(result);
                }
            }
        }
        results.sort_by_key(|r: &AggregationResult| r.computed_at);
        Ok(results)
    }

    async fn list_results(&self) -> Result<Vec<AggregationResult>, VeriNetError> {
        let mut results = Vec::new();
        for (_, value) in self.scan_prefix(b"result:")? {
            results.push(serde_json::from_slice::<AggregationResult>(&value)?);
        }
        results.sort_by_key(|r| r.computed_at);
        Ok(results)
    }
}

#[async_trait]
impl RewardStore for RocksStore {
    async fn reserve(&self, key: &RewardKey) -> Result<Reservation, VeriNetError> {
        let _guard = self.write_lock.lock().await;
        let current = self.reward_status(key)?;
        let (reservation, write) = status::on_reserve(key, current.as_ref())?;
        if let Some(new_status) = write {
            self.put_json(&Self::reward_key(key), &new_status)?;
        }
        Ok(reservation)
    }

    async fn mark_submitted(&self, key: &RewardKey, tx: &TxId) -> Result<(), VeriNetError> {
        let _guard = self.write_lock.lock().await;
        let current = self.reward_status(key)?;
        let next = status::on_submit(key, current.as_ref(), tx)?;
        self.put_json(&Self::reward_key(key), &next)
    }

    async fn complete(&self, record: &RewardRecord) -> Result<(), VeriNetError> {
        let _guard = self.write_lock.lock().await;
        let key = record.key();
        let current = self.reward_status(&key)?;
        status::on_complete(&key, current.as_ref())?;
        self.put_json(
            &Self::reward_key(&key),
            &RewardStatus::Completed(record.clone()),
        )
    }

    async fn release(&self, key: &RewardKey) -> Result<(), VeriNetError> {
        let _guard = self.write_lock.lock().await;
        let current = self.reward_status(key)?;
        if status::releasable(current.as_ref()) {
            self.delete_raw(&Self::reward_key(key))?;
        }
        Ok(())
    }

    async fn get_record(&self, key: &RewardKey) -> Result<Option<RewardRecord>, VeriNetError> {
        Ok(match self.reward_status(key)? {
            Some(RewardStatus::Completed(record)) => Some(record),
            _ => None,
        })
    }

    async fn list_records(&self) -> Result<Vec<RewardRecord>, VeriNetError> {
        let mut records = Vec::new();
        for (_, value) in self.scan_prefix(b"reward:")? {
            if let RewardStatus::Completed(record) = serde_json::from_slice::<RewardStatus>(&value)? {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.issued_at);
        Ok(records)
    }
}

#[async_trait]
impl RevocationStore for RocksStore {
    async fn revoke(&self, claim: &ClaimRef) -> Result<bool, VeriNetError> {
        let _guard = self.write_lock.lock().await;
        let key = Self::revoked_key(claim);
        if self.get_raw(&key)?.is_some() {
            return Ok(false);
        }
        self.put_raw(&key, &[])?;
        Ok(true)
    }

    async fn is_revoked(&self, claim: &ClaimRef) -> Result<bool, VeriNetError> {
        Ok(self.get_raw(&Self::revoked_key(claim))?.is_some())
    }
}
