// crates/verinet-core/src/traits.rs

use async_trait::async_trait;

use crate::aggregation::AggregationResult;
use crate::digest::{Address, ClaimRef, ResultRef, SubjectId};
use crate::error::VeriNetError;
use crate::ledger::TxId;
use crate::participant::Participant;
use crate::reward::{Reservation, RewardKey, RewardRecord};

/// Holder of a signing key for one issuer identity.
///
/// Exposes signing only; callers never see raw key material.
pub trait KeySigner: Send + Sync {
    /// Address controlled by this key.
    fn address(&self) -> Address;

    /// Public key bytes (ed25519).
    fn public_key(&self) -> [u8; 32];

    /// Sign a message and return the 64-byte signature.
    fn sign(&self, message: &[u8]) -> Result<[u8; 64], VeriNetError>;
}

/// Durable, content-addressed archival of JSON documents.
///
/// Implemented by verinet-store (IPFS backend).
#[async_trait]
pub trait Archive: Send + Sync {
    /// Store a JSON document and return its content address.
    async fn store(&self, document: &serde_json::Value) -> Result<String, VeriNetError>;
}

/// Persistence for the participant registry.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load all participants in registration order.
    async fn load_participants(&self) -> Result<Vec<Participant>, VeriNetError>;

    /// Replace the persisted participant list.
    async fn save_participants(&self, participants: &[Participant]) -> Result<(), VeriNetError>;
}

/// Persistence for aggregation results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert a result if no result with the same id exists, and drop any
    /// pending attestation recorded for it.
    ///
    /// Returns `false` (and leaves the stored result untouched) when the id
    /// is already present.
    async fn insert_result(&self, result: &AggregationResult) -> Result<bool, VeriNetError>;

    /// Remember that the attestation of `id` was submitted as `tx` and is
    /// awaiting confirmation.
    async fn record_pending(&self, id: &ResultRef, tx: &TxId) -> Result<(), VeriNetError>;

    /// Transaction of an attestation submitted for `id` but not yet stored.
    async fn pending_attestation(&self, id: &ResultRef) -> Result<Option<TxId>, VeriNetError>;

    /// Forget a pending attestation the ledger rejected.
    async fn clear_pending(&self, id: &ResultRef) -> Result<(), VeriNetError>;

    async fn get_result(&self, id: &ResultRef) -> Result<Option<AggregationResult>, VeriNetError>;

    async fn results_for_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<AggregationResult>, VeriNetError>;

    async fn list_results(&self) -> Result<Vec<AggregationResult>, VeriNetError>;
}

/// Idempotence ledger for reward issuance.
///
/// Every method is an atomic compare-and-swap on the key's status, so
/// concurrent issuers for the same key are mutually exclusive.
#[async_trait]
pub trait RewardStore: Send + Sync {
    /// Claim `key` for issuance.
    ///
    /// # Errors
    /// `VeriNetError::Duplicate` if the key is completed or reserved by
    /// another issuer that has not submitted yet.
    async fn reserve(&self, key: &RewardKey) -> Result<Reservation, VeriNetError>;

    /// Record the submitted transaction for a reserved key.
    async fn mark_submitted(&self, key: &RewardKey, tx: &TxId) -> Result<(), VeriNetError>;

    /// Record the confirmed reward.
    ///
    /// # Errors
    /// `VeriNetError::Duplicate` if the key is already completed.
    async fn complete(&self, record: &RewardRecord) -> Result<(), VeriNetError>;

    /// Drop a reservation that never produced a transfer.
    async fn release(&self, key: &RewardKey) -> Result<(), VeriNetError>;

    async fn get_record(&self, key: &RewardKey) -> Result<Option<RewardRecord>, VeriNetError>;

    async fn list_records(&self) -> Result<Vec<RewardRecord>, VeriNetError>;
}

/// Claims revoked by their issuers. Revocation marks, it never deletes.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark a claim revoked. Returns `false` if it already was.
    async fn revoke(&self, claim: &ClaimRef) -> Result<bool, VeriNetError>;

    async fn is_revoked(&self, claim: &ClaimRef) -> Result<bool, VeriNetError>;
}
