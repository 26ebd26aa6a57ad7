// crates/verinet-core/src/lib.rs
//
// verinet-core: Core types, traits, and crypto primitives for VeriNet.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines validator claims, provider content claims and their canonical
// encodings, participants, aggregation results, reward records, the error
// taxonomy, and the storage, signing and archival interfaces the engine is
// built against.

pub mod aggregation;
pub mod claim;
pub mod content;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod reward;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use verinet_core::Claim;`

pub use aggregation::AggregationResult;
pub use claim::{Claim, ClaimDocument, ClaimError, ClaimOptions, ClaimSigner};
pub use content::{ContentClaim, ContentClaimDocument};
pub use crypto::Keypair;
pub use digest::{Address, ClaimRef, ResultRef, SchemaId, SubjectId};
pub use error::VeriNetError;
pub use ledger::{Confirmation, TxId};
pub use participant::{Participant, ParticipantRole};
pub use reward::{Reservation, RewardKey, RewardRecord, RewardStatus, ScoreTier};
pub use traits::{Archive, KeySigner, RegistryStore, ResultStore, RevocationStore, RewardStore};
