// crates/verinet-store/src/lib.rs
//
// verinet-store: Storage layer for VeriNet.
//
// Provides RocksDB-backed persistence for the participant registry,
// aggregation results, the reward idempotence ledger, claim revocations and
// the local development ledger; in-memory equivalents of the same traits;
// and an IPFS client used for best-effort claim archival.

pub mod archive;
pub mod ipfs;
pub mod memory;
pub mod rocks;

mod status;

// Re-export key types for ergonomic access from downstream crates.
pub use archive::{archive_claim, archive_content_claim, archive_result};
pub use ipfs::IpfsClient;
pub use memory::MemoryStore;
pub use rocks::RocksStore;
