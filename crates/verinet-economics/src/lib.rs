// crates/verinet-economics/src/lib.rs
//
// verinet-economics: Reward token denomination, tier policy and reward
// issuance for VeriNet.
//
// All monetary values are tracked in wei (the smallest unit of VNT).
// 1 VNT = 10^18 wei.

pub mod rewards;
pub mod tiers;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use rewards::{RewardEngine, RewardError};
pub use tiers::{RewardTierTable, TierPolicy};
pub use token::{Vnt, Wei, WEI_PER_VNT};
