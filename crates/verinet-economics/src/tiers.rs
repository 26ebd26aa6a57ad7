// crates/verinet-economics/src/tiers.rs
//
// Score tiers.
//
// Two independent pieces of configuration:
//   - TierPolicy: accuracy -> tier, by ascending accuracy cut-offs.
//   - RewardTierTable: tier -> amount in wei.
// The reward engine only ever sees a tier; mapping accuracy to a tier is the
// caller's explicit step.

use verinet_core::claim::MAX_ACCURACY;
use verinet_core::error::VeriNetError;
use verinet_core::reward::ScoreTier;

use crate::token::{Vnt, Wei};

/// Maps an accuracy to a tier by counting the cut-offs it reaches.
///
/// With cut-offs `[50, 75, 90]`: 0..=49 is tier 0, 50..=74 tier 1,
/// 75..=89 tier 2 and 90..=100 tier 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    cutoffs: Vec<u8>,
}

impl TierPolicy {
    pub fn new(cutoffs: Vec<u8>) -> Result<Self, VeriNetError> {
        if cutoffs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(VeriNetError::Configuration(format!(
                "tier cut-offs must be strictly ascending, got {:?}",
                cutoffs
            )));
        }
        if let Some(&c) = cutoffs.iter().find(|&&c| c > MAX_ACCURACY) {
            return Err(VeriNetError::Configuration(format!(
                "tier cut-off {} exceeds {}",
                c, MAX_ACCURACY
            )));
        }
        if cutoffs.len() >= usize::from(ScoreTier::MAX) {
            return Err(VeriNetError::Configuration("too many tier cut-offs".to_string()));
        }
        Ok(Self { cutoffs })
    }

    pub fn tier_for(&self, accuracy: u8) -> ScoreTier {
        // Bounded by the length check in `new`.
        self.cutoffs.iter().filter(|&&c| accuracy >= c).count() as ScoreTier
    }

    /// Highest tier this policy can produce.
    pub fn max_tier(&self) -> ScoreTier {
        self.cutoffs.len() as ScoreTier
    }
}

/// Reward amount per tier; index = tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTierTable {
    amounts: Vec<Wei>,
}

impl RewardTierTable {
    pub fn new(amounts: Vec<Wei>) -> Result<Self, VeriNetError> {
        if amounts.is_empty() {
            return Err(VeriNetError::Configuration(
                "reward tier table is empty".to_string(),
            ));
        }
        if amounts.len() > usize::from(ScoreTier::MAX) + 1 {
            return Err(VeriNetError::Configuration("too many reward tiers".to_string()));
        }
        Ok(Self { amounts })
    }

    /// Build from token amounts such as `["5", "10", "25", "50"]`.
    pub fn from_token_amounts<S: AsRef<str>>(amounts: &[S]) -> Result<Self, VeriNetError> {
        let parsed = amounts
            .iter()
            .map(|a| {
                a.as_ref().parse::<Vnt>().map(|v| v.wei).map_err(|e| {
                    VeriNetError::Configuration(format!("reward_tiers: {}", e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn amount_for(&self, tier: ScoreTier) -> Option<Wei> {
        self.amounts.get(usize::from(tier)).copied()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreTier, Wei)> + '_ {
        self.amounts
            .iter()
            .enumerate()
            .map(|(tier, amount)| (tier as ScoreTier, *amount))
    }

    /// Whether every tier `policy` can produce has an amount.
    pub fn covers(&self, policy: &TierPolicy) -> bool {
        usize::from(policy.max_tier()) < self.amounts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::WEI_PER_VNT;

    #[test]
    fn test_tier_boundaries() {
        let policy = TierPolicy::new(vec![50, 75, 90]).unwrap();
        assert_eq!(policy.tier_for(0), 0);
        assert_eq!(policy.tier_for(49), 0);
        assert_eq!(policy.tier_for(50), 1);
        assert_eq!(policy.tier_for(88), 2);
        assert_eq!(policy.tier_for(90), 3);
        assert_eq!(policy.tier_for(100), 3);
        assert_eq!(policy.max_tier(), 3);
    }

    #[test]
    fn test_policy_rejects_unordered_cutoffs() {
        assert!(TierPolicy::new(vec![75, 50]).is_err());
        assert!(TierPolicy::new(vec![50, 50]).is_err());
        assert!(TierPolicy::new(vec![101]).is_err());
        assert!(TierPolicy::new(vec![]).is_ok());
    }

    #[test]
    fn test_table_lookup() {
        let table = RewardTierTable::from_token_amounts(&["5", "10", "25", "50"]).unwrap();
        assert_eq!(table.amount_for(2), Some(25 * WEI_PER_VNT));
        assert_eq!(table.amount_for(4), None);
        assert_eq!(table.len(), 4);
        assert!(table.covers(&TierPolicy::new(vec![50, 75, 90]).unwrap()));
        assert!(!table.covers(&TierPolicy::new(vec![20, 40, 60, 80]).unwrap()));
    }

    #[test]
    fn test_table_rejects_empty_and_bad_amounts() {
        assert!(RewardTierTable::new(vec![]).is_err());
        assert!(RewardTierTable::from_token_amounts(&["10", "ten"]).is_err());
    }
}
