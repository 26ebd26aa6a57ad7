// crates/verinet-core/src/aggregation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::digest::{Address, ClaimRef, ResultRef, SubjectId};
use crate::ledger::Confirmation;

/// Consensus outcome for one subject.
///
/// Immutable once published: a different claim set produces a different
/// `id`, never an overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Hash of every field below except `computed_at` and `confirmation`.
    pub id: ResultRef,
    pub subject: SubjectId,
    /// Mean accuracy, rounded half-up.
    pub mean_accuracy: u8,
    /// `mean_accuracy > threshold`.
    pub decision: bool,
    pub threshold: u8,
    /// Contributing claims, sorted ascending.
    pub claims: Vec<ClaimRef>,
    /// Issuers of the contributing claims, sorted ascending. Determined by
    /// `claims`, so not hashed into `id` separately.
    #[serde(default)]
    pub contributors: Vec<Address>,
    pub computed_at: DateTime<Utc>,
    /// Ledger receipt, set once the result has been published.
    #[serde(default)]
    pub confirmation: Option<Confirmation>,
}

impl AggregationResult {
    pub fn new(
        subject: SubjectId,
        mean_accuracy: u8,
        threshold: u8,
        mut claims: Vec<ClaimRef>,
    ) -> Self {
        claims.sort();
        let decision = mean_accuracy > threshold;
        let id = Self::compute_ref(&subject, mean_accuracy, decision, threshold, &claims);
        Self {
            id,
            subject,
            mean_accuracy,
            decision,
            threshold,
            claims,
            contributors: Vec::new(),
            computed_at: Utc::now(),
            confirmation: None,
        }
    }

    pub fn with_contributors(mut self, mut issuers: Vec<Address>) -> Self {
        issuers.sort();
        self.contributors = issuers;
        self
    }

    /// Whether `validator` issued one of the contributing claims.
    pub fn has_contributor(&self, validator: &Address) -> bool {
        self.contributors.binary_search(validator).is_ok()
    }

    /// SHA-256("verinet:result:v1" || subject || mean || decision || threshold || claims).
    pub fn compute_ref(
        subject: &SubjectId,
        mean_accuracy: u8,
        decision: bool,
        threshold: u8,
        claims: &[ClaimRef],
    ) -> ResultRef {
        let mut hasher = Sha256::new();
        hasher.update(b"verinet:result:v1");
        hasher.update(subject.as_bytes());
        hasher.update([mean_accuracy, u8::from(decision), threshold]);
        hasher.update((claims.len() as u64).to_be_bytes());
        for claim in claims {
            hasher.update(claim.as_bytes());
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        ResultRef(out)
    }

    /// Equal to `other` in everything but the computation timestamp.
    pub fn same_outcome(&self, other: &AggregationResult) -> bool {
        self.id == other.id
            && self.subject == other.subject
            && self.mean_accuracy == other.mean_accuracy
            && self.decision == other.decision
            && self.threshold == other.threshold
            && self.claims == other.claims
            && self.contributors == other.contributors
    }

    /// Ledger payload for the aggregated schema `uint8 aggregatedAccuracy, bool result`:
    /// two left-padded 32-byte words.
    pub fn attestation_payload(&self) -> Vec<u8> {
        let mut out = vec![0u8; 64];
        out[31] = self.mean_accuracy;
        out[63] = u8::from(self.decision);
        out
    }

    pub fn is_published(&self) -> bool {
        self.confirmation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_order_does_not_change_id() {
        let subject = SubjectId::from_content(b"s");
        let a = AggregationResult::new(subject, 88, 85, vec![ClaimRef([2; 32]), ClaimRef([1; 32])]);
        let b = AggregationResult::new(subject, 88, 85, vec![ClaimRef([1; 32]), ClaimRef([2; 32])]);
        assert_eq!(a.id, b.id);
        assert_eq!(a.claims, vec![ClaimRef([1; 32]), ClaimRef([2; 32])]);
        assert!(a.same_outcome(&b));
    }

    #[test]
    fn test_different_claim_set_gives_distinct_id() {
        let subject = SubjectId::from_content(b"s");
        let a = AggregationResult::new(subject, 88, 85, vec![ClaimRef([1; 32])]);
        let b = AggregationResult::new(subject, 88, 85, vec![ClaimRef([1; 32]), ClaimRef([2; 32])]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_decision_is_strict() {
        let subject = SubjectId::from_content(b"s");
        assert!(!AggregationResult::new(subject, 85, 85, vec![]).decision);
        assert!(AggregationResult::new(subject, 86, 85, vec![]).decision);
    }

    #[test]
    fn test_contributors_are_sorted_and_searchable() {
        let subject = SubjectId::from_content(b"s");
        let result = AggregationResult::new(subject, 88, 85, vec![ClaimRef([1; 32])])
            .with_contributors(vec![Address([9; 20]), Address([3; 20])]);
        assert_eq!(result.contributors, vec![Address([3; 20]), Address([9; 20])]);
        assert!(result.has_contributor(&Address([9; 20])));
        assert!(!result.has_contributor(&Address([4; 20])));
    }

    #[test]
    fn test_attestation_payload_layout() {
        let subject = SubjectId::from_content(b"s");
        let result = AggregationResult::new(subject, 88, 85, vec![]);
        let payload = result.attestation_payload();
        assert_eq!(payload.len(), 64);
        assert_eq!(payload[31], 88);
        assert_eq!(payload[63], 1);
        assert!(payload[..31].iter().all(|b| *b == 0));
    }
}
