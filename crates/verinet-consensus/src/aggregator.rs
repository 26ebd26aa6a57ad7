// crates/verinet-consensus/src/aggregator.rs
//
// Aggregator: admits a batch of claims about one subject and computes the
// consensus result.
//
// Admission is all-or-nothing. Each claim must be about the aggregated
// subject, be signed under the accuracy claim schema, verify against its
// signer key, come from an active validator, be the only claim from its
// issuer, be unexpired and not revoked. The first
// violation fails the whole call and no result is produced.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use verinet_core::aggregation::AggregationResult;
use verinet_core::claim::{Claim, MAX_ACCURACY};
use verinet_core::digest::{Address, ClaimRef, SchemaId, SubjectId};
use verinet_core::error::VeriNetError;

use crate::policy::{AggregationPolicy, MeanPolicy};
use crate::registry::ParticipantRegistry;
use crate::revocation::RevocationList;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("no claims to aggregate")]
    EmptyClaimSet,

    #[error("issuer {0} is not an active validator")]
    UnauthorizedIssuer(Address),

    #[error("issuer {0} submitted more than one claim for the subject")]
    DuplicateIssuer(Address),

    #[error("claim {claim} rejected: {reason}")]
    InvalidClaim { claim: ClaimRef, reason: String },

    #[error("threshold {0} is outside 0..=100")]
    InvalidThreshold(u8),

    #[error(transparent)]
    Store(#[from] VeriNetError),
}

impl From<AggregationError> for VeriNetError {
    fn from(e: AggregationError) -> Self {
        match e {
            AggregationError::UnauthorizedIssuer(_) => VeriNetError::Authorization(e.to_string()),
            AggregationError::DuplicateIssuer(_) => VeriNetError::Duplicate(e.to_string()),
            AggregationError::Store(inner) => inner,
            other => VeriNetError::Validation(other.to_string()),
        }
    }
}

pub struct Aggregator {
    registry: Arc<ParticipantRegistry>,
    revocations: RevocationList,
    /// Only claims signed under this schema are admitted.
    claim_schema: SchemaId,
    policy: Box<dyn AggregationPolicy>,
}

impl Aggregator {
    /// An aggregator using the plain mean.
    pub fn new(
        registry: Arc<ParticipantRegistry>,
        revocations: RevocationList,
        claim_schema: SchemaId,
    ) -> Self {
        Self::with_policy(registry, revocations, claim_schema, Box::new(MeanPolicy))
    }

    pub fn with_policy(
        registry: Arc<ParticipantRegistry>,
        revocations: RevocationList,
        claim_schema: SchemaId,
        policy: Box<dyn AggregationPolicy>,
    ) -> Self {
        Self {
            registry,
            revocations,
            claim_schema,
            policy,
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Validate `claims` and compute the consensus for `subject`.
    pub async fn aggregate(
        &self,
        subject: SubjectId,
        claims: &[Claim],
        threshold: u8,
    ) -> Result<AggregationResult, AggregationError> {
        if threshold > MAX_ACCURACY {
            return Err(AggregationError::InvalidThreshold(threshold));
        }
        if claims.is_empty() {
            return Err(AggregationError::EmptyClaimSet);
        }

        let now = Utc::now().timestamp().max(0) as u64;
        let mut issuers = HashSet::with_capacity(claims.len());
        let mut refs = Vec::with_capacity(claims.len());
        let mut accuracies = Vec::with_capacity(claims.len());

        for claim in claims {
            let uid = claim.uid();
            let reject = |reason: &str| AggregationError::InvalidClaim {
                claim: uid,
                reason: reason.to_string(),
            };

            if claim.subject != subject {
                return Err(reject("claim is about a different subject"));
            }
            if claim.schema != self.claim_schema {
                return Err(reject("claim is not signed under the accuracy schema"));
            }
            if !claim.verify() {
                return Err(reject("signature does not verify"));
            }
            if !self.registry.is_active_validator(&claim.issuer).await {
                return Err(AggregationError::UnauthorizedIssuer(claim.issuer));
            }
            if !issuers.insert(claim.issuer) {
                return Err(AggregationError::DuplicateIssuer(claim.issuer));
            }
            if claim.is_expired(now) {
                return Err(reject("claim has expired"));
            }
            if self.revocations.is_revoked(&uid).await? {
                return Err(reject("claim has been revoked"));
            }

            refs.push(uid);
            accuracies.push(claim.accuracy);
        }

        let mean = self
            .policy
            .score(&accuracies)
            .ok_or(AggregationError::EmptyClaimSet)?;
        let result = AggregationResult::new(subject, mean, threshold, refs)
            .with_contributors(issuers.into_iter().collect());

        tracing::info!(
            "Aggregated {} claims for {}: mean {} vs threshold {} -> {} ({})",
            claims.len(),
            subject,
            result.mean_accuracy,
            threshold,
            result.decision,
            self.policy.name()
        );
        Ok(result)
    }
}
