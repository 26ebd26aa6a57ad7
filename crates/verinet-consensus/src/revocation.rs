// crates/verinet-consensus/src/revocation.rs
//
// Claim revocation. Revoking marks a claim ref; the claim itself is never
// altered or deleted. Results already published from a claim stay as they
// are; the mark only keeps the claim out of later aggregations.

use std::sync::Arc;

use thiserror::Error;

use verinet_core::claim::Claim;
use verinet_core::digest::{Address, ClaimRef};
use verinet_core::error::VeriNetError;
use verinet_core::traits::RevocationStore;

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("only the issuer {issuer} may revoke this claim")]
    NotIssuer { issuer: Address },

    #[error("claim {0} was signed as non-revocable")]
    NotRevocable(ClaimRef),

    #[error("claim {0} does not verify")]
    InvalidClaim(ClaimRef),

    #[error(transparent)]
    Store(#[from] VeriNetError),
}

impl From<RevocationError> for VeriNetError {
    fn from(e: RevocationError) -> Self {
        match e {
            RevocationError::NotIssuer { .. } => VeriNetError::Authorization(e.to_string()),
            RevocationError::NotRevocable(_) | RevocationError::InvalidClaim(_) => {
                VeriNetError::Validation(e.to_string())
            }
            RevocationError::Store(inner) => inner,
        }
    }
}

#[derive(Clone)]
pub struct RevocationList {
    store: Arc<dyn RevocationStore>,
}

impl RevocationList {
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        Self { store }
    }

    /// Revoke `claim` on behalf of `requested_by`.
    ///
    /// Returns `false` if the claim was already revoked.
    pub async fn revoke(&self, claim: &Claim, requested_by: Address) -> Result<bool, RevocationError> {
        let uid = claim.uid();
        if !claim.verify() {
            return Err(RevocationError::InvalidClaim(uid));
        }
        if requested_by != claim.issuer {
            return Err(RevocationError::NotIssuer {
                issuer: claim.issuer,
            });
        }
        if !claim.revocable {
            return Err(RevocationError::NotRevocable(uid));
        }

        let fresh = self.store.revoke(&uid).await?;
        if fresh {
            tracing::info!("Revoked claim {} by {}", uid, requested_by);
        } else {
            tracing::debug!("Claim {} was already revoked", uid);
        }
        Ok(fresh)
    }

    pub async fn is_revoked(&self, claim: &ClaimRef) -> Result<bool, VeriNetError> {
        self.store.is_revoked(claim).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{signed_claim, signed_claim_with, Validator};
    use verinet_core::claim::ClaimOptions;
    use verinet_core::digest::SubjectId;
    use verinet_store::MemoryStore;

    fn list() -> RevocationList {
        RevocationList::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_issuer_revokes_once() {
        let list = list();
        let validator = Validator::new();
        let claim = signed_claim(&validator, SubjectId::from_content(b"a"), 90);

        assert!(list.revoke(&claim, validator.address()).await.unwrap());
        assert!(!list.revoke(&claim, validator.address()).await.unwrap());
        assert!(list.is_revoked(&claim.uid()).await.unwrap());
    }

    #[tokio::test]
    async fn test_stranger_cannot_revoke() {
        let list = list();
        let validator = Validator::new();
        let claim = signed_claim(&validator, SubjectId::from_content(b"a"), 90);

        let err = list.revoke(&claim, Address([1; 20])).await.unwrap_err();
        assert!(matches!(err, RevocationError::NotIssuer { .. }));
        assert!(!list.is_revoked(&claim.uid()).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_revocable_claim_is_refused() {
        let list = list();
        let validator = Validator::new();
        let claim = signed_claim_with(
            &validator,
            SubjectId::from_content(b"a"),
            90,
            ClaimOptions {
                revocable: false,
                ..ClaimOptions::default()
            },
        );

        let err = list.revoke(&claim, validator.address()).await.unwrap_err();
        assert!(matches!(err, RevocationError::NotRevocable(_)));
    }
}
