// crates/verinet-store/src/archive.rs
//
// Best-effort archival of claims, content claims and results. Archival sits
// off the critical path: a failure is logged and reported as `None`, never
// propagated.

use verinet_core::aggregation::AggregationResult;
use verinet_core::claim::{Claim, ClaimDocument};
use verinet_core::content::{ContentClaim, ContentClaimDocument};
use verinet_core::traits::Archive;

/// Archive a claim's JSON document, returning its content address on success.
pub async fn archive_claim(archive: &dyn Archive, claim: &Claim) -> Option<String> {
    let document = match serde_json::to_value(ClaimDocument::from(claim.clone())) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Could not encode claim {} for archival: {}", claim.uid(), e);
            return None;
        }
    };

    match archive.store(&document).await {
        Ok(address) => {
            tracing::info!("Archived claim {} at {}", claim.uid(), address);
            Some(address)
        }
        Err(e) => {
            tracing::warn!("Failed to archive claim {}: {}", claim.uid(), e);
            None
        }
    }
}

/// Archive a provider's content claim.
pub async fn archive_content_claim(archive: &dyn Archive, claim: &ContentClaim) -> Option<String> {
    let document = match serde_json::to_value(ContentClaimDocument::from(claim.clone())) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Could not encode content claim {} for archival: {}", claim.uid(), e);
            return None;
        }
    };

    match archive.store(&document).await {
        Ok(address) => {
            tracing::info!("Archived content claim {} at {}", claim.uid(), address);
            Some(address)
        }
        Err(e) => {
            tracing::warn!("Failed to archive content claim {}: {}", claim.uid(), e);
            None
        }
    }
}

/// Archive a published aggregation result.
pub async fn archive_result(archive: &dyn Archive, result: &AggregationResult) -> Option<String> {
    let document = match serde_json::to_value(result) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Could not encode result {} for archival: {}", result.id, e);
            return None;
        }
    };

    match archive.store(&document).await {
        Ok(address) => {
            tracing::info!("Archived result {} at {}", result.id, address);
            Some(address)
        }
        Err(e) => {
            tracing::warn!("Failed to archive result {}: {}", result.id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use verinet_core::claim::{ClaimOptions, ClaimSigner};
    use verinet_core::crypto::Keypair;
    use verinet_core::digest::{SchemaId, SubjectId};
    use verinet_core::error::VeriNetError;

    struct FailingArchive;

    #[async_trait]
    impl Archive for FailingArchive {
        async fn store(&self, _document: &serde_json::Value) -> Result<String, VeriNetError> {
            Err(VeriNetError::Storage("pinning service unavailable".to_string()))
        }
    }

    struct EchoArchive;

    #[async_trait]
    impl Archive for EchoArchive {
        async fn store(&self, document: &serde_json::Value) -> Result<String, VeriNetError> {
            Ok(format!("cid-{}", document["uid"].as_str().unwrap_or("?")))
        }
    }

    fn claim() -> Claim {
        let keypair = Keypair::generate();
        ClaimSigner::new(SchemaId::ZERO)
            .sign(
                SubjectId::from_content(b"doc"),
                80,
                keypair.address(),
                &keypair,
                ClaimOptions::default(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        assert_eq!(archive_claim(&FailingArchive, &claim()).await, None);
    }

    #[tokio::test]
    async fn test_success_returns_address() {
        let claim = claim();
        let address = archive_claim(&EchoArchive, &claim).await.unwrap();
        assert_eq!(address, format!("cid-{}", claim.uid()));
    }

    #[tokio::test]
    async fn test_content_claim_archived_under_its_uid() {
        let keypair = Keypair::generate();
        let content = ClaimSigner::new(SchemaId([3; 32]))
            .sign_content(
                SubjectId::from_content(b"doc"),
                keypair.address(),
                &keypair,
                ClaimOptions::default(),
            )
            .unwrap();
        let address = archive_content_claim(&EchoArchive, &content).await.unwrap();
        assert_eq!(address, format!("cid-{}", content.uid()));
        assert_eq!(archive_content_claim(&FailingArchive, &content).await, None);
    }

    #[tokio::test]
    async fn test_result_failure_is_swallowed() {
        let result = AggregationResult::new(SubjectId::from_content(b"doc"), 88, 85, vec![]);
        assert_eq!(archive_result(&FailingArchive, &result).await, None);
    }
}
