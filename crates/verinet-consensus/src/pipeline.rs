// crates/verinet-consensus/src/pipeline.rs
//
// AttestationPipeline: aggregate, publish and record, one subject at a time.
//
// A per-subject async mutex is held across the whole sequence, so two
// aggregations of the same subject never interleave. A result whose ref is
// already stored was published before; it is returned as-is instead of
// being attested a second time.
//
// The attestation's transaction id is persisted as pending before the wait.
// After a timeout, a transport failure or a failed store write, the next run
// for the same result waits on that transaction instead of submitting again.
// Only a ledger rejection clears the pending entry.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use verinet_core::aggregation::AggregationResult;
use verinet_core::claim::Claim;
use verinet_core::digest::{ResultRef, SchemaId, SubjectId};
use verinet_core::error::VeriNetError;
use verinet_core::ledger::{Confirmation, TxId};
use verinet_core::traits::{Archive, ResultStore};
use verinet_ledger::{LedgerError, LedgerPublisher};
use verinet_store::archive_result;

use crate::aggregator::{AggregationError, Aggregator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] VeriNetError),
}

impl From<PipelineError> for VeriNetError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Aggregation(inner) => inner.into(),
            PipelineError::Ledger(inner) => inner.into(),
            PipelineError::Store(inner) => inner,
        }
    }
}

pub struct AttestationPipeline {
    aggregator: Aggregator,
    publisher: Arc<LedgerPublisher>,
    results: Arc<dyn ResultStore>,
    /// Schema the aggregated attestation is recorded under.
    schema: SchemaId,
    archive: Option<Arc<dyn Archive>>,
    subject_locks: Mutex<HashMap<SubjectId, Arc<Mutex<()>>>>,
}

impl AttestationPipeline {
    pub fn new(
        aggregator: Aggregator,
        publisher: Arc<LedgerPublisher>,
        results: Arc<dyn ResultStore>,
        schema: SchemaId,
    ) -> Self {
        Self {
            aggregator,
            publisher,
            results,
            schema,
            archive: None,
            subject_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Also archive each newly published result (best effort).
    pub fn with_archive(mut self, archive: Arc<dyn Archive>) -> Self {
        self.archive = Some(archive);
        self
    }

    async fn lock_for(&self, subject: SubjectId) -> Arc<Mutex<()>> {
        let mut locks = self.subject_locks.lock().await;
        locks.entry(subject).or_default().clone()
    }

    /// Drop the subject's lock entry unless another run holds or awaits it.
    async fn unlock(&self, subject: SubjectId, lock: Arc<Mutex<()>>) {
        let mut locks = self.subject_locks.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&subject);
        }
    }

    /// Aggregate `claims`, publish the outcome and store it.
    ///
    /// Nothing is stored unless the ledger confirmed the attestation.
    pub async fn run(
        &self,
        subject: SubjectId,
        claims: &[Claim],
        threshold: u8,
    ) -> Result<AggregationResult, PipelineError> {
        let lock = self.lock_for(subject).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.run_locked(subject, claims, threshold).await
        };
        self.unlock(subject, lock).await;
        outcome
    }

    async fn run_locked(
        &self,
        subject: SubjectId,
        claims: &[Claim],
        threshold: u8,
    ) -> Result<AggregationResult, PipelineError> {
        let mut result = self.aggregator.aggregate(subject, claims, threshold).await?;

        if let Some(existing) = self.results.get_result(&result.id).await? {
            tracing::info!("Result {} already published, not attesting again", existing.id);
            return Ok(existing);
        }

        let tx_id = match self.results.pending_attestation(&result.id).await? {
            Some(tx_id) => {
                tracing::info!(
                    "Resuming attestation of {} on earlier transaction {}",
                    result.id,
                    tx_id
                );
                tx_id
            }
            None => self.submit(&result).await?,
        };
        result.confirmation = Some(self.await_attestation(&result.id, &tx_id).await?);

        if !self.results.insert_result(&result).await? {
            // Only reachable if another process published the same result meanwhile.
            tracing::warn!("Result {} was stored concurrently", result.id);
        }
        tracing::info!(
            "Published result {} for {} in block {}",
            result.id,
            subject,
            result.confirmation.as_ref().map_or(0, |c| c.block)
        );

        if let Some(archive) = &self.archive {
            archive_result(archive.as_ref(), &result).await;
        }

        Ok(result)
    }

    async fn submit(&self, result: &AggregationResult) -> Result<TxId, PipelineError> {
        let tx_id = self
            .publisher
            .submit_attestation(&result.attestation_payload(), self.schema)
            .await?;
        if let Err(e) = self.results.record_pending(&result.id, &tx_id).await {
            tracing::error!(
                "Attestation {} of {} submitted but not recorded: {}",
                tx_id,
                result.id,
                e
            );
            return Err(e.into());
        }
        Ok(tx_id)
    }

    async fn await_attestation(
        &self,
        id: &ResultRef,
        tx_id: &TxId,
    ) -> Result<Confirmation, PipelineError> {
        match self.publisher.confirm(tx_id).await {
            Ok(confirmation) => Ok(confirmation),
            Err(e) if e.is_rejection() => {
                tracing::warn!("Attestation {} of {} rejected: {}", tx_id, id, e);
                self.results.clear_pending(id).await?;
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(
                    "Attestation of {} pending on {} ({}); run again to resume the wait",
                    id,
                    tx_id,
                    e
                );
                Err(e.into())
            }
        }
    }

    pub async fn results_for(&self, subject: &SubjectId) -> Result<Vec<AggregationResult>, VeriNetError> {
        self.results.results_for_subject(subject).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::RevocationList;
    use crate::testutil::{registry_with, signed_claim, Validator, CLAIM_SCHEMA};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use verinet_ledger::local::AttestationEntry;
    use verinet_ledger::{Ledger, LedgerTx, LocalLedger, PublisherConfig, StateQuery, StateValue};
    use verinet_store::MemoryStore;

    /// LocalLedger whose confirmations can be held back or refused.
    struct GatedLedger {
        inner: LocalLedger,
        stall: AtomicBool,
        refuse: AtomicBool,
    }

    impl GatedLedger {
        fn new() -> Self {
            Self {
                inner: LocalLedger::in_memory(),
                stall: AtomicBool::new(false),
                refuse: AtomicBool::new(false),
            }
        }

        async fn attestations(&self) -> Vec<AttestationEntry> {
            self.inner.attestations().await
        }
    }

    #[async_trait]
    impl Ledger for GatedLedger {
        async fn submit_transaction(&self, tx: &LedgerTx) -> Result<TxId, LedgerError> {
            self.inner.submit_transaction(tx).await
        }

        async fn wait_for_confirmation(&self, tx: &TxId) -> Result<Confirmation, LedgerError> {
            if self.stall.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.refuse.load(Ordering::SeqCst) {
                return Err(LedgerError::Submission("reverted".to_string()));
            }
            self.inner.wait_for_confirmation(tx).await
        }

        async fn read_contract_state(&self, q: &StateQuery) -> Result<StateValue, LedgerError> {
            self.inner.read_contract_state(q).await
        }
    }

    fn subject() -> SubjectId {
        SubjectId::from_content(b"Water boils at 100C at sea level.")
    }

    async fn setup(validators: &[&Validator]) -> (AttestationPipeline, Arc<GatedLedger>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_with(validators).await;
        let aggregator = Aggregator::new(registry, RevocationList::new(store.clone()), CLAIM_SCHEMA);
        let ledger = Arc::new(GatedLedger::new());
        let publisher = Arc::new(LedgerPublisher::new(
            ledger.clone(),
            PublisherConfig {
                confirmation_timeout: Duration::from_millis(100),
                ..PublisherConfig::default()
            },
        ));
        let pipeline = AttestationPipeline::new(aggregator, publisher, store.clone(), SchemaId([2; 32]));
        (pipeline, ledger, store)
    }

    #[tokio::test]
    async fn test_publishes_and_stores_result() {
        let vs = [Validator::new(), Validator::new(), Validator::new()];
        let (pipeline, ledger, store) = setup(&[&vs[0], &vs[1], &vs[2]]).await;
        let claims = vec![
            signed_claim(&vs[0], subject(), 85),
            signed_claim(&vs[1], subject(), 90),
            signed_claim(&vs[2], subject(), 88),
        ];

        let result = pipeline.run(subject(), &claims, 85).await.unwrap();
        assert!(result.is_published());

        let attestations = ledger.attestations().await;
        assert_eq!(attestations.len(), 1);
        assert_eq!(attestations[0].data, hex_payload(88, true));
        assert_eq!(store.get_result(&result.id).await.unwrap(), Some(result));
    }

    #[tokio::test]
    async fn test_identical_claim_set_is_published_once() {
        let vs = [Validator::new(), Validator::new()];
        let (pipeline, ledger, _) = setup(&[&vs[0], &vs[1]]).await;
        let claims = vec![
            signed_claim(&vs[0], subject(), 70),
            signed_claim(&vs[1], subject(), 75),
        ];

        let first = pipeline.run(subject(), &claims, 80).await.unwrap();
        let second = pipeline.run(subject(), &claims, 80).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.attestations().await.len(), 1);
        assert_eq!(pipeline.results_for(&subject()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_different_claim_set_gets_new_result() {
        let vs = [Validator::new(), Validator::new()];
        let (pipeline, ledger, _) = setup(&[&vs[0], &vs[1]]).await;

        let first = pipeline
            .run(subject(), &[signed_claim(&vs[0], subject(), 70)], 80)
            .await
            .unwrap();
        let second = pipeline
            .run(
                subject(),
                &[
                    signed_claim(&vs[0], subject(), 70),
                    signed_claim(&vs[1], subject(), 90),
                ],
                80,
            )
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(ledger.attestations().await.len(), 2);
        assert_eq!(pipeline.results_for(&subject()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_batch_publishes_nothing() {
        let vs = [Validator::new()];
        let (pipeline, ledger, store) = setup(&[&vs[0]]).await;
        let outsider = Validator::new();

        let err = pipeline
            .run(subject(), &[signed_claim(&outsider, subject(), 95)], 80)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Aggregation(AggregationError::UnauthorizedIssuer(_))
        ));
        assert!(ledger.attestations().await.is_empty());
        assert!(store.list_results().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_timeout_waits_on_pending_attestation() {
        let vs = [Validator::new(), Validator::new()];
        let (pipeline, ledger, store) = setup(&[&vs[0], &vs[1]]).await;
        let claims = vec![
            signed_claim(&vs[0], subject(), 90),
            signed_claim(&vs[1], subject(), 80),
        ];

        ledger.stall.store(true, Ordering::SeqCst);
        let err = pipeline.run(subject(), &claims, 80).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Ledger(LedgerError::ConfirmationTimeout { .. })
        ));
        assert_eq!(ledger.attestations().await.len(), 1);
        assert!(store.list_results().await.unwrap().is_empty());

        ledger.stall.store(false, Ordering::SeqCst);
        let result = pipeline.run(subject(), &claims, 80).await.unwrap();
        assert!(result.is_published());

        let attestations = ledger.attestations().await;
        assert_eq!(attestations.len(), 1);
        assert_eq!(
            result.confirmation.as_ref().map(|c| &c.tx_id),
            Some(&attestations[0].tx_id)
        );
        assert_eq!(store.pending_attestation(&result.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_attestation_is_submitted_again() {
        let vs = [Validator::new()];
        let (pipeline, ledger, store) = setup(&[&vs[0]]).await;
        let claims = vec![signed_claim(&vs[0], subject(), 90)];

        ledger.refuse.store(true, Ordering::SeqCst);
        let err = pipeline.run(subject(), &claims, 80).await.unwrap_err();
        assert!(matches!(err, PipelineError::Ledger(LedgerError::Submission(_))));

        ledger.refuse.store(false, Ordering::SeqCst);
        let result = pipeline.run(subject(), &claims, 80).await.unwrap();
        assert_eq!(ledger.attestations().await.len(), 2);
        assert_eq!(store.get_result(&result.id).await.unwrap(), Some(result));
    }

    #[tokio::test]
    async fn test_subject_lock_is_dropped_after_run() {
        let vs = [Validator::new()];
        let (pipeline, _, _) = setup(&[&vs[0]]).await;

        pipeline
            .run(subject(), &[signed_claim(&vs[0], subject(), 90)], 80)
            .await
            .unwrap();
        assert!(pipeline.subject_locks.lock().await.is_empty());

        let outsider = Validator::new();
        pipeline
            .run(subject(), &[signed_claim(&outsider, subject(), 90)], 80)
            .await
            .unwrap_err();
        assert!(pipeline.subject_locks.lock().await.is_empty());
    }

    fn hex_payload(mean: u8, decision: bool) -> String {
        let mut bytes = [0u8; 64];
        bytes[31] = mean;
        bytes[63] = u8::from(decision);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
