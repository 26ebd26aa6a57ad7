// crates/verinet-cli/src/context.rs
//
// Wires validated settings into the store, ledger and components a command
// needs. Each command opens one Context; all of them share the RocksDB
// database under the configured data directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use verinet_consensus::{
    Aggregator, AttestationPipeline, Authority, ParticipantRegistry, RevocationList,
};
use verinet_core::crypto::Keypair;
use verinet_core::digest::Address;
use verinet_core::error::VeriNetError;
use verinet_core::traits::Archive;
use verinet_economics::RewardEngine;
use verinet_ledger::{JsonRpcLedger, Ledger, LedgerPublisher, LocalLedger};
use verinet_store::{IpfsClient, RocksStore};

use crate::config::{LedgerEndpoint, Settings};
use crate::output::OutputFormat;

pub struct Context {
    pub settings: Settings,
    pub format: OutputFormat,
    pub store: Arc<RocksStore>,
    pub publisher: Arc<LedgerPublisher>,
    pub registry: Arc<ParticipantRegistry>,
    pub archive: Option<Arc<dyn Archive>>,
    authority: Arc<dyn Authority>,
}

impl Context {
    pub async fn open(settings: Settings, format: OutputFormat) -> Result<Self, VeriNetError> {
        fs::create_dir_all(&settings.data_dir).map_err(|e| {
            VeriNetError::Storage(format!(
                "cannot create data directory {}: {}",
                settings.data_dir.display(),
                e
            ))
        })?;
        let db_path = settings.data_dir.join("verinet_rocksdb");
        let store = Arc::new(RocksStore::open(&db_path.to_string_lossy())?);
        tracing::debug!("Opened store at {}", db_path.display());

        let ledger: Arc<dyn Ledger> = match &settings.ledger {
            LedgerEndpoint::Local => Arc::new(LocalLedger::open(store.clone())?),
            LedgerEndpoint::JsonRpc(url) => {
                Arc::new(JsonRpcLedger::new(url, settings.poll_interval))
            }
        };
        let publisher = Arc::new(LedgerPublisher::new(ledger, settings.publisher.clone()));

        let authority: Arc<dyn Authority> = Arc::new(settings.authority.clone());
        let registry = Arc::new(ParticipantRegistry::load(authority.clone(), store.clone()).await?);

        let archive = settings
            .ipfs_api_url
            .as_deref()
            .map(|url| Arc::new(IpfsClient::new(url)) as Arc<dyn Archive>);

        Ok(Self {
            settings,
            format,
            store,
            publisher,
            registry,
            archive,
            authority,
        })
    }

    /// The operator key named by `signing_key_path`.
    pub fn load_key(&self) -> Result<Keypair, VeriNetError> {
        read_key_file(&self.settings.signing_key_path)
    }

    pub fn revocations(&self) -> RevocationList {
        RevocationList::new(self.store.clone())
    }

    pub fn pipeline(&self) -> AttestationPipeline {
        let aggregator = Aggregator::new(
            self.registry.clone(),
            self.revocations(),
            self.settings.accuracy_schema,
        );
        let pipeline = AttestationPipeline::new(
            aggregator,
            self.publisher.clone(),
            self.store.clone(),
            self.settings.aggregated_schema,
        );
        match &self.archive {
            Some(archive) => pipeline.with_archive(archive.clone()),
            None => pipeline,
        }
    }

    pub fn reward_engine(&self) -> RewardEngine {
        RewardEngine::new(
            self.settings.tier_table.clone(),
            self.store.clone(),
            self.publisher.clone(),
            self.authority.clone(),
        )
    }

    /// Next unused claim nonce for `issuer`.
    pub fn next_nonce(&self, issuer: &Address) -> Result<u64, VeriNetError> {
        match self.store.get_bytes(nonce_key(issuer).as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    VeriNetError::Storage(format!("corrupt nonce record for {}", issuer))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    /// Record that `nonce` has been used by `issuer`.
    pub fn record_nonce(&self, issuer: &Address, nonce: u64) -> Result<(), VeriNetError> {
        let next = nonce.saturating_add(1).max(self.next_nonce(issuer)?);
        self.store
            .put_bytes(nonce_key(issuer).as_bytes(), &next.to_be_bytes())
    }
}

fn nonce_key(issuer: &Address) -> String {
    format!("nonce:{}", issuer)
}

/// Read a hex-encoded ed25519 seed.
pub fn read_key_file(path: &Path) -> Result<Keypair, VeriNetError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VeriNetError::Configuration(format!(
            "cannot read signing key {}: {} (create one with `verinet wallet create`)",
            path.display(),
            e
        ))
    })?;
    Keypair::from_hex(&contents)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::config::VeriNetConfig;

    /// Open a Context over a fresh temp directory with `admin` as the only admin
    /// and operator key. The caller removes the returned directory.
    pub async fn open_context(admin: &Keypair) -> (Context, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("verinet-cli-test-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        let key_path = dir.join("admin.key");
        fs::write(&key_path, admin.secret_hex()).unwrap();

        let toml = format!(
            r#"
            data_dir = "{data}"
            ledger_endpoint = "local"
            signing_key_path = "{key}"
            admin_addresses = ["{admin}"]
            accuracy_schema_id = "0x{acc}"
            aggregated_schema_id = "0x{agg}"
            hash_schema_id = "0x{hash}"
            reward_tiers = ["5", "10", "25", "50"]
            "#,
            data = dir.join("data").display(),
            key = key_path.display(),
            admin = admin.address(),
            acc = "01".repeat(32),
            agg = "02".repeat(32),
            hash = "03".repeat(32),
        );
        let settings = VeriNetConfig::parse(&toml).unwrap().validate().unwrap();
        let ctx = Context::open(settings, OutputFormat::Table).await.unwrap();
        (ctx, dir)
    }
}
