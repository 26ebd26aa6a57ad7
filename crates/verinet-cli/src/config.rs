// crates/verinet-cli/src/config.rs
//
// Configuration for the `verinet` command.
// Loaded from a flat TOML file and validated before any ledger or signing
// call is made. Validation turns the raw strings into one typed settings
// struct per component.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use verinet_consensus::StaticAuthority;
use verinet_core::digest::{Address, SchemaId};
use verinet_core::error::VeriNetError;
use verinet_economics::{RewardTierTable, TierPolicy};
use verinet_ledger::publisher::default_reward_pool;
use verinet_ledger::PublisherConfig;

/// Raw configuration as written in the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct VeriNetConfig {
    /// Directory for local data (RocksDB, local ledger).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log level used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `local` for the development ledger, or an http(s) JSON-RPC endpoint.
    #[serde(default)]
    pub ledger_endpoint: Option<String>,

    /// Hex-encoded ed25519 seed of the operator's key.
    #[serde(default)]
    pub signing_key_path: Option<String>,

    /// Addresses holding the admin role.
    #[serde(default)]
    pub admin_addresses: Vec<String>,

    /// Schema of individual accuracy claims.
    #[serde(default)]
    pub accuracy_schema_id: Option<String>,

    /// Schema of aggregated attestations.
    #[serde(default)]
    pub aggregated_schema_id: Option<String>,

    /// Schema of provider content-hash claims. Content registration is off when unset.
    #[serde(default)]
    pub hash_schema_id: Option<String>,

    /// Reward per tier in VNT (index = tier), e.g. `["5", "10", "25", "50"]`.
    #[serde(default)]
    pub reward_tiers: Vec<String>,

    /// Ascending accuracy cut-offs for tier assignment.
    #[serde(default = "default_tier_cutoffs")]
    pub tier_cutoffs: Vec<u8>,

    #[serde(default = "default_threshold")]
    pub default_threshold: u8,

    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Reward pool account; a fixed derived address when unset.
    #[serde(default)]
    pub reward_pool_address: Option<String>,

    /// IPFS API for claim and result archival. Archival is off when unset.
    #[serde(default)]
    pub ipfs_api_url: Option<String>,
}

fn default_data_dir() -> String {
    "~/.verinet/data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tier_cutoffs() -> Vec<u8> {
    vec![50, 75, 90]
}

fn default_threshold() -> u8 {
    85
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl VeriNetConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, VeriNetError> {
        let path = expand_tilde(path);
        let contents = fs::read_to_string(&path).map_err(|e| {
            VeriNetError::Configuration(format!("cannot read {}: {}", path, e))
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, VeriNetError> {
        toml::from_str(contents).map_err(|e| VeriNetError::Configuration(e.to_string()))
    }

    /// Check every required key and build typed settings.
    ///
    /// All problems are reported together in one `Configuration` error.
    pub fn validate(&self) -> Result<Settings, VeriNetError> {
        let mut problems: Vec<String> = Vec::new();

        let ledger = match self.ledger_endpoint.as_deref().map(str::trim) {
            None | Some("") => {
                problems.push("ledger_endpoint is missing".to_string());
                None
            }
            Some("local") => Some(LedgerEndpoint::Local),
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Some(LedgerEndpoint::JsonRpc(url.to_string()))
            }
            Some(other) => {
                problems.push(format!(
                    "ledger_endpoint '{}' must be 'local' or an http(s) URL",
                    other
                ));
                None
            }
        };

        let signing_key_path = match self.signing_key_path.as_deref() {
            None | Some("") => {
                problems.push("signing_key_path is missing".to_string());
                None
            }
            Some(p) => Some(PathBuf::from(expand_tilde(p))),
        };

        let authority = if self.admin_addresses.is_empty() {
            problems.push("admin_addresses is empty".to_string());
            None
        } else {
            match StaticAuthority::from_hex(&self.admin_addresses) {
                Ok(a) => Some(a),
                Err(e) => {
                    problems.push(e.to_string());
                    None
                }
            }
        };

        let accuracy_schema = required_schema(
            "accuracy_schema_id",
            self.accuracy_schema_id.as_deref(),
            &mut problems,
        );
        let aggregated_schema = required_schema(
            "aggregated_schema_id",
            self.aggregated_schema_id.as_deref(),
            &mut problems,
        );

        let hash_schema = match self.hash_schema_id.as_deref() {
            None | Some("") => None,
            Some(s) => match s.parse::<SchemaId>() {
                Ok(id) if Some(id) == accuracy_schema => {
                    problems.push("hash_schema_id must differ from accuracy_schema_id".to_string());
                    None
                }
                Ok(id) => Some(id),
                Err(e) => {
                    problems.push(format!("hash_schema_id: {}", e));
                    None
                }
            },
        };

        let tier_table = if self.reward_tiers.is_empty() {
            problems.push("reward_tiers is empty".to_string());
            None
        } else {
            match RewardTierTable::from_token_amounts(&self.reward_tiers) {
                Ok(t) => Some(t),
                Err(e) => {
                    problems.push(e.to_string());
                    None
                }
            }
        };

        let tier_policy = match TierPolicy::new(self.tier_cutoffs.clone()) {
            Ok(p) => Some(p),
            Err(e) => {
                problems.push(e.to_string());
                None
            }
        };
        if let (Some(table), Some(policy)) = (&tier_table, &tier_policy) {
            if !table.covers(policy) {
                problems.push(format!(
                    "tier_cutoffs produce tiers 0..={} but reward_tiers has {} entries",
                    policy.max_tier(),
                    table.len()
                ));
            }
        }

        if self.default_threshold > 100 {
            problems.push(format!(
                "default_threshold {} is outside 0..=100",
                self.default_threshold
            ));
        }
        if self.confirmation_timeout_secs == 0 {
            problems.push("confirmation_timeout_secs must be positive".to_string());
        }

        let reward_pool = match self.reward_pool_address.as_deref() {
            None => Some(default_reward_pool()),
            Some(s) => match s.parse::<Address>() {
                Ok(a) => Some(a),
                Err(e) => {
                    problems.push(format!("reward_pool_address: {}", e));
                    None
                }
            },
        };

        match (
            ledger,
            signing_key_path,
            authority,
            accuracy_schema,
            aggregated_schema,
            tier_table,
            tier_policy,
            reward_pool,
        ) {
            (
                Some(ledger),
                Some(signing_key_path),
                Some(authority),
                Some(accuracy_schema),
                Some(aggregated_schema),
                Some(tier_table),
                Some(tier_policy),
                Some(reward_pool),
            ) if problems.is_empty() => Ok(Settings {
                data_dir: PathBuf::from(expand_tilde(&self.data_dir)),
                ledger,
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                signing_key_path,
                authority,
                accuracy_schema,
                aggregated_schema,
                hash_schema,
                tier_table,
                tier_policy,
                default_threshold: self.default_threshold,
                publisher: PublisherConfig {
                    confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
                    reward_pool,
                },
                ipfs_api_url: self.ipfs_api_url.clone().filter(|u| !u.is_empty()),
            }),
            _ => Err(VeriNetError::Configuration(problems.join("; "))),
        }
    }
}

fn required_schema(
    key: &str,
    value: Option<&str>,
    problems: &mut Vec<String>,
) -> Option<SchemaId> {
    match value {
        None | Some("") => {
            problems.push(format!("{} is missing", key));
            None
        }
        Some(s) => match s.parse::<SchemaId>() {
            Ok(id) => Some(id),
            Err(e) => {
                problems.push(format!("{}: {}", key, e));
                None
            }
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEndpoint {
    Local,
    JsonRpc(String),
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub ledger: LedgerEndpoint,
    pub poll_interval: Duration,
    pub signing_key_path: PathBuf,
    pub authority: StaticAuthority,
    pub accuracy_schema: SchemaId,
    pub aggregated_schema: SchemaId,
    pub hash_schema: Option<SchemaId>,
    pub tier_table: RewardTierTable,
    pub tier_policy: TierPolicy,
    pub default_threshold: u8,
    pub publisher: PublisherConfig,
    pub ipfs_api_url: Option<String>,
}

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).display().to_string();
        }
    }
    path.to_string()
}
