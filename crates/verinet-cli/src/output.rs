// crates/verinet-cli/src/output.rs
//
// Output formatting utilities for the VeriNet CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use verinet_core::aggregation::AggregationResult;
use verinet_core::participant::Participant;
use verinet_core::reward::RewardRecord;
use verinet_economics::Vnt;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print `items` as a table, or the raw values as JSON.
pub fn print_rows<T, R>(format: OutputFormat, items: &[T], row: impl Fn(&T) -> R)
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Json => println!("{}", format_json(&items)),
        OutputFormat::Table => {
            let rows: Vec<R> = items.iter().map(row).collect();
            println!("{}", format_table(&rows));
        }
    }
}

#[derive(Tabled)]
pub struct ParticipantRow {
    #[tabled(rename = "Address")]
    pub address: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Active")]
    pub active: bool,
    #[tabled(rename = "Registered")]
    pub registered_at: String,
}

impl From<&Participant> for ParticipantRow {
    fn from(p: &Participant) -> Self {
        Self {
            address: p.address.to_string(),
            role: p.role.to_string(),
            active: p.active,
            registered_at: p.registered_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct ResultRow {
    #[tabled(rename = "Result")]
    pub id: String,
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Mean")]
    pub mean: u8,
    #[tabled(rename = "Threshold")]
    pub threshold: u8,
    #[tabled(rename = "Decision")]
    pub decision: String,
    #[tabled(rename = "Claims")]
    pub claims: usize,
    #[tabled(rename = "Tx")]
    pub tx: String,
}

impl From<&AggregationResult> for ResultRow {
    fn from(r: &AggregationResult) -> Self {
        Self {
            id: r.id.to_string(),
            subject: r.subject.to_string(),
            mean: r.mean_accuracy,
            threshold: r.threshold,
            decision: if r.decision { "accept" } else { "reject" }.to_string(),
            claims: r.claims.len(),
            tx: r
                .confirmation
                .as_ref()
                .map(|c| c.tx_id.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct RewardRow {
    #[tabled(rename = "Validator")]
    pub validator: String,
    #[tabled(rename = "Tier")]
    pub tier: u8,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Result")]
    pub result: String,
    #[tabled(rename = "Tx")]
    pub tx: String,
}

impl From<&RewardRecord> for RewardRow {
    fn from(r: &RewardRecord) -> Self {
        Self {
            validator: r.validator.to_string(),
            tier: r.tier,
            amount: Vnt::from_wei(r.amount).to_string(),
            result: r.result.to_string(),
            tx: r.confirmation.tx_id.to_string(),
        }
    }
}
