// crates/verinet-ledger/src/jsonrpc.rs
//
// JSON-RPC 2.0 client for a remote VeriNet ledger node.
//
// Methods:
//   - `verinet_submitTransaction [tx]`   -> "0x…" transaction id
//   - `verinet_getReceipt [txId]`        -> null while pending, else
//                                           {"block": n, "status": "success"|"reverted", "reason"?}
//   - `verinet_readState [query]`        -> StateValue
//
// A rejected transfer is reported as error code -32010 with
// `data: {"needed": n, "available": n}`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use verinet_core::ledger::{Confirmation, TxId};

use crate::error::LedgerError;
use crate::types::{LedgerTx, StateQuery, StateValue};
use crate::Ledger;

pub const INSUFFICIENT_FUNDS_CODE: i64 = -32010;

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    block: u64,
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Shortfall {
    needed: u128,
    available: u128,
}

#[derive(Debug)]
pub struct JsonRpcLedger {
    endpoint: String,
    poll_interval: Duration,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    pub fn new(endpoint: &str, poll_interval: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            poll_interval,
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{} failed ({}): {}",
                method, status, body
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Transport(format!("{} returned malformed JSON: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(map_rpc_error(error));
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null)).map_err(|e| {
            LedgerError::Transport(format!("{} returned unexpected result: {}", method, e))
        })
    }
}

fn map_rpc_error(error: RpcError) -> LedgerError {
    if error.code == INSUFFICIENT_FUNDS_CODE {
        if let Some(shortfall) = error
            .data
            .and_then(|d| serde_json::from_value::<Shortfall>(d).ok())
        {
            return LedgerError::InsufficientFunds {
                needed: shortfall.needed,
                available: shortfall.available,
            };
        }
    }
    LedgerError::Submission(format!("{} (code {})", error.message, error.code))
}

#[async_trait]
impl Ledger for JsonRpcLedger {
    async fn submit_transaction(&self, tx: &LedgerTx) -> Result<TxId, LedgerError> {
        let id: String = self.call("verinet_submitTransaction", json!([tx])).await?;
        Ok(TxId(id))
    }

    async fn wait_for_confirmation(&self, tx: &TxId) -> Result<Confirmation, LedgerError> {
        loop {
            let receipt: Option<Receipt> = self.call("verinet_getReceipt", json!([tx])).await?;
            match receipt {
                Some(r) if r.status == "success" => {
                    return Ok(Confirmation {
                        tx_id: tx.clone(),
                        block: r.block,
                        confirmed_at: Utc::now(),
                    });
                }
                Some(r) => {
                    return Err(LedgerError::Submission(format!(
                        "Transaction {} {} in block {}: {}",
                        tx,
                        r.status,
                        r.block,
                        r.reason.unwrap_or_default()
                    )));
                }
                None => {
                    tracing::debug!("Transaction {} pending, polling again", tx);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn read_contract_state(&self, query: &StateQuery) -> Result<StateValue, LedgerError> {
        self.call("verinet_readState", json!([query])).await
    }
}
