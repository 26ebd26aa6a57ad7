// crates/verinet-ledger/src/local.rs
//
// LocalLedger: a single-process development ledger.
//
// Transactions execute at submission and are final immediately; each one gets
// its own block. When opened over a RocksStore the whole state is snapshotted
// under `ledger:state` after every transaction, so balances and attestations
// survive across CLI invocations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use verinet_core::crypto::hash_bytes;
use verinet_core::digest::{Address, SchemaId};
use verinet_core::ledger::{Confirmation, TxId};
use verinet_store::RocksStore;

use crate::error::LedgerError;
use crate::types::{LedgerTx, StateQuery, StateValue};
use crate::Ledger;

const STATE_KEY: &[u8] = b"ledger:state";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Receipt {
    block: u64,
    confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationEntry {
    pub schema: SchemaId,
    pub data: String,
    pub tx_id: TxId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    height: u64,
    balances: BTreeMap<Address, u128>,
    attestations: Vec<AttestationEntry>,
    receipts: HashMap<TxId, Receipt>,
}

impl LedgerState {
    fn balance(&self, who: &Address) -> u128 {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Execute `tx` as block `height + 1`.
    fn apply(&mut self, tx: &LedgerTx, tx_id: &TxId) -> Result<(), LedgerError> {
        match tx {
            LedgerTx::Attest { schema, data } => {
                self.attestations.push(AttestationEntry {
                    schema: *schema,
                    data: hex::encode(data),
                    tx_id: tx_id.clone(),
                });
            }
            LedgerTx::Transfer { from, to, amount } => {
                let available = self.balance(from);
                if available < *amount {
                    return Err(LedgerError::InsufficientFunds {
                        needed: *amount,
                        available,
                    });
                }
                self.balances.insert(*from, available - amount);
                let credited = self.balance(to).checked_add(*amount).ok_or_else(|| {
                    LedgerError::Submission(format!("Balance overflow for {}", to))
                })?;
                self.balances.insert(*to, credited);
            }
            LedgerTx::Mint { to, amount } => {
                let credited = self.balance(to).checked_add(*amount).ok_or_else(|| {
                    LedgerError::Submission(format!("Balance overflow for {}", to))
                })?;
                self.balances.insert(*to, credited);
            }
        }
        self.height += 1;
        self.receipts.insert(
            tx_id.clone(),
            Receipt {
                block: self.height,
                confirmed_at: Utc::now(),
            },
        );
        Ok(())
    }
}

pub struct LocalLedger {
    state: Mutex<LedgerState>,
    store: Option<Arc<RocksStore>>,
}

impl LocalLedger {
    /// A ledger that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            store: None,
        }
    }

    /// Load (or start) a ledger persisted in `store`.
    pub fn open(store: Arc<RocksStore>) -> Result<Self, LedgerError> {
        let state = match store.get_bytes(STATE_KEY).map_err(storage_err)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                LedgerError::Transport(format!("Corrupt local ledger snapshot: {}", e))
            })?,
            None => LedgerState::default(),
        };
        Ok(Self {
            state: Mutex::new(state),
            store: Some(store),
        })
    }

    /// Attestations recorded so far, oldest first.
    pub async fn attestations(&self) -> Vec<AttestationEntry> {
        self.state.lock().await.attestations.clone()
    }

    fn tx_id_for(height: u64, tx: &LedgerTx) -> Result<TxId, LedgerError> {
        let body = serde_json::to_vec(tx)
            .map_err(|e| LedgerError::Submission(format!("Unencodable transaction: {}", e)))?;
        let mut preimage = height.to_be_bytes().to_vec();
        preimage.extend_from_slice(&body);
        Ok(TxId(format!("0x{}", hex::encode(hash_bytes(&preimage)))))
    }

    fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        if let Some(store) = &self.store {
            let bytes = serde_json::to_vec(state)
                .map_err(|e| LedgerError::Submission(format!("Snapshot encoding failed: {}", e)))?;
            store.put_bytes(STATE_KEY, &bytes).map_err(storage_err)?;
        }
        Ok(())
    }
}

fn storage_err(e: verinet_core::error::VeriNetError) -> LedgerError {
    LedgerError::Transport(format!("Local ledger storage: {}", e))
}

#[async_trait]
impl Ledger for LocalLedger {
    async fn submit_transaction(&self, tx: &LedgerTx) -> Result<TxId, LedgerError> {
        let mut state = self.state.lock().await;
        let tx_id = Self::tx_id_for(state.height + 1, tx)?;

        // Execute against a copy so a rejected or unpersisted tx leaves no trace.
        let mut next = state.clone();
        next.apply(tx, &tx_id)?;
        self.persist(&next)?;
        *state = next;

        tracing::debug!("Local ledger executed {} at height {}", tx_id, state.height);
        Ok(tx_id)
    }

    async fn wait_for_confirmation(&self, tx: &TxId) -> Result<Confirmation, LedgerError> {
        let state = self.state.lock().await;
        let receipt = state
            .receipts
            .get(tx)
            .ok_or_else(|| LedgerError::Submission(format!("Unknown transaction {}", tx)))?;
        Ok(Confirmation {
            tx_id: tx.clone(),
            block: receipt.block,
            confirmed_at: receipt.confirmed_at,
        })
    }

    async fn read_contract_state(&self, query: &StateQuery) -> Result<StateValue, LedgerError> {
        let state = self.state.lock().await;
        Ok(match query {
            StateQuery::BalanceOf(who) => StateValue::Amount(state.balance(who)),
            StateQuery::BlockHeight => StateValue::Block(state.height),
        })
    }
}
