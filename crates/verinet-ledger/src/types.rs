// crates/verinet-ledger/src/types.rs

use serde::{Deserialize, Serialize};

use verinet_core::digest::{Address, SchemaId};

/// A transaction VeriNet asks the ledger to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerTx {
    /// Record an attestation under `schema`.
    Attest {
        schema: SchemaId,
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
    },
    /// Move `amount` wei from `from` (the reward pool) to `to`.
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    /// Mint `amount` wei to `to`.
    Mint { to: Address, amount: u128 },
}

/// Contract state reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "arg", rename_all = "snake_case")]
pub enum StateQuery {
    BalanceOf(Address),
    BlockHeight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    Amount(u128),
    Block(u64),
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
