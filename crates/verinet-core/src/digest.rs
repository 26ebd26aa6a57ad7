// crates/verinet-core/src/digest.rs
//
// Fixed-width identifiers: 20-byte addresses and 32-byte content hashes.
//
// All of them render as lowercase `0x`-prefixed hex and parse hex
// case-insensitively, with or without the prefix. Serde goes through the
// string form so archived JSON stays human-readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::VeriNetError;

fn parse_fixed<const N: usize>(s: &str, what: &str) -> Result<[u8; N], VeriNetError> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(body)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        VeriNetError::Serialization(format!(
            "{} must be {} bytes, got {}",
            what,
            N,
            v.len()
        ))
    })
}

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// The all-zero value.
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = VeriNetError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed::<32>(s, $what).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = VeriNetError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }
    };
}

hash_id!(
    /// Content-addressed identifier of the item being judged.
    SubjectId,
    "subject id"
);
hash_id!(
    /// Identifier of a registered claim schema.
    SchemaId,
    "schema id"
);
hash_id!(
    /// Content-derived reference to a signed claim (SHA-256 of its signing bytes).
    ClaimRef,
    "claim ref"
);
hash_id!(
    /// Content-derived reference to an aggregation result.
    ResultRef,
    "result ref"
);

impl SubjectId {
    /// Derive a subject id by hashing the raw content.
    pub fn from_content(content: &[u8]) -> Self {
        Self(crypto::hash_bytes(content))
    }
}

/// A 20-byte participant address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    /// Derive the address controlled by an ed25519 public key: the last 20
    /// bytes of SHA-256(public key).
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let hash = crypto::hash_bytes(public_key);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = VeriNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed::<20>(s, "address").map(Self)
    }
}

impl TryFrom<String> for Address {
    type Error = VeriNetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_is_case_insensitive() {
        let lower: Address = "0xabcdef0123456789abcdef0123456789abcdef01".parse().unwrap();
        let upper: Address = "0XABCDEF0123456789ABCDEF0123456789ABCDEF01".parse().unwrap();
        let bare: Address = "AbCdEf0123456789aBcDeF0123456789AbCdEf01".parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, bare);
        assert_eq!(
            upper.to_string(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_address_wrong_length_rejected() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_from_public_key_is_stable() {
        let a = Address::from_public_key(&[7u8; 32]);
        let b = Address::from_public_key(&[7u8; 32]);
        let c = Address::from_public_key(&[8u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_id_serde_as_hex_string() {
        let subject = SubjectId::from_content(b"article body");
        let json = serde_json::to_string(&subject).unwrap();
        assert!(json.starts_with("\"0x"));
        let back: SubjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, subject);
    }

    #[test]
    fn test_zero_ids() {
        assert!(ClaimRef::ZERO.is_zero());
        assert!(!SubjectId::from_content(b"x").is_zero());
    }
}
