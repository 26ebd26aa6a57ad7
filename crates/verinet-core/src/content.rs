// crates/verinet-core/src/content.rs
//
// Content claims: a provider's signed registration of a content hash, made
// before validators are asked to judge it.
//
// Canonical signing layout (big-endian integers, fixed order, 110 bytes):
//
//   version:u8 | subject:[32] | issuer:[20] | time:u64 | expiration:u64 |
//   revocable:u8 | schema:[32] | nonce:u64
//
// The wire form appends signer_key:[32] | signature:[64]. Content claims are
// signed under their own schema, separate from accuracy claims.

use serde::{Deserialize, Serialize};

use crate::claim::{
    check_issuer, decode_hex_array, issue_window, ClaimError, ClaimOptions, ClaimSigner, Reader,
};
use crate::crypto;
use crate::digest::{Address, ClaimRef, SchemaId, SubjectId};
use crate::traits::KeySigner;

pub const CONTENT_CLAIM_VERSION: u8 = 1;

pub const CONTENT_SIGNING_BYTES_LEN: usize = 1 + 32 + 20 + 8 + 8 + 1 + 32 + 8;

pub const CONTENT_WIRE_LEN: usize = CONTENT_SIGNING_BYTES_LEN + 32 + 64;

/// A provider's signed statement that it submitted the content hashing to `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ContentClaimDocument", try_from = "ContentClaimDocument")]
pub struct ContentClaim {
    pub subject: SubjectId,
    pub issuer: Address,
    pub issued_at: u64,
    /// 0 = never.
    pub expiration: u64,
    pub revocable: bool,
    pub schema: SchemaId,
    pub nonce: u64,
    pub signer_key: [u8; 32],
    pub signature: [u8; 64],
}

impl ContentClaim {
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONTENT_SIGNING_BYTES_LEN);
        out.push(CONTENT_CLAIM_VERSION);
        out.extend_from_slice(self.subject.as_bytes());
        out.extend_from_slice(self.issuer.as_bytes());
        out.extend_from_slice(&self.issued_at.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.push(u8::from(self.revocable));
        out.extend_from_slice(self.schema.as_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.signing_bytes();
        out.extend_from_slice(&self.signer_key);
        out.extend_from_slice(&self.signature);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClaimError> {
        if bytes.len() != CONTENT_WIRE_LEN {
            return Err(ClaimError::Malformed(format!(
                "expected {} bytes, got {}",
                CONTENT_WIRE_LEN,
                bytes.len()
            )));
        }

        let mut r = Reader { buf: bytes, pos: 0 };
        let version = r.byte();
        if version != CONTENT_CLAIM_VERSION {
            return Err(ClaimError::Malformed(format!(
                "unsupported content claim version {}",
                version
            )));
        }
        let subject = SubjectId(r.array());
        let issuer = Address(r.array());
        let issued_at = u64::from_be_bytes(r.array());
        let expiration = u64::from_be_bytes(r.array());
        let revocable = match r.byte() {
            0 => false,
            1 => true,
            other => {
                return Err(ClaimError::Malformed(format!(
                    "revocable flag must be 0 or 1, got {}",
                    other
                )))
            }
        };

        Ok(ContentClaim {
            subject,
            issuer,
            issued_at,
            expiration,
            revocable,
            schema: SchemaId(r.array()),
            nonce: u64::from_be_bytes(r.array()),
            signer_key: r.array(),
            signature: r.array(),
        })
    }

    pub fn uid(&self) -> ClaimRef {
        ClaimRef(crypto::hash_bytes(&self.signing_bytes()))
    }

    /// Check the signature and that `issuer` is the signing key's address.
    pub fn verify(&self) -> bool {
        if Address::from_public_key(&self.signer_key) != self.issuer {
            return false;
        }
        crypto::verify_signature(&self.signer_key, &self.signing_bytes(), &self.signature)
            .unwrap_or(false)
    }
}

impl ClaimSigner {
    /// Sign a content claim for `subject` under this signer's schema.
    ///
    /// Shares the nonce sequence with accuracy claims from the same signer.
    /// `opts.ref_claim` does not apply to content claims and is ignored.
    pub fn sign_content<K: KeySigner + ?Sized>(
        &self,
        subject: SubjectId,
        issuer: Address,
        key: &K,
        opts: ClaimOptions,
    ) -> Result<ContentClaim, ClaimError> {
        check_issuer(key, issuer)?;
        let (issued_at, expiration) = issue_window(&opts);

        let mut claim = ContentClaim {
            subject,
            issuer,
            issued_at,
            expiration,
            revocable: opts.revocable,
            schema: self.schema(),
            nonce: self.assign_nonce(opts.nonce),
            signer_key: key.public_key(),
            signature: [0u8; 64],
        };
        claim.signature = key
            .sign(&claim.signing_bytes())
            .map_err(|e| ClaimError::SigningFailure(e.to_string()))?;
        Ok(claim)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentClaimDocument {
    pub uid: ClaimRef,
    pub version: u8,
    pub message: ContentMessage,
    pub signer_key: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMessage {
    /// The registered content hash.
    pub hash: SubjectId,
    pub issuer: Address,
    pub time: u64,
    pub expiration_time: u64,
    pub revocable: bool,
    pub nonce: u64,
    pub schema: SchemaId,
}

impl From<ContentClaim> for ContentClaimDocument {
    fn from(claim: ContentClaim) -> Self {
        ContentClaimDocument {
            uid: claim.uid(),
            version: CONTENT_CLAIM_VERSION,
            message: ContentMessage {
                hash: claim.subject,
                issuer: claim.issuer,
                time: claim.issued_at,
                expiration_time: claim.expiration,
                revocable: claim.revocable,
                nonce: claim.nonce,
                schema: claim.schema,
            },
            signer_key: hex::encode(claim.signer_key),
            signature: hex::encode(claim.signature),
        }
    }
}

impl TryFrom<ContentClaimDocument> for ContentClaim {
    type Error = ClaimError;

    fn try_from(doc: ContentClaimDocument) -> Result<Self, Self::Error> {
        if doc.version != CONTENT_CLAIM_VERSION {
            return Err(ClaimError::Malformed(format!(
                "unsupported content claim version {}",
                doc.version
            )));
        }
        let m = doc.message;
        let claim = ContentClaim {
            subject: m.hash,
            issuer: m.issuer,
            issued_at: m.time,
            expiration: m.expiration_time,
            revocable: m.revocable,
            schema: m.schema,
            nonce: m.nonce,
            signer_key: decode_hex_array(&doc.signer_key, "signerKey")?,
            signature: decode_hex_array(&doc.signature, "signature")?,
        };
        if claim.uid() != doc.uid {
            return Err(ClaimError::Malformed(
                "uid does not match claim contents".to_string(),
            ));
        }
        Ok(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::Claim;
    use crate::crypto::Keypair;

    const HASH_SCHEMA: SchemaId = SchemaId([0x03; 32]);

    fn register(key: &Keypair) -> ContentClaim {
        ClaimSigner::new(HASH_SCHEMA)
            .sign_content(
                SubjectId::from_content(b"provider article body"),
                key.address(),
                key,
                ClaimOptions::default(),
            )
            .unwrap()
    }

    #[test]
    fn test_sign_then_verify() {
        let provider = Keypair::generate();
        let claim = register(&provider);
        assert!(claim.verify());
        assert_eq!(claim.schema, HASH_SCHEMA);
        assert_eq!(claim.subject, SubjectId::from_content(b"provider article body"));
        assert_eq!(claim.signing_bytes().len(), CONTENT_SIGNING_BYTES_LEN);
    }

    #[test]
    fn test_tampered_hash_or_schema_fails_verification() {
        let provider = Keypair::generate();
        let claim = register(&provider);

        let mut tampered = claim.clone();
        tampered.subject = SubjectId::from_content(b"different body");
        assert!(!tampered.verify());

        let mut tampered = claim;
        tampered.schema = SchemaId([0x01; 32]);
        assert!(!tampered.verify());
    }

    #[test]
    fn test_issuer_must_match_signer() {
        let provider = Keypair::generate();
        let other = Keypair::generate();

        let err = ClaimSigner::new(HASH_SCHEMA)
            .sign_content(
                SubjectId::from_content(b"x"),
                other.address(),
                &provider,
                ClaimOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ClaimError::SigningFailure(_)));

        let mut claim = register(&provider);
        claim.signer_key = other.public_key_bytes();
        claim.signature = KeySigner::sign(&other, &claim.signing_bytes()).unwrap();
        assert!(!claim.verify());
    }

    #[test]
    fn test_wire_and_json_forms_decode_to_same_claim() {
        let provider = Keypair::generate();
        let claim = register(&provider);

        let bytes = claim.to_bytes();
        assert_eq!(bytes.len(), CONTENT_WIRE_LEN);
        assert_eq!(ContentClaim::from_bytes(&bytes).unwrap(), claim);
        assert!(ContentClaim::from_bytes(&bytes[1..]).is_err());
        // An accuracy claim is never mistaken for a content claim.
        assert!(Claim::from_bytes(&bytes).is_err());

        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["message"]["hash"], serde_json::json!(claim.subject.to_string()));
        let back: ContentClaim = serde_json::from_value(json).unwrap();
        assert_eq!(back, claim);

        let mut doc = ContentClaimDocument::from(claim);
        doc.message.nonce += 1;
        assert!(ContentClaim::try_from(doc).is_err());
    }

    #[test]
    fn test_shares_nonce_sequence_with_accuracy_claims() {
        let key = Keypair::generate();
        let signer = ClaimSigner::with_starting_nonce(HASH_SCHEMA, 4);
        let content = signer
            .sign_content(SubjectId([1; 32]), key.address(), &key, ClaimOptions::default())
            .unwrap();
        let accuracy = signer
            .sign(SubjectId([1; 32]), 80, key.address(), &key, ClaimOptions::default())
            .unwrap();
        assert_eq!(content.nonce, 4);
        assert_eq!(accuracy.nonce, 5);
    }
}
