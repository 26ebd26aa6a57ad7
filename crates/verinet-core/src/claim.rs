// crates/verinet-core/src/claim.rs
//
// Validator claims: construction, canonical encoding, signing, verification.
//
// Canonical signing layout (big-endian integers, fixed order, 143 bytes):
//
//   version:u8 | subject:[32] | accuracy:u8 | issuer:[20] | time:u64 |
//   expiration:u64 | revocable:u8 | schema:[32] | nonce:u64 | ref_claim:[32]
//
// The wire form appends signer_key:[32] | signature:[64]. A zero ref_claim
// means "no prior claim"; a zero expiration means "never expires".

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto;
use crate::digest::{Address, ClaimRef, SchemaId, SubjectId};
use crate::error::VeriNetError;
use crate::traits::KeySigner;

/// Encoding version written as the first byte of every claim.
pub const CLAIM_VERSION: u8 = 1;

/// Highest accuracy a claim may carry.
pub const MAX_ACCURACY: u8 = 100;

/// Length of the signed portion of the canonical encoding.
pub const SIGNING_BYTES_LEN: usize = 1 + 32 + 1 + 20 + 8 + 8 + 1 + 32 + 8 + 32;

/// Length of the full wire encoding (signed portion + signer key + signature).
pub const WIRE_LEN: usize = SIGNING_BYTES_LEN + 32 + 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("accuracy {0} is outside 0..=100")]
    InvalidAccuracy(i64),

    #[error("signing failed: {0}")]
    SigningFailure(String),

    #[error("malformed claim: {0}")]
    Malformed(String),
}

impl From<ClaimError> for VeriNetError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::SigningFailure(msg) => VeriNetError::Crypto(msg),
            other => VeriNetError::Validation(other.to_string()),
        }
    }
}

/// Per-claim options supplied by the signing validator.
#[derive(Debug, Clone)]
pub struct ClaimOptions {
    /// Lifetime of the claim, `None` for a claim that never expires.
    pub expiration: Option<Duration>,
    pub revocable: bool,
    /// Explicit nonce. When `None` the signer assigns the next one.
    pub nonce: Option<u64>,
    /// Prior claim this one refines or supersedes.
    pub ref_claim: Option<ClaimRef>,
    /// Issuance time override; defaults to now.
    pub issued_at: Option<DateTime<Utc>>,
}

impl Default for ClaimOptions {
    fn default() -> Self {
        Self {
            expiration: None,
            revocable: true,
            nonce: None,
            ref_claim: None,
            issued_at: None,
        }
    }
}

/// One validator's signed judgment about one content subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ClaimDocument", try_from = "ClaimDocument")]
pub struct Claim {
    pub subject: SubjectId,
    /// Claimed accuracy, 0..=100.
    pub accuracy: u8,
    pub issuer: Address,
    /// Issuance time, unix seconds.
    pub issued_at: u64,
    /// Expiration time, unix seconds. 0 = never.
    pub expiration: u64,
    pub revocable: bool,
    pub schema: SchemaId,
    pub nonce: u64,
    pub ref_claim: Option<ClaimRef>,
    /// Public key of the signer; its derived address must equal `issuer`.
    pub signer_key: [u8; 32],
    pub signature: [u8; 64],
}

impl Claim {
    /// The canonical bytes covered by the signature.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIGNING_BYTES_LEN);
        out.push(CLAIM_VERSION);
        out.extend_from_slice(self.subject.as_bytes());
        out.push(self.accuracy);
        out.extend_from_slice(self.issuer.as_bytes());
        out.extend_from_slice(&self.issued_at.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.push(u8::from(self.revocable));
        out.extend_from_slice(self.schema.as_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(self.ref_claim.unwrap_or(ClaimRef::ZERO).as_bytes());
        out
    }

    /// Full wire encoding: signing bytes, signer key, signature.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.signing_bytes();
        out.extend_from_slice(&self.signer_key);
        out.extend_from_slice(&self.signature);
        out
    }

    /// Decode the wire encoding produced by [`Claim::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClaimError> {
        if bytes.len() != WIRE_LEN {
            return Err(ClaimError::Malformed(format!(
                "expected {} bytes, got {}",
                WIRE_LEN,
                bytes.len()
            )));
        }

        let mut r = Reader { buf: bytes, pos: 0 };
        let version = r.byte();
        if version != CLAIM_VERSION {
            return Err(ClaimError::Malformed(format!(
                "unsupported claim version {}",
                version
            )));
        }

        let subject = SubjectId(r.array());
        let accuracy = r.byte();
        if accuracy > MAX_ACCURACY {
            return Err(ClaimError::InvalidAccuracy(i64::from(accuracy)));
        }
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
        let schema = SchemaId(r.array());
        let nonce = u64::from_be_bytes(r.array());
        let ref_claim = ClaimRef(r.array());
        let signer_key = r.array();
        let signature = r.array();

        Ok(Claim {
            subject,
            accuracy,
            issuer,
            issued_at,
            expiration,
            revocable,
            schema,
            nonce,
            ref_claim: (!ref_claim.is_zero()).then_some(ref_claim),
            signer_key,
            signature,
        })
    }

    /// Content-derived reference to this claim.
    pub fn uid(&self) -> ClaimRef {
        ClaimRef(crypto::hash_bytes(&self.signing_bytes()))
    }

    /// Recompute the canonical encoding and check the signature.
    ///
    /// Rejects the claim when the issuer is not the address of the key that
    /// produced the signature.
    pub fn verify(&self) -> bool {
        if self.accuracy > MAX_ACCURACY {
            return false;
        }
        if Address::from_public_key(&self.signer_key) != self.issuer {
            return false;
        }
        crypto::verify_signature(&self.signer_key, &self.signing_bytes(), &self.signature)
            .unwrap_or(false)
    }

    /// Whether the claim has expired at `now` (unix seconds).
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration != 0 && now >= self.expiration
    }
}

/// Verify a claim. See [`Claim::verify`].
pub fn verify(claim: &Claim) -> bool {
    claim.verify()
}

pub(crate) struct Reader<'a> {
    pub(crate) buf: &'a [u8],
    pub(crate) pos: usize,
}

impl Reader<'_> {
    pub(crate) fn byte(&mut self) -> u8 {
        let b = self.buf[self.pos];
        self.pos += 1;
        b
    }

    pub(crate) fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}

/// Builds and signs claims under one schema, assigning monotonically
/// increasing nonces when the caller does not pin one.
#[derive(Debug)]
pub struct ClaimSigner {
    schema: SchemaId,
    next_nonce: AtomicU64,
}

impl ClaimSigner {
    pub fn new(schema: SchemaId) -> Self {
        Self::with_starting_nonce(schema, 0)
    }

    pub fn with_starting_nonce(schema: SchemaId, nonce: u64) -> Self {
        Self {
            schema,
            next_nonce: AtomicU64::new(nonce),
        }
    }

    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// Use `pinned` if given (and never hand it out later), else the next nonce.
    pub(crate) fn assign_nonce(&self, pinned: Option<u64>) -> u64 {
        match pinned {
            Some(n) => {
                self.next_nonce
                    .fetch_max(n.saturating_add(1), Ordering::SeqCst);
                n
            }
            None => self.next_nonce.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Construct a claim and sign its canonical encoding.
    ///
    /// # Errors
    /// - `InvalidAccuracy` if `accuracy` is outside 0..=100.
    /// - `SigningFailure` if `key` does not control `issuer` or the key refuses to sign.
    pub fn sign<K: KeySigner + ?Sized>(
        &self,
        subject: SubjectId,
        accuracy: i64,
        issuer: Address,
        key: &K,
        opts: ClaimOptions,
    ) -> Result<Claim, ClaimError> {
        let accuracy = u8::try_from(accuracy)
            .ok()
            .filter(|a| *a <= MAX_ACCURACY)
            .ok_or(ClaimError::InvalidAccuracy(accuracy))?;

        check_issuer(key, issuer)?;

        let (issued_at, expiration) = issue_window(&opts);
        let nonce = self.assign_nonce(opts.nonce);

        let mut claim = Claim {
            subject,
            accuracy,
            issuer,
            issued_at,
            expiration,
            revocable: opts.revocable,
            schema: self.schema,
            nonce,
            ref_claim: opts.ref_claim.filter(|r| !r.is_zero()),
            signer_key: key.public_key(),
            signature: [0u8; 64],
        };

        claim.signature = key
            .sign(&claim.signing_bytes())
            .map_err(|e| ClaimError::SigningFailure(e.to_string()))?;

        Ok(claim)
    }
}

/// Issuance and expiration times (unix seconds) for `opts`.
pub(crate) fn issue_window(opts: &ClaimOptions) -> (u64, u64) {
    let issued_at = opts
        .issued_at
        .unwrap_or_else(Utc::now)
        .timestamp()
        .max(0) as u64;
    let expiration = opts
        .expiration
        .map_or(0, |ttl| issued_at.saturating_add(ttl.as_secs()));
    (issued_at, expiration)
}

/// Check that `key` controls `issuer`.
pub(crate) fn check_issuer<K: KeySigner + ?Sized>(key: &K, issuer: Address) -> Result<(), ClaimError> {
    let signer_address = key.address();
    if signer_address != issuer {
        return Err(ClaimError::SigningFailure(format!(
            "signing key controls {} but issuer is {}",
            signer_address, issuer
        )));
    }
    Ok(())
}

/// JSON form of a claim, used for archival and for handing claims between
/// processes. Field names follow the attestation JSON validators already publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDocument {
    pub uid: ClaimRef,
    pub version: u8,
    pub message: ClaimMessage,
    pub signer_key: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimMessage {
    pub subject: SubjectId,
    pub accuracy: u8,
    pub issuer: Address,
    pub time: u64,
    pub expiration_time: u64,
    pub revocable: bool,
    pub nonce: u64,
    pub schema: SchemaId,
    #[serde(rename = "refUID")]
    pub ref_uid: ClaimRef,
}

impl From<Claim> for ClaimDocument {
    fn from(claim: Claim) -> Self {
        ClaimDocument {
            uid: claim.uid(),
            version: CLAIM_VERSION,
            message: ClaimMessage {
                subject: claim.subject,
                accuracy: claim.accuracy,
                issuer: claim.issuer,
                time: claim.issued_at,
                expiration_time: claim.expiration,
                revocable: claim.revocable,
                nonce: claim.nonce,
                schema: claim.schema,
                ref_uid: claim.ref_claim.unwrap_or(ClaimRef::ZERO),
            },
            signer_key: hex::encode(claim.signer_key),
            signature: hex::encode(claim.signature),
        }
    }
}

impl TryFrom<ClaimDocument> for Claim {
    type Error = ClaimError;

    fn try_from(doc: ClaimDocument) -> Result<Self, Self::Error> {
        if doc.version != CLAIM_VERSION {
            return Err(ClaimError::Malformed(format!(
                "unsupported claim version {}",
                doc.version
            )));
        }
        if doc.message.accuracy > MAX_ACCURACY {
            return Err(ClaimError::InvalidAccuracy(i64::from(doc.message.accuracy)));
        }

        let signer_key: [u8; 32] = decode_hex_array(&doc.signer_key, "signerKey")?;
        let signature: [u8; 64] = decode_hex_array(&doc.signature, "signature")?;
        let m = doc.message;

        let claim = Claim {
            subject: m.subject,
            accuracy: m.accuracy,
            issuer: m.issuer,
            issued_at: m.time,
            expiration: m.expiration_time,
            revocable: m.revocable,
            schema: m.schema,
            nonce: m.nonce,
            ref_claim: (!m.ref_uid.is_zero()).then_some(m.ref_uid),
            signer_key,
            signature,
        };

        if claim.uid() != doc.uid {
            return Err(ClaimError::Malformed(
                "uid does not match claim contents".to_string(),
            ));
        }

        Ok(claim)
    }
}

pub(crate) fn decode_hex_array<const N: usize>(s: &str, field: &str) -> Result<[u8; N], ClaimError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| ClaimError::Malformed(format!("{}: {}", field, e)))?;
    bytes
        .try_into()
        .map_err(|_| ClaimError::Malformed(format!("{} must be {} bytes", field, N)))
}
