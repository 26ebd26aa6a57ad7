// crates/verinet-core/src/crypto.rs

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::digest::Address;
use crate::error::VeriNetError;
use crate::traits::KeySigner;

/// An ed25519 keypair for signing and verification.
pub struct Keypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Rebuild a keypair from its 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Parse a hex-encoded 32-byte secret seed (as written by `verinet wallet create`).
    pub fn from_hex(secret_hex: &str) -> Result<Self, VeriNetError> {
        let trimmed = secret_hex.trim();
        let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(body)?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VeriNetError::Crypto("Secret key must be exactly 32 bytes".to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Hex encoding of the secret seed, for writing key files.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Get the public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The address controlled by this keypair.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key_bytes())
    }
}

impl KeySigner for Keypair {
    fn address(&self) -> Address {
        Keypair::address(self)
    }

    fn public_key(&self) -> [u8; 32] {
        self.public_key_bytes()
    }

    fn sign(&self, message: &[u8]) -> Result<[u8; 64], VeriNetError> {
        Ok(self.signing_key.sign(message).to_bytes())
    }
}

/// Verify an ed25519 signature.
///
/// Returns `true` if the signature is valid for the given message and public key.
pub fn verify_signature(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, VeriNetError> {
    let verifying_key = VerifyingKey::from_bytes(public_key_bytes)
        .map_err(|e| VeriNetError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| VeriNetError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
