// crates/verinet-consensus/src/testutil.rs
//
// Shared fixtures for unit tests.

use std::sync::Arc;

use verinet_core::claim::{Claim, ClaimOptions, ClaimSigner};
use verinet_core::crypto::Keypair;
use verinet_core::digest::{Address, SchemaId, SubjectId};
use verinet_core::participant::ParticipantRole;
use verinet_store::MemoryStore;

use crate::authority::StaticAuthority;
use crate::registry::ParticipantRegistry;

pub const ADMIN: Address = Address([0xad; 20]);

/// Schema every fixture claim is signed under.
pub const CLAIM_SCHEMA: SchemaId = SchemaId([1; 32]);

pub struct Validator {
    pub keypair: Keypair,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }
}

pub fn signed_claim(validator: &Validator, subject: SubjectId, accuracy: i64) -> Claim {
    signed_claim_with(validator, subject, accuracy, ClaimOptions::default())
}

pub fn signed_claim_with(
    validator: &Validator,
    subject: SubjectId,
    accuracy: i64,
    opts: ClaimOptions,
) -> Claim {
    ClaimSigner::new(CLAIM_SCHEMA)
        .sign(subject, accuracy, validator.address(), &validator.keypair, opts)
        .unwrap()
}

/// A registry over an in-memory store with `validators` enrolled and active.
pub async fn registry_with(validators: &[&Validator]) -> Arc<ParticipantRegistry> {
    let registry = ParticipantRegistry::load(
        Arc::new(StaticAuthority::new([ADMIN])),
        Arc::new(MemoryStore::new()),
    )
    .await
    .unwrap();
    for v in validators {
        registry
            .register(v.address(), ParticipantRole::Validator, ADMIN)
            .await
            .unwrap();
    }
    Arc::new(registry)
}
