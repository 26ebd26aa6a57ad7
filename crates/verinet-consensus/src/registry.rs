// crates/verinet-consensus/src/registry.rs
//
// ParticipantRegistry: admin-managed membership of providers and validators.
//
// Reads take a shared lock and run concurrently with each other; mutations
// take the write lock, persist the new snapshot through the RegistryStore,
// and only then replace the in-memory list. A failed persist leaves the
// registry unchanged.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use verinet_core::digest::Address;
use verinet_core::error::VeriNetError;
use verinet_core::participant::{Participant, ParticipantRole};
use verinet_core::traits::RegistryStore;

use crate::authority::{Authority, Role};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{requested_by} does not hold the admin role")]
    Unauthorized { requested_by: Address },

    #[error("{0} is not a registered participant")]
    UnknownParticipant(Address),

    #[error("{0} is already registered")]
    AlreadyRegistered(Address),

    #[error(transparent)]
    Store(#[from] VeriNetError),
}

impl From<RegistryError> for VeriNetError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Unauthorized { .. } => VeriNetError::Authorization(e.to_string()),
            RegistryError::UnknownParticipant(_) => VeriNetError::NotFound(e.to_string()),
            RegistryError::AlreadyRegistered(_) => VeriNetError::Duplicate(e.to_string()),
            RegistryError::Store(inner) => inner,
        }
    }
}

pub struct ParticipantRegistry {
    /// Registration order.
    participants: RwLock<Vec<Participant>>,
    authority: Arc<dyn Authority>,
    store: Arc<dyn RegistryStore>,
}

impl ParticipantRegistry {
    /// Load the persisted membership list.
    pub async fn load(
        authority: Arc<dyn Authority>,
        store: Arc<dyn RegistryStore>,
    ) -> Result<Self, VeriNetError> {
        let participants = store.load_participants().await?;
        tracing::debug!("Loaded {} registered participants", participants.len());
        Ok(Self {
            participants: RwLock::new(participants),
            authority,
            store,
        })
    }

    fn require_admin(&self, requested_by: &Address) -> Result<(), RegistryError> {
        if self.authority.has_role(requested_by, Role::Admin) {
            Ok(())
        } else {
            tracing::warn!("Rejected registry mutation from non-admin {}", requested_by);
            Err(RegistryError::Unauthorized {
                requested_by: *requested_by,
            })
        }
    }

    /// Enroll `address` as an active participant with `role`.
    pub async fn register(
        &self,
        address: Address,
        role: ParticipantRole,
        requested_by: Address,
    ) -> Result<Participant, RegistryError> {
        self.require_admin(&requested_by)?;

        let mut participants = self.participants.write().await;
        if participants.iter().any(|p| p.address == address) {
            return Err(RegistryError::AlreadyRegistered(address));
        }

        let participant = Participant {
            address,
            role,
            active: true,
            registered_at: Utc::now(),
        };
        let mut next = participants.clone();
        next.push(participant.clone());
        self.store.save_participants(&next).await?;
        *participants = next;

        tracing::info!("Registered {} as {}", address, role);
        Ok(participant)
    }

    /// Set the active flag of a registered participant.
    pub async fn set_active(
        &self,
        address: Address,
        active: bool,
        requested_by: Address,
    ) -> Result<(), RegistryError> {
        self.require_admin(&requested_by)?;

        let mut participants = self.participants.write().await;
        let index = participants
            .iter()
            .position(|p| p.address == address)
            .ok_or(RegistryError::UnknownParticipant(address))?;

        let mut next = participants.clone();
        next[index].active = active;
        self.store.save_participants(&next).await?;
        *participants = next;

        tracing::info!("Set {} active={}", address, active);
        Ok(())
    }

    /// All participants in registration order.
    pub async fn list(&self) -> Vec<Participant> {
        self.participants.read().await.clone()
    }

    pub async fn get(&self, address: &Address) -> Option<Participant> {
        self.participants
            .read()
            .await
            .iter()
            .find(|p| p.address == *address)
            .cloned()
    }

    pub async fn is_active_validator(&self, address: &Address) -> bool {
        self.participants
            .read()
            .await
            .iter()
            .any(|p| p.address == *address && p.is_active_validator())
    }

    pub async fn is_active_provider(&self, address: &Address) -> bool {
        self.participants
            .read()
            .await
            .iter()
            .any(|p| p.address == *address && p.is_active_provider())
    }

    pub fn authority(&self) -> &Arc<dyn Authority> {
        &self.authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::StaticAuthority;
    use async_trait::async_trait;
    use verinet_store::MemoryStore;

    const ADMIN: Address = Address([0xad; 20]);

    async fn registry() -> ParticipantRegistry {
        ParticipantRegistry::load(
            Arc::new(StaticAuthority::new([ADMIN])),
            Arc::new(MemoryStore::new()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_list_in_order() {
        let registry = registry().await;
        registry
            .register(Address([2; 20]), ParticipantRole::Validator, ADMIN)
            .await
            .unwrap();
        registry
            .register(Address([1; 20]), ParticipantRole::Provider, ADMIN)
            .await
            .unwrap();

        let list = registry.list().await;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].address, Address([2; 20]));
        assert_eq!(list[1].address, Address([1; 20]));
        assert!(registry.is_active_validator(&Address([2; 20])).await);
        assert!(!registry.is_active_validator(&Address([1; 20])).await);
        assert!(registry.is_active_provider(&Address([1; 20])).await);
        assert!(!registry.is_active_provider(&Address([2; 20])).await);
    }

    #[tokio::test]
    async fn test_non_admin_set_active_leaves_state_unchanged() {
        let registry = registry().await;
        let validator = Address([3; 20]);
        registry
            .register(validator, ParticipantRole::Validator, ADMIN)
            .await
            .unwrap();
        let before = registry.list().await;

        let err = registry
            .set_active(validator, false, Address([9; 20]))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert_eq!(registry.list().await, before);
        assert!(registry.is_active_validator(&validator).await);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_participant() {
        let registry = registry().await;
        let validator = Address([4; 20]);
        registry
            .register(validator, ParticipantRole::Validator, ADMIN)
            .await
            .unwrap();
        registry.set_active(validator, false, ADMIN).await.unwrap();

        assert!(!registry.is_active_validator(&validator).await);
        assert_eq!(registry.list().await.len(), 1);
        assert!(!registry.get(&validator).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_are_reported() {
        let registry = registry().await;
        let err = registry
            .set_active(Address([5; 20]), true, ADMIN)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParticipant(_)));

        registry
            .register(Address([5; 20]), ParticipantRole::Validator, ADMIN)
            .await
            .unwrap();
        let err = registry
            .register(Address([5; 20]), ParticipantRole::Provider, ADMIN)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));
    }

    struct BrokenStore;

    #[async_trait]
    impl RegistryStore for BrokenStore {
        async fn load_participants(&self) -> Result<Vec<Participant>, VeriNetError> {
            Ok(Vec::new())
        }

        async fn save_participants(&self, _p: &[Participant]) -> Result<(), VeriNetError> {
            Err(VeriNetError::Storage("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_unchanged() {
        let registry = ParticipantRegistry::load(
            Arc::new(StaticAuthority::new([ADMIN])),
            Arc::new(BrokenStore),
        )
        .await
        .unwrap();

        let err = registry
            .register(Address([6; 20]), ParticipantRole::Validator, ADMIN)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Store(_)));
        assert!(registry.list().await.is_empty());
    }
}
