// crates/verinet-store/src/status.rs
//
// Reward idempotence state transitions, shared by every RewardStore backend.
//
//   (absent) --reserve--> Reserved --submit--> Submitted(tx) --complete--> Completed
//       ^                    |                      |
//       +------release-------+----------------------+

use verinet_core::error::VeriNetError;
use verinet_core::ledger::TxId;
use verinet_core::reward::{Reservation, RewardKey, RewardStatus};

/// Decide the outcome of `reserve`. Returns the reservation and the status
/// to write, if any.
pub(crate) fn on_reserve(
    key: &RewardKey,
    current: Option<&RewardStatus>,
) -> Result<(Reservation, Option<RewardStatus>), VeriNetError> {
    match current {
        None => Ok((Reservation::Fresh, Some(RewardStatus::Reserved))),
        Some(RewardStatus::Submitted(tx)) => Ok((Reservation::Resume(tx.clone()), None)),
        Some(RewardStatus::Reserved) => Err(VeriNetError::Duplicate(format!(
            "reward {} is already being issued",
            key.storage_key()
        ))),
        Some(RewardStatus::Completed(_)) => Err(VeriNetError::Duplicate(format!(
            "reward {} was already issued",
            key.storage_key()
        ))),
    }
}

pub(crate) fn on_submit(
    key: &RewardKey,
    current: Option<&RewardStatus>,
    tx: &TxId,
) -> Result<RewardStatus, VeriNetError> {
    match current {
        Some(RewardStatus::Reserved) | Some(RewardStatus::Submitted(_)) => {
            Ok(RewardStatus::Submitted(tx.clone()))
        }
        Some(RewardStatus::Completed(_)) => Err(VeriNetError::Duplicate(format!(
            "reward {} was already issued",
            key.storage_key()
        ))),
        None => Err(VeriNetError::NotFound(format!(
            "no reservation for reward {}",
            key.storage_key()
        ))),
    }
}

pub(crate) fn on_complete(
    key: &RewardKey,
    current: Option<&RewardStatus>,
) -> Result<(), VeriNetError> {
    match current {
        Some(RewardStatus::Completed(_)) => Err(VeriNetError::Duplicate(format!(
            "reward {} was already issued",
            key.storage_key()
        ))),
        _ => Ok(()),
    }
}

/// Completed rewards are permanent; anything else may be dropped.
pub(crate) fn releasable(current: Option<&RewardStatus>) -> bool {
    matches!(
        current,
        Some(RewardStatus::Reserved) | Some(RewardStatus::Submitted(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use verinet_core::digest::{Address, ResultRef};

    fn key() -> RewardKey {
        RewardKey::new(Address([1u8; 20]), ResultRef([2u8; 32]))
    }

    #[test]
    fn test_reserve_fresh_key() {
        let (reservation, write) = on_reserve(&key(), None).unwrap();
        assert_eq!(reservation, Reservation::Fresh);
        assert_eq!(write, Some(RewardStatus::Reserved));
    }

    #[test]
    fn test_reserve_in_flight_key_is_duplicate() {
        let result = on_reserve(&key(), Some(&RewardStatus::Reserved));
        assert!(matches!(result, Err(VeriNetError::Duplicate(_))));
    }

    #[test]
    fn test_reserve_submitted_key_resumes() {
        let tx = TxId("0xabc".to_string());
        let (reservation, write) =
            on_reserve(&key(), Some(&RewardStatus::Submitted(tx.clone()))).unwrap();
        assert_eq!(reservation, Reservation::Resume(tx));
        assert_eq!(write, None);
    }

    #[test]
    fn test_submit_without_reservation_fails() {
        let tx = TxId("0xabc".to_string());
        assert!(matches!(
            on_submit(&key(), None, &tx),
            Err(VeriNetError::NotFound(_))
        ));
    }

    #[test]
    fn test_releasable() {
        assert!(releasable(Some(&RewardStatus::Reserved)));
        assert!(!releasable(None));
    }
}
