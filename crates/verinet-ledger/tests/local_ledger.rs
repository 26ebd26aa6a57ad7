// crates/verinet-ledger/tests/local_ledger.rs
//
// LocalLedger persistence through RocksStore, driven via LedgerPublisher.

use std::sync::Arc;
use std::time::Duration;

use verinet_core::digest::{Address, SchemaId};
use verinet_ledger::{LedgerPublisher, LocalLedger, PublisherConfig};
use verinet_store::RocksStore;

fn temp_db_path() -> String {
    let dir = std::env::temp_dir().join(format!("verinet-ledger-test-{}", uuid::Uuid::now_v7()));
    dir.to_string_lossy().into_owned()
}

fn publisher(store: Arc<RocksStore>) -> LedgerPublisher {
    let ledger = LocalLedger::open(store).unwrap();
    LedgerPublisher::new(
        Arc::new(ledger),
        PublisherConfig {
            confirmation_timeout: Duration::from_secs(5),
            ..PublisherConfig::default()
        },
    )
}

#[tokio::test]
async fn balances_survive_reopen() {
    let path = temp_db_path();
    let validator = Address([7; 20]);

    {
        let store = Arc::new(RocksStore::open(&path).unwrap());
        let publisher = publisher(store);
        let pool = publisher.reward_pool();
        publisher.mint(pool, 100).await.unwrap();
        let confirmation = publisher.transfer(validator, 30).await.unwrap();
        assert_eq!(confirmation.block, 2);
        publisher
            .publish(&[0u8; 64], SchemaId([5; 32]))
            .await
            .unwrap();
    }

    let store = Arc::new(RocksStore::open(&path).unwrap());
    let publisher = publisher(store);
    assert_eq!(publisher.balance_of(validator).await.unwrap(), 30);
    assert_eq!(publisher.balance_of(publisher.reward_pool()).await.unwrap(), 70);

    let _ = std::fs::remove_dir_all(&path);
}

#[tokio::test]
async fn transfer_from_empty_pool_fails() {
    let path = temp_db_path();
    let store = Arc::new(RocksStore::open(&path).unwrap());
    let publisher = publisher(store);

    let err = publisher.transfer(Address([1; 20]), 1).await.unwrap_err();
    assert!(matches!(
        err,
        verinet_ledger::LedgerError::InsufficientFunds { .. }
    ));

    let _ = std::fs::remove_dir_all(&path);
}
