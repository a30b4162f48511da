//! Startup seeding and pending-issue recovery.

mod common;

use std::sync::Arc;

use common::{game, sample_seed, user, TestHarness, ALICE, BOB, DISCOUNTED};
use gamekeys_core::{apply_delta, PurchaseRecord};
use gamekeys_engine::{EngineConfig, Storefront};
use gamekeys_store::MemoryStore;

fn no_grace() -> EngineConfig {
    EngineConfig {
        pending_grace_secs: 0,
        ..EngineConfig::default()
    }
}

/// Take a key into the pending journal, as a purchase interrupted right
/// after its first write would.
fn strand_key(harness: &TestHarness, buyer: &str) -> String {
    let mut snapshot = harness.inventory.load().unwrap();
    let key = snapshot
        .data
        .take_one(&game(DISCOUNTED), &user(buyer))
        .unwrap();
    harness
        .inventory
        .commit(snapshot.version, &snapshot.data)
        .unwrap();
    key
}

#[test]
fn seeding_is_first_writer_wins() {
    let harness = TestHarness::new();
    harness.shop.purchase(&user(ALICE), &game(DISCOUNTED)).unwrap();

    // A second context opening with the same seed sees the live documents.
    let second = harness.open_another(EngineConfig::default());
    assert_eq!(second.available_count(&game(DISCOUNTED)).unwrap(), 1);
    assert_eq!(second.profile(&user(ALICE)).unwrap().account.balance, 600);
}

#[test]
fn young_pending_issue_is_left_alone() {
    let harness = TestHarness::new();
    strand_key(&harness, ALICE);

    let report = harness.shop.recover().unwrap();

    assert!(report.is_empty());
    assert!(harness.inventory_doc().is_pending("KEY-A"));
}

#[test]
fn unsold_pending_key_is_restored_on_open() {
    let harness = TestHarness::new();
    let key = strand_key(&harness, ALICE);
    assert_eq!(harness.stock(DISCOUNTED), ["KEY-B"]);

    harness.open_another(no_grace());

    assert_eq!(harness.stock(DISCOUNTED), [key.as_str(), "KEY-B"]);
    assert_eq!(harness.account(ALICE).balance, 1000);
    harness.assert_consistent();
}

#[test]
fn recorded_pending_key_is_settled() {
    let harness = TestHarness::new();
    let key = strand_key(&harness, BOB);

    // The account commit landed before the context died.
    let mut accounts = harness.accounts.load().unwrap();
    let bob = accounts.data.get(&user(BOB)).cloned().unwrap();
    let item = harness.shop.catalog().get(&game(DISCOUNTED)).unwrap();
    let record = PurchaseRecord::new(item, key.clone());
    accounts
        .data
        .put(apply_delta(&bob, -item.final_price(), Some(record)).unwrap());
    harness
        .accounts
        .commit(accounts.version, &accounts.data)
        .unwrap();

    let report = harness.open_another(no_grace()).recover().unwrap();
    assert!(report.is_empty(), "open already resolved it");

    assert!(!harness.inventory_doc().is_pending(&key));
    assert_eq!(harness.stock(DISCOUNTED), ["KEY-B"]);
    assert!(harness.account(BOB).owns_key(&key));
    harness.assert_consistent();
}

#[test]
fn recover_reports_what_it_did() {
    let harness = TestHarness::with_config(no_grace());
    let first = strand_key(&harness, ALICE);
    let second = strand_key(&harness, BOB);

    let report = harness.shop.recover().unwrap();

    assert_eq!(report.restored.len(), 2);
    assert!(report.restored.contains(&first));
    assert!(report.restored.contains(&second));
    assert!(report.settled.is_empty());
    assert_eq!(harness.stock(DISCOUNTED).len(), 2);
    harness.assert_consistent();
}

#[test]
fn quota_failure_surfaces_as_store_failure() {
    let seed = sample_seed();
    let store = Arc::new(MemoryStore::with_quota(64));

    let err = Storefront::open(store, seed, EngineConfig::default()).unwrap_err();
    assert!(matches!(err, gamekeys_core::ShopError::StoreFailure(_)));
}

#[cfg(feature = "rocksdb-backend")]
mod durable {
    use super::*;
    use gamekeys_store::RocksStore;
    use tempfile::TempDir;

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let store = Arc::new(RocksStore::open(dir.path()).unwrap());
            let shop = Storefront::open(store, sample_seed(), EngineConfig::default()).unwrap();
            let purchase = shop.purchase(&user(ALICE), &game(DISCOUNTED)).unwrap();
            assert_eq!(purchase.key, "KEY-A");
        }

        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let shop = Storefront::open(store, sample_seed(), EngineConfig::default()).unwrap();

        let profile = shop.profile(&user(ALICE)).unwrap();
        assert_eq!(profile.account.balance, 600);
        assert_eq!(profile.purchased_count, 1);
        assert_eq!(shop.available_count(&game(DISCOUNTED)).unwrap(), 1);

        let next = shop.purchase(&user(ALICE), &game(DISCOUNTED)).unwrap();
        assert_eq!(next.key, "KEY-B");
    }
}
