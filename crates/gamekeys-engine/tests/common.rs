//! Common test utilities for GameKeys engine integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use gamekeys_core::{Account, Accounts, Game, GameId, Inventory, TriviaQuestion, UserId};
use gamekeys_engine::{EngineConfig, SeedData, Storefront};
use gamekeys_store::{
    AccountLedger, DocumentStore, InventoryLedger, MemoryStore, Result as StoreResult, StoreError,
    VersionedDocument,
};

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";
pub const CAROL: &str = "carol@example.com";

/// Game "1": price 500, 20% off, keys KEY-A and KEY-B.
pub const DISCOUNTED: &str = "1";
/// Game "2": price 2000, one key.
pub const EXPENSIVE: &str = "2";
/// Game "3": price 100, no keys.
pub const SOLD_OUT: &str = "3";
/// Game "4": price 100, a single key.
pub const SOLO: &str = "4";

pub fn user(email: &str) -> UserId {
    UserId::new(email).unwrap()
}

pub fn game(id: &str) -> GameId {
    GameId::new(id).unwrap()
}

// ============================================================================
// Fault injection
// ============================================================================

/// How an injected write fault behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The write is rejected and nothing is stored.
    Fail,
    /// The write is stored but the caller sees an error.
    FailAfterCommit,
}

struct Fault {
    name: &'static str,
    kind: FaultKind,
    skip: u32,
}

type Hook = Box<dyn FnOnce(Arc<dyn DocumentStore>) + Send>;

/// A `MemoryStore` wrapper that injects write faults and interleaved writers.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    faults: Mutex<Vec<Fault>>,
    hooks: Mutex<Vec<(&'static str, Hook)>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            faults: Mutex::default(),
            hooks: Mutex::default(),
        }
    }

    /// Reject the next write to `name`.
    pub fn fail_next_write(&self, name: &'static str) {
        self.fail_write_after(name, 0, FaultKind::Fail);
    }

    /// Let `skip` writes to `name` through, then inject `kind` once.
    pub fn fail_write_after(&self, name: &'static str, skip: u32, kind: FaultKind) {
        self.faults.lock().unwrap().push(Fault { name, kind, skip });
    }

    /// Run `hook` against the underlying store right before the next write
    /// to `name`, as if another context committed first.
    pub fn before_next_write<F>(&self, name: &'static str, hook: F)
    where
        F: FnOnce(Arc<dyn DocumentStore>) + Send + 'static,
    {
        self.hooks.lock().unwrap().push((name, Box::new(hook)));
    }

    /// The underlying store, bypassing injected faults.
    pub fn inner(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.inner) as Arc<dyn DocumentStore>
    }

    fn next_fault(&self, name: &str) -> Option<FaultKind> {
        let mut faults = self.faults.lock().unwrap();
        match faults.iter().position(|f| f.name == name) {
            Some(i) if faults[i].skip > 0 => {
                faults[i].skip -= 1;
                None
            }
            Some(i) => Some(faults.remove(i).kind),
            None => None,
        }
    }

    fn next_hook(&self, name: &str) -> Option<Hook> {
        let mut hooks = self.hooks.lock().unwrap();
        let position = hooks.iter().position(|(n, _)| *n == name)?;
        Some(hooks.remove(position).1)
    }
}

impl DocumentStore for FlakyStore {
    fn read(&self, name: &str) -> StoreResult<Option<VersionedDocument>> {
        self.inner.read(name)
    }

    fn write(&self, name: &str, body: &serde_json::Value, expected_version: u64) -> StoreResult<u64> {
        if let Some(hook) = self.next_hook(name) {
            hook(self.inner());
        }

        match self.next_fault(name) {
            Some(FaultKind::Fail) => Err(StoreError::Database(format!(
                "injected failure writing {name}"
            ))),
            Some(FaultKind::FailAfterCommit) => {
                self.inner.write(name, body, expected_version)?;
                Err(StoreError::Database(format!(
                    "injected lost acknowledgement writing {name}"
                )))
            }
            None => self.inner.write(name, body, expected_version),
        }
    }
}

// ============================================================================
// Seed data
// ============================================================================

fn catalog_item(id: &str, title: &str, price: i64, discount: u8) -> Game {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": title,
        "price": price,
        "discount": discount,
        "platform": "Steam",
    }))
    .unwrap()
}

/// Four games and three funded accounts.
pub fn sample_seed() -> SeedData {
    let mut keys = BTreeMap::new();
    keys.insert(game(DISCOUNTED), vec!["KEY-A".to_string(), "KEY-B".to_string()]);
    keys.insert(game(EXPENSIVE), vec!["KEY-X".to_string()]);
    keys.insert(game(SOLD_OUT), Vec::new());
    keys.insert(game(SOLO), vec!["KEY-SOLO".to_string()]);

    let users: Accounts = [(ALICE, "Alice"), (BOB, "Bob"), (CAROL, "Carol")]
        .into_iter()
        .map(|(email, name)| Account::new(user(email), name, 1000))
        .collect();

    SeedData {
        games: vec![
            catalog_item(DISCOUNTED, "Hollow Knight", 500, 20),
            catalog_item(EXPENSIVE, "Elden Ring", 2000, 0),
            catalog_item(SOLD_OUT, "Celeste", 100, 0),
            catalog_item(SOLO, "Hades", 100, 0),
        ],
        trivia: vec![TriviaQuestion {
            question: "Which studio made The Witcher 3?".into(),
            options: vec!["CD Projekt Red".into(), "Bethesda".into()],
            correct: "CD Projekt Red".into(),
        }],
        keys,
        users,
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Test harness containing a storefront over a fault-injecting store.
pub struct TestHarness {
    /// The shared store.
    pub store: Arc<FlakyStore>,
    /// A storefront opened over `store`.
    pub shop: Storefront,
    /// Direct access to the inventory document.
    pub inventory: InventoryLedger,
    /// Direct access to the accounts document.
    pub accounts: AccountLedger,
}

impl TestHarness {
    /// Create a new harness with a freshly seeded store.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(FlakyStore::new());
        let shop = Storefront::open(
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            sample_seed(),
            config,
        )
        .expect("Failed to open storefront");

        Self {
            inventory: InventoryLedger::new(store.inner()),
            accounts: AccountLedger::new(store.inner()),
            store,
            shop,
        }
    }

    /// Open another storefront over the same store, as a second tab would.
    pub fn open_another(&self, config: EngineConfig) -> Storefront {
        Storefront::open(
            Arc::clone(&self.store) as Arc<dyn DocumentStore>,
            sample_seed(),
            config,
        )
        .expect("Failed to open second storefront")
    }

    pub fn account(&self, email: &str) -> Account {
        self.accounts
            .load()
            .unwrap()
            .data
            .get(&user(email))
            .cloned()
            .unwrap()
    }

    pub fn inventory_doc(&self) -> Inventory {
        self.inventory.load().unwrap().data
    }

    pub fn stock(&self, game_id: &str) -> Vec<String> {
        self.inventory_doc()
            .keys(&game(game_id))
            .map(ToString::to_string)
            .collect()
    }

    /// Current versions of the inventory and accounts documents.
    pub fn versions(&self) -> (u64, u64) {
        (
            self.inventory.load().unwrap().version,
            self.accounts.load().unwrap().version,
        )
    }

    /// Every issued or unsold key appears exactly once, nothing is pending,
    /// and every account satisfies its invariants.
    pub fn assert_consistent(&self) {
        let inventory = self.inventory_doc();
        let accounts = self.accounts.load().unwrap().data;

        assert!(inventory.pending().is_empty(), "pending: {:?}", inventory.pending());

        let mut seen = Vec::new();
        for (game_id, _) in inventory.counts() {
            seen.extend(inventory.keys(game_id).map(ToString::to_string));
        }
        for account in accounts.iter() {
            assert!(account.is_consistent(), "inconsistent account {:?}", account.user_id);
            assert!(account.balance >= 0);
            seen.extend(account.purchase_history.iter().map(|r| r.key.clone()));
        }

        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total, "a key appears in two places");
        assert_eq!(total, 4, "keys were created or lost");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
