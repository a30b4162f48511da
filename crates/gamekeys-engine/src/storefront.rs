//! The storefront: engines wired to one shared store.

use std::sync::Arc;

use serde::Serialize;

use gamekeys_core::{Account, Catalog, GameId, Result, ShopError, TriviaQuestion, UserId};
use gamekeys_store::{AccountLedger, DocumentStore, InventoryLedger};

use crate::config::EngineConfig;
use crate::purchase::{Purchase, TransactionEngine};
use crate::recovery::{recover_pending, RecoveryReport};
use crate::register::Registrar;
use crate::reward::RewardEngine;
use crate::seed::SeedData;

/// An account together with derived profile statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// The account.
    pub account: Account,

    /// Number of keys bought.
    pub purchased_count: usize,
}

/// One execution context's view of the shop.
///
/// Several `Storefront`s may share one `DocumentStore`; each keeps only the
/// read-only catalog in memory and reads the ledgers afresh per operation.
#[derive(Debug, Clone)]
pub struct Storefront {
    catalog: Arc<Catalog>,
    trivia: Arc<[TriviaQuestion]>,
    inventory: InventoryLedger,
    accounts: AccountLedger,
    transactions: TransactionEngine,
    rewards: RewardEngine,
    registrar: Registrar,
    config: EngineConfig,
}

impl Storefront {
    /// Seed the store if needed, resolve stale pending issues, and build the
    /// engines.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidSeed` for bad seed data and
    /// `ShopError::StoreFailure` if the store cannot be seeded or read.
    pub fn open(store: Arc<dyn DocumentStore>, seed: SeedData, config: EngineConfig) -> Result<Self> {
        let parts = seed.into_parts()?;

        let inventory = InventoryLedger::new(Arc::clone(&store));
        let accounts = AccountLedger::new(store);
        inventory.seed(parts.inventory)?;
        accounts.seed(parts.accounts)?;

        let catalog = Arc::new(parts.catalog);
        let storefront = Self {
            transactions: TransactionEngine::new(
                inventory.clone(),
                accounts.clone(),
                Arc::clone(&catalog),
                config.max_attempts,
            ),
            rewards: RewardEngine::new(accounts.clone(), config.trivia_reward, config.max_attempts),
            registrar: Registrar::new(
                accounts.clone(),
                config.starting_balance,
                config.max_attempts,
            ),
            catalog,
            trivia: parts.trivia.into(),
            inventory,
            accounts,
            config,
        };

        storefront.recover()?;

        tracing::info!(
            games = storefront.catalog.len(),
            questions = storefront.trivia.len(),
            "Storefront ready"
        );

        Ok(storefront)
    }

    /// The catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Trivia questions in quiz order.
    #[must_use]
    pub fn trivia(&self) -> &[TriviaQuestion] {
        &self.trivia
    }

    /// The purchase engine.
    #[must_use]
    pub fn transactions(&self) -> &TransactionEngine {
        &self.transactions
    }

    /// The reward engine.
    #[must_use]
    pub fn rewards(&self) -> &RewardEngine {
        &self.rewards
    }

    /// Unsold keys currently available for a game.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StoreFailure` if the inventory cannot be read.
    pub fn available_count(&self, game_id: &GameId) -> Result<usize> {
        Ok(self.inventory.load()?.data.available_count(game_id))
    }

    /// Register a new account with the starting grant.
    ///
    /// # Errors
    ///
    /// See [`Registrar::register`].
    pub fn register(&self, email: &str, display_name: &str) -> Result<Account> {
        self.registrar.register(email, display_name)
    }

    /// Buy one key.
    ///
    /// # Errors
    ///
    /// See [`TransactionEngine::purchase`].
    pub fn purchase(&self, user_id: &UserId, game_id: &GameId) -> Result<Purchase> {
        self.transactions.purchase(user_id, game_id)
    }

    /// Credit a reward.
    ///
    /// # Errors
    ///
    /// See [`RewardEngine::credit_reward`].
    pub fn credit_reward(&self, user_id: &UserId, amount: u32) -> Result<Account> {
        self.rewards.credit_reward(user_id, amount)
    }

    /// Answer the trivia question at `index`, crediting the reward if correct.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownQuestion` for an out-of-range question
    /// index, otherwise see [`RewardEngine::reward_answer`].
    pub fn answer(&self, user_id: &UserId, index: usize, answer: &str) -> Result<Option<Account>> {
        let question = self
            .trivia
            .get(index)
            .ok_or_else(|| ShopError::UnknownQuestion {
                index,
                count: self.trivia.len(),
            })?;
        self.rewards.reward_answer(user_id, question, answer)
    }

    /// The account and its statistics.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownUser` if the account does not exist.
    pub fn profile(&self, user_id: &UserId) -> Result<Profile> {
        let account = self
            .accounts
            .load()?
            .data
            .get(user_id)
            .cloned()
            .ok_or_else(|| ShopError::UnknownUser {
                user_id: user_id.to_string(),
            })?;

        Ok(Profile {
            purchased_count: account.purchase_history.len(),
            account,
        })
    }

    /// Resolve pending issues older than the configured grace period.
    ///
    /// # Errors
    ///
    /// See [`recover_pending`].
    pub fn recover(&self) -> Result<RecoveryReport> {
        recover_pending(
            &self.inventory,
            &self.accounts,
            self.config.pending_grace(),
            self.config.max_attempts,
        )
    }

    /// The configuration this storefront was opened with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
