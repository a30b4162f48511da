//! Transaction engines for GameKeys.
//!
//! The engines run the storefront's balance-changing operations over the
//! versioned inventory and accounts documents:
//!
//! - [`TransactionEngine`]: buy one key of a game
//! - [`RewardEngine`]: credit trivia rewards
//! - [`Registrar`]: open accounts with the starting grant
//! - [`recover_pending`]: resolve keys left pending by interrupted purchases
//!
//! [`Storefront`] wires them to one shared [`gamekeys_store::DocumentStore`]
//! and is the entry point for embedders.
//!
//! # Concurrency
//!
//! No engine holds a lock across operations. Every write is conditioned on
//! the version it read; a conflicting write is retried from a fresh read up
//! to [`EngineConfig::max_attempts`] times, then reported as
//! `ShopError::Contention`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cas;
pub mod config;
pub mod purchase;
pub mod recovery;
pub mod register;
pub mod reward;
pub mod seed;
pub mod storefront;

pub use config::{EngineConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_PENDING_GRACE_SECS};
pub use purchase::{Purchase, TransactionEngine};
pub use recovery::{recover_pending, RecoveryReport};
pub use register::Registrar;
pub use reward::RewardEngine;
pub use seed::{SeedData, SeedParts};
pub use storefront::{Profile, Storefront};
