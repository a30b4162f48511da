//! Core types and utilities for GameKeys.
//!
//! This crate provides the foundational types of the license-key storefront:
//!
//! - **Identifiers**: `UserId`, `GameId`, `PurchaseId`
//! - **Catalog**: `Game`, `Catalog`
//! - **Accounts**: `Account`, `PurchaseRecord`, `Accounts`, `apply_delta`
//! - **Inventory**: `Inventory`, `PendingIssue`
//! - **Trivia**: `TriviaQuestion`
//!
//! # Currency
//!
//! Balances and prices are whole currency units stored as `i64`. Discounts
//! are applied in integer arithmetic, so there is no floating point anywhere
//! in the money path.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod inventory;
pub mod trivia;

pub use account::{apply_delta, Account, Accounts, PurchaseRecord, STARTING_BALANCE};
pub use catalog::{discounted_price, Catalog, Game};
pub use error::{Result, ShopError};
pub use ids::{GameId, IdError, PurchaseId, UserId};
pub use inventory::{Inventory, PendingIssue};
pub use trivia::{TriviaQuestion, DEFAULT_TRIVIA_REWARD};
