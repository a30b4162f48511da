//! Error types for GameKeys.

use crate::ids::IdError;

/// Result type for storefront operations.
pub type Result<T> = std::result::Result<T, ShopError>;

/// Errors that can occur in storefront operations.
///
/// Validation failures (`UnknownUser`, `UnknownGame`, `InsufficientFunds`,
/// `OutOfStock`) are terminal for an attempt. `Contention` is reported only
/// after the engines have exhausted their internal retries. `StoreFailure`
/// is never retried silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShopError {
    /// No account exists for the user.
    #[error("unknown user: {user_id}")]
    UnknownUser {
        /// The user ID that was not found.
        user_id: String,
    },

    /// No catalog item exists for the game.
    #[error("unknown game: {game_id}")]
    UnknownGame {
        /// The game ID that was not found.
        game_id: String,
    },

    /// The balance does not cover the price.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// No unsold keys remain for the game.
    #[error("out of stock: {game_id}")]
    OutOfStock {
        /// The game ID with an empty key sequence.
        game_id: String,
    },

    /// Concurrent writers kept invalidating the read snapshot.
    #[error("contention: gave up after {attempts} attempts")]
    Contention {
        /// Number of attempts made.
        attempts: u32,
    },

    /// The persistent store failed.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// No trivia question exists at the index.
    #[error("unknown question: {index} (of {count})")]
    UnknownQuestion {
        /// The requested question index.
        index: usize,
        /// Number of questions available.
        count: usize,
    },

    /// An account already exists for the user.
    #[error("account already exists: {user_id}")]
    AccountExists {
        /// The user ID that is already registered.
        user_id: String,
    },

    /// Arithmetic on an amount would overflow.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Seed data failed validation.
    #[error("invalid seed data: {0}")]
    InvalidSeed(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl ShopError {
    /// Whether this failure came from the validation phase of an operation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownUser { .. }
                | Self::UnknownGame { .. }
                | Self::InsufficientFunds { .. }
                | Self::OutOfStock { .. }
        )
    }
}
