//! Error types for GameKeys storage.

use gamekeys_core::ShopError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The document changed since it was read.
    #[error("version conflict on {name}: expected={expected}, actual={actual}")]
    VersionConflict {
        /// Document name.
        name: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The serialized document does not fit in the configured quota.
    #[error("quota exceeded on {name}: size={size}, quota={quota}")]
    QuotaExceeded {
        /// Document name.
        name: String,
        /// Serialized size in bytes.
        size: usize,
        /// Quota in bytes.
        quota: usize,
    },
}

impl StoreError {
    /// Whether this is an optimistic-concurrency conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

impl From<StoreError> for ShopError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } => Self::Contention { attempts: 1 },
            StoreError::Database(_)
            | StoreError::Serialization(_)
            | StoreError::QuotaExceeded { .. } => Self::StoreFailure(err.to_string()),
        }
    }
}
