//! Document names and column families.

/// Names of the persisted documents.
pub mod doc {
    /// Inventory document: unsold keys per game plus the pending-issue journal.
    pub const INVENTORY: &str = "gamestore_keys";

    /// Accounts document: every account, keyed by user id.
    pub const ACCOUNTS: &str = "gamestore_users";
}

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Versioned document envelopes, keyed by document name.
    pub const DOCUMENTS: &str = "documents";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::DOCUMENTS]
}
