//! Engine configuration.

use std::time::Duration;

use gamekeys_core::{DEFAULT_TRIVIA_REWARD, STARTING_BALANCE};

/// Default number of read-validate-write attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default age after which a pending issue is considered abandoned.
pub const DEFAULT_PENDING_GRACE_SECS: u64 = 30;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path to the `RocksDB` data directory (default: "./data/gamekeys").
    pub data_dir: String,

    /// Directory holding `games.json`, `quiz.json`, `keys.json` and
    /// `users.json` (default: "./seed").
    pub seed_dir: String,

    /// Attempts per operation before reporting contention (default: 5).
    pub max_attempts: u32,

    /// Balance granted at registration (default: 1000).
    pub starting_balance: i64,

    /// Reward for a correct trivia answer (default: 50).
    pub trivia_reward: u32,

    /// Age in seconds after which recovery resolves a pending issue
    /// (default: 30).
    pub pending_grace_secs: u64,

    /// Maximum encoded document size in bytes (default: none).
    pub quota_bytes: Option<usize>,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_dir: std::env::var("GAMEKEYS_DATA_DIR").unwrap_or(defaults.data_dir),
            seed_dir: std::env::var("GAMEKEYS_SEED_DIR").unwrap_or(defaults.seed_dir),
            max_attempts: env_parse::<u32>("GAMEKEYS_MAX_ATTEMPTS")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_attempts),
            starting_balance: env_parse::<i64>("GAMEKEYS_STARTING_BALANCE")
                .filter(|&n| n >= 0)
                .unwrap_or(defaults.starting_balance),
            trivia_reward: env_parse("GAMEKEYS_TRIVIA_REWARD").unwrap_or(defaults.trivia_reward),
            pending_grace_secs: env_parse("GAMEKEYS_PENDING_GRACE_SECS")
                .unwrap_or(defaults.pending_grace_secs),
            quota_bytes: env_parse("GAMEKEYS_QUOTA_BYTES"),
        }
    }

    /// Pending-issue grace period as a `Duration`.
    #[must_use]
    pub const fn pending_grace(&self) -> Duration {
        Duration::from_secs(self.pending_grace_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data/gamekeys".into(),
            seed_dir: "./seed".into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            starting_balance: STARTING_BALANCE,
            trivia_reward: DEFAULT_TRIVIA_REWARD,
            pending_grace_secs: DEFAULT_PENDING_GRACE_SECS,
            quota_bytes: None,
        }
    }
}
