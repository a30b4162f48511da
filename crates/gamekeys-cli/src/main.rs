//! GameKeys - command-line storefront
//!
//! Every invocation opens the local store, seeds it on first use, resolves
//! stale pending issues, runs one command and prints the result as JSON.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamekeys_core::{GameId, UserId};
use gamekeys_engine::{EngineConfig, SeedData, Storefront};
use gamekeys_store::RocksStore;

/// GameKeys CLI
#[derive(Parser)]
#[command(name = "gamekeys")]
#[command(about = "GameKeys - license-key storefront", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory
    #[arg(long, env = "GAMEKEYS_DATA_DIR")]
    data_dir: Option<String>,

    /// Seed directory
    #[arg(long, env = "GAMEKEYS_SEED_DIR")]
    seed_dir: Option<String>,

    /// Log level
    #[arg(long, env = "GAMEKEYS_LOG_LEVEL", default_value = "info,gamekeys=debug")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "GAMEKEYS_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog with prices and stock
    Catalog,

    /// List trivia questions
    Quiz,

    /// Register an account
    Register {
        /// E-mail address
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,
    },

    /// Buy one key
    Purchase {
        /// Buyer e-mail address
        #[arg(long)]
        user: UserId,

        /// Game id
        #[arg(long)]
        game: GameId,
    },

    /// Credit a reward
    Reward {
        /// Recipient e-mail address
        #[arg(long)]
        user: UserId,

        /// Amount to credit
        #[arg(long)]
        amount: u32,
    },

    /// Answer a trivia question
    Answer {
        /// E-mail address
        #[arg(long)]
        user: UserId,

        /// Question number, starting at 0
        #[arg(long)]
        question: usize,

        /// The chosen option
        #[arg(long)]
        answer: String,
    },

    /// Show an account
    Profile {
        /// E-mail address
        #[arg(long)]
        user: UserId,
    },

    /// Resolve stale pending key issues
    Recover,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry<'a> {
    id: &'a GameId,
    title: &'a str,
    platform: &'a str,
    genre: &'a str,
    price: i64,
    discount_percent: u8,
    final_price: i64,
    available: usize,
}

#[derive(Serialize)]
struct AnswerOutcome {
    correct: bool,
    balance: Option<i64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load configuration; CLI flags win over the environment
    let mut config = EngineConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(seed_dir) = cli.seed_dir {
        config.seed_dir = seed_dir;
    }

    tracing::debug!(
        data_dir = %config.data_dir,
        seed_dir = %config.seed_dir,
        max_attempts = config.max_attempts,
        quota_bytes = ?config.quota_bytes,
        "Configuration loaded"
    );

    // Open store and storefront
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?.with_quota(config.quota_bytes));
    let seed = SeedData::load(&config.seed_dir)?;
    let shop = Storefront::open(store, seed, config)?;

    match cli.command {
        Command::Catalog => {
            let mut entries = Vec::with_capacity(shop.catalog().len());
            for game in shop.catalog().iter() {
                entries.push(CatalogEntry {
                    id: &game.id,
                    title: &game.title,
                    platform: &game.platform,
                    genre: &game.genre,
                    price: game.price,
                    discount_percent: game.discount_percent,
                    final_price: game.final_price(),
                    available: shop.available_count(&game.id)?,
                });
            }
            print_json(&entries)
        }
        Command::Quiz => print_json(&shop.trivia()),
        Command::Register { email, name } => print_json(&shop.register(&email, &name)?),
        Command::Purchase { user, game } => print_json(&shop.purchase(&user, &game)?),
        Command::Reward { user, amount } => print_json(&shop.credit_reward(&user, amount)?),
        Command::Answer {
            user,
            question,
            answer,
        } => {
            let account = shop.answer(&user, question, &answer)?;
            print_json(&AnswerOutcome {
                correct: account.is_some(),
                balance: account.map(|a| a.balance),
            })
        }
        Command::Profile { user } => print_json(&shop.profile(&user)?),
        Command::Recover => print_json(&shop.recover()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
