//! CLI administration tool for tinyurl.
//!
//! Provides commands for inspecting short codes and records, viewing statistics,
//! and performing database maintenance without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Encode an id / decode a short code
//! cargo run --bin admin -- encode 1000
//! cargo run --bin admin -- decode g8
//!
//! # Show the stored record for a code
//! cargo run --bin admin -- resolve g8
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Delete expired records
//! cargo run --bin admin -- purge-expired
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see [`tinyurl::config`]). `encode` and `decode` need none.

use tinyurl::config::{self, Config};
use tinyurl::domain::repositories::ShortUrlRepository;
use tinyurl::infrastructure::counter::{BlockCounter, PgBlockCounter, RedisBlockCounter};
use tinyurl::infrastructure::persistence::PgShortUrlRepository;
use tinyurl::utils::base62;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing tinyurl.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Encode a numeric id as a short code
    Encode { id: u64 },

    /// Decode a short code back into its numeric id
    Decode { code: String },

    /// Show the stored record for a short code
    Resolve { code: String },

    /// Show statistics
    Stats,

    /// Delete records whose expiry has passed
    PurgeExpired {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { id } => handle_encode(id),
        Commands::Decode { code } => handle_decode(&code)?,
        Commands::Resolve { code } => {
            let (_, pool) = connect().await?;
            handle_resolve(&pool, &code).await?
        }
        Commands::Stats => {
            let (config, pool) = connect().await?;
            handle_stats(&config, &pool).await?
        }
        Commands::PurgeExpired { yes } => {
            let (_, pool) = connect().await?;
            handle_purge_expired(&pool, yes).await?
        }
        Commands::Db { action } => {
            let (_, pool) = connect().await?;
            handle_db_action(action, &pool).await?
        }
    }

    Ok(())
}

/// Loads the service configuration and connects to the database.
async fn connect() -> Result<(Config, PgPool)> {
    let config = config::load_from_env()?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    Ok((config, pool))
}

fn handle_encode(id: u64) {
    println!("{} -> {}", id.to_string().bright_white(), base62::encode(id).bright_green().bold());
}

fn handle_decode(code: &str) -> Result<()> {
    let id = base62::decode(code).with_context(|| format!("Cannot decode '{}'", code))?;
    println!("{} -> {}", code.bright_white(), id.to_string().bright_green().bold());
    Ok(())
}

/// Prints the stored record for `code`, marking it when expired.
///
/// Reads the database directly so that expired records remain visible.
async fn handle_resolve(pool: &PgPool, code: &str) -> Result<()> {
    let repo = PgShortUrlRepository::new(Arc::new(pool.clone()));

    let record = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let Some(record) = record else {
        println!("{}", format!("❌ No record for '{}'", code).red());
        return Ok(());
    };

    let status = if record.is_expired() {
        "EXPIRED".red()
    } else {
        "ACTIVE".green()
    };

    println!("{}", "🔗 Short URL".bright_blue().bold());
    println!();
    println!("  Code:     {}", record.short_code.cyan());
    println!("  Id:       {}", record.id.to_string().bright_black());
    println!("  Target:   {}", record.long_url.bright_white());
    println!(
        "  Created:  {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
    );
    match record.expires_at {
        Some(at) => println!("  Expires:  {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => println!("  Expires:  {}", "never".bright_black()),
    }
    println!("  Status:   {}", status);
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Total number of records
/// - Number of expired records not yet purged
/// - Current value of the block counter and the id range it has reserved
async fn handle_stats(config: &Config, pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let repo = PgShortUrlRepository::new(Arc::new(pool.clone()));
    let counts = repo
        .count_records(Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let counter: Arc<dyn BlockCounter> = match &config.redis_url {
        Some(url) => Arc::new(RedisBlockCounter::connect(url).await?),
        None => Arc::new(PgBlockCounter::new(Arc::new(pool.clone()))),
    };
    let blocks = counter.current(&config.id_counter_key).await?;

    println!(
        "  Records:        {}",
        counts.total.to_string().bright_green().bold()
    );
    println!(
        "  Expired:        {}",
        counts.expired.to_string().bright_yellow().bold()
    );
    println!(
        "  Blocks leased:  {} ({})",
        blocks.to_string().bright_green().bold(),
        config.id_counter_key.bright_black()
    );
    if let Some(last) = blocks.checked_mul(config.id_block_size).and_then(|v| v.checked_sub(1)) {
        println!("  Ids reserved:   0..={}", last.to_string().bright_white());
    }
    println!();

    Ok(())
}

/// Deletes expired records after confirmation.
async fn handle_purge_expired(pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge Expired Records".bright_blue().bold());
    println!();

    let repo = PgShortUrlRepository::new(Arc::new(pool.clone()));
    let now = Utc::now();

    let counts = repo
        .count_records(now)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    if counts.expired == 0 {
        println!("{}", "  Nothing to purge".yellow());
        return Ok(());
    }

    println!(
        "  {} of {} records have expired",
        counts.expired.to_string().bright_yellow().bold(),
        counts.total
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete them permanently?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let deleted = repo
        .purge_expired(now)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge records: {}", e))?;

    println!();
    println!(
        "{}",
        format!("✅ Deleted {} records", deleted).green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
