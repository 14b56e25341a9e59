//! CLI administration tool for snapurl.
//!
//! Operates directly on the shared Redis store, so it works without the HTTP
//! API being reachable and is not subject to rate limiting.
//!
//! # Usage
//!
//! ```bash
//! # Create a short URL
//! cargo run --bin admin -- shorten https://example.com --code launch --ttl 86400
//!
//! # Show click statistics
//! cargo run --bin admin -- stats launch
//!
//! # Delete a short URL
//! cargo run --bin admin -- delete launch
//!
//! # Check store connection
//! cargo run --bin admin -- check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server. `REDIS_URL` (or `REDIS_HOST`) is required: the
//! in-process store of a running server is not reachable from here.

use snapurl::config::{self, Config, mask_connection_string};
use snapurl::prelude::*;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;

/// CLI tool for managing snapurl.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a short URL
    Shorten {
        /// The URL to shorten
        url: String,

        /// Custom short code
        #[arg(short, long)]
        code: Option<String>,

        /// Lifetime in seconds (defaults to URL_TTL_SECONDS)
        #[arg(short, long)]
        ttl: Option<u64>,
    },

    /// Show statistics for a short code
    Stats {
        code: String,
    },

    /// Delete a short code and its click counter
    Delete {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Check store connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let redis_url = config
        .redis_url
        .clone()
        .context("REDIS_URL or REDIS_HOST must be set")?;

    let store = RedisStore::connect(
        &redis_url,
        config.store_timeout(),
        config.store_max_retries,
    )
    .await
    .context("Failed to connect to Redis")?;
    let store: Arc<dyn KvStore> = Arc::new(store);

    let registry = UrlRegistry::new(store.clone(), config.registry_settings());

    match cli.command {
        Commands::Shorten { url, code, ttl } => shorten(&registry, &config, url, code, ttl).await?,
        Commands::Stats { code } => stats(&registry, &code).await?,
        Commands::Delete { code, yes } => delete(&registry, &code, yes).await?,
        Commands::Check => check(store.as_ref(), &redis_url).await?,
    }

    Ok(())
}

async fn shorten(
    registry: &UrlRegistry,
    config: &Config,
    url: String,
    code: Option<String>,
    ttl: Option<u64>,
) -> Result<()> {
    println!("{}", "🔗 Shorten URL".bright_blue().bold());
    println!();

    let record = registry
        .shorten(url, code, ttl)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to shorten URL: {}", e))?;

    println!("  Code:      {}", record.short_code.bright_yellow().bold());
    println!(
        "  Short URL: {}",
        format!("{}/{}", config.base_url, record.short_code).cyan()
    );
    println!("  Target:    {}", record.original_url);
    println!("  Expires:   {}", format_expiry(&record));
    println!();

    Ok(())
}

/// Displays the record and click count of a short code.
///
/// # Output Format
///
/// ```text
/// 📊 Statistics
///
///   Code:     launch
///   Target:   https://example.com
///   Clicks:   42
///   Created:  2025-01-15 10:30
///   Expires:  2025-02-14 10:30
/// ```
async fn stats(registry: &UrlRegistry, code: &str) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let record = registry
        .stats(code)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    println!("  Code:     {}", record.short_code.cyan());
    println!("  Target:   {}", record.original_url);
    println!(
        "  Clicks:   {}",
        record.click_count.to_string().bright_white().bold()
    );
    println!(
        "  Created:  {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    println!("  Expires:  {}", format_expiry(&record));
    println!();

    Ok(())
}

/// Deletes a short code after confirmation (default: No).
async fn delete(registry: &UrlRegistry, code: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Delete Short URL".bright_blue().bold());
    println!();

    let record = registry
        .stats(code)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load short URL: {}", e))?;

    println!("  Code:   {}", record.short_code.cyan());
    println!("  Target: {}", record.original_url);
    println!("  Clicks: {}", record.click_count);
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this short URL?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    registry
        .delete(code)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete short URL: {}", e))?;

    println!("{}", "✅ Deleted".green().bold());
    println!();

    Ok(())
}

async fn check(store: &dyn KvStore, redis_url: &str) -> Result<()> {
    println!("{}", "🔍 Checking store connection...".bright_blue());

    match store.ping().await {
        Ok(()) => {
            println!("{}", "✅ Store connection OK".green().bold());
            println!("  {}", mask_connection_string(redis_url).bright_black());
            Ok(())
        }
        Err(e) => {
            println!("{}", "❌ Store connection failed".red().bold());
            Err(anyhow::anyhow!(e))
        }
    }
}

fn format_expiry(record: &UrlRecord) -> ColoredString {
    match record.expires_at {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string().normal(),
        None => "never".bright_black(),
    }
}
