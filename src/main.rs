//! Command line entry point for the paddle-rating engine
//!
//! Runs single-match and initial rating calculations, settles a group stage
//! from a JSON file, and audits the built-in regulation tables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paddle_rating::config::AppConfig;
use paddle_rating::rating::calculator::{validate_group_rank, validate_rating};
use paddle_rating::rating::settlement::{settle_group_stage, UnknownPlayerPolicy};
use paddle_rating::rating::tables::{validate_builtin_tables, BonusVariant, RATING_CHANGE_TABLE};
use paddle_rating::rating::{calculate_initial_rating, calculate_match_rating};
use paddle_rating::types::{GroupStageMatch, PlayerId, Rating};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paddle Rating - table-tennis club ranking points calculator
#[derive(Parser)]
#[command(
    name = "paddle-rating",
    version,
    about = "Table-driven rating calculator for club ranking and seeding"
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rating change for one match
    Match {
        /// Winner's rating before the match
        #[arg(long)]
        winner: Rating,
        /// Loser's rating before the match
        #[arg(long)]
        loser: Rating,
    },
    /// Starting rating for a first-time entrant
    Initial {
        /// Declared tier rating
        #[arg(long)]
        tier: Rating,
        /// Group-stage finishing rank (1 = first)
        #[arg(long)]
        rank: u32,
        /// Use the wide rating-spread bonus table
        #[arg(long)]
        wide: bool,
    },
    /// Settle a group stage from a JSON file
    Settle {
        /// JSON file with `matches` and `initial_ratings`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Reject players missing from `initial_ratings`
        #[arg(long)]
        strict: bool,
    },
    /// Validate and print the regulation tables
    CheckTables,
}

#[derive(Debug, Deserialize)]
struct SettlementInput {
    matches: Vec<GroupStageMatch>,
    #[serde(default)]
    initial_ratings: BTreeMap<PlayerId, Rating>,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(config_path) => AppConfig::from_file(config_path)?,
        None => AppConfig::from_env()?,
    };

    config.override_log_level(args.log_level.as_deref(), args.debug)?;

    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_settle(config: &AppConfig, input: &Path, strict: bool) -> Result<()> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let parsed: SettlementInput = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid settlement input {}", input.display()))?;

    for (player_id, rating) in &parsed.initial_ratings {
        validate_rating(*rating).with_context(|| format!("Player {}", player_id))?;
    }

    let policy = if strict {
        UnknownPlayerPolicy::Reject
    } else {
        config.rating.unknown_player_policy
    };
    info!(
        "Settling {} matches for {} rated players ({})",
        parsed.matches.len(),
        parsed.initial_ratings.len(),
        policy
    );

    let settlement = settle_group_stage(&parsed.matches, &parsed.initial_ratings, policy)?;
    print_json(&settlement)
}

fn run_check_tables() -> Result<()> {
    validate_builtin_tables()?;

    println!("Rating change table");
    for bracket in RATING_CHANGE_TABLE.iter() {
        let max = bracket
            .max
            .map_or_else(|| "∞".to_string(), |max| max.to_string());
        println!(
            "  {:>4} - {:<4}  expected +{:<2}  upset +{}",
            bracket.min, max, bracket.high_win, bracket.low_win
        );
    }

    for variant in [BonusVariant::Normal, BonusVariant::Wide] {
        println!("Initial rating bonus ({}, step {})", variant, variant.step());
        for entry in variant.entries() {
            println!("  rank {:>2}  +{}", entry.rank, entry.bonus);
        }
    }

    println!("All tables valid");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }
    debug!("Running {} v{}", config.service.name, paddle_rating::VERSION);

    match &args.command {
        Command::Match { winner, loser } => {
            validate_rating(*winner)?;
            validate_rating(*loser)?;
            print_json(&calculate_match_rating(*winner, *loser))
        }
        Command::Initial { tier, rank, wide } => {
            validate_rating(*tier)?;
            validate_group_rank(*rank)?;
            let rating = calculate_initial_rating(*tier, *rank, *wide);
            print_json(&serde_json::json!({
                "base_tier": tier,
                "group_rank": rank,
                "bonus_table": BonusVariant::from_wide(*wide),
                "initial_rating": rating,
            }))
        }
        Command::Settle { input, strict } => run_settle(&config, input, *strict),
        Command::CheckTables => run_check_tables(),
    }
}
