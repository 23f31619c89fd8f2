//! Headless HunterKiller match runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one match and print the result as JSON
//! cargo run -p hk_headless -- run --seed 7 --seats rules,random
//!
//! # Run a batch of matches in parallel
//! cargo run -p hk_headless -- batch --count 1000 --output results/
//!
//! # Verify determinism
//! cargo run -p hk_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Logs go to stderr. `RUST_LOG` overrides the level chosen by `--verbose`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hk_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    config::{BotKind, MatchConfig, MatchError},
    match_runner::MatchRunner,
};

#[derive(Parser)]
#[command(name = "hk_headless")]
#[command(about = "Headless HunterKiller match runner for bot evaluation")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand that sets up a match.
#[derive(clap::Args)]
struct MatchArgs {
    /// Match config file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Map seed, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Bot per seat, comma separated (rules, random, slightly_random)
    #[arg(long, value_delimiter = ',')]
    seats: Option<Vec<BotKind>>,

    /// Round limit, overriding the config
    #[arg(long)]
    rounds: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Run {
        #[command(flatten)]
        args: MatchArgs,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a batch of matches for bot evaluation
    Batch {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of matches to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr, stdout is for results
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run { args, output } => cmd_run(&args, output.as_deref()),
        Commands::Batch {
            args,
            count,
            parallel,
            output,
        } => cmd_batch(&args, count, parallel, output),
        Commands::Verify { args, runs } => cmd_verify(&args, runs),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Build the match config from a file and command line overrides.
fn match_config(args: &MatchArgs) -> Result<MatchConfig, MatchError> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(seats) = &args.seats {
        config = config.with_seats(seats.clone());
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(rounds) = args.rounds {
        config.map = config.map.with_round_limit(rounds);
    }
    config.validate()?;
    Ok(config)
}

/// Play a single match
fn cmd_run(args: &MatchArgs, output: Option<&Path>) -> Result<ExitCode, MatchError> {
    let config = match_config(args)?;
    let result = MatchRunner::new(&config)?.run()?;
    let json = serde_json::to_string_pretty(&result)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)?;
            tracing::info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of matches
fn cmd_batch(
    args: &MatchArgs,
    count: u32,
    parallel: u32,
    output: PathBuf,
) -> Result<ExitCode, MatchError> {
    let base = match_config(args)?;
    let seed = base.map.seed;
    let config = BatchConfig::new(base, count)
        .with_seed(seed)
        .with_parallelism(parallel)
        .with_output(output);

    let results = run_batch(config);
    let path = results.config.output_dir.join("batch.json");
    results.save(&path)?;

    let summary = &results.summary;
    eprintln!();
    eprintln!("=== Batch Summary ===");
    eprintln!("Games: {}", summary.total_games);
    for (bot, wins) in &summary.wins_by_bot {
        eprintln!(
            "  {:<20} {:>5} wins ({:>5.1}%)",
            bot,
            wins,
            summary.win_rates.get(bot).copied().unwrap_or(0.0) * 100.0
        );
    }
    eprintln!("  {:<20} {:>5}", "Draws", summary.draws);
    eprintln!(
        "Rounds: avg {:.1}, min {}, max {}",
        summary.avg_rounds, summary.min_rounds, summary.max_rounds
    );
    eprintln!("Rejected orders: {}", summary.rejected_orders);
    eprintln!("Results: {}", path.display());

    if results.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("{} of {} matches failed", results.errors.len(), count);
        Ok(ExitCode::FAILURE)
    }
}

/// Verify determinism
fn cmd_verify(args: &MatchArgs, runs: u32) -> Result<ExitCode, MatchError> {
    let config = match_config(args)?;
    tracing::info!(
        "Verifying determinism: seed {} ({} runs)",
        config.map.seed,
        runs
    );

    let report = verify_determinism(&config, runs)?;
    if report.is_deterministic {
        eprintln!(
            "PASS: All {} runs produced identical results (hash {:016x})",
            report.hashes.len(),
            report.hashes.first().copied().unwrap_or_default()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected! Hashes: {:x?}", report.hashes);
        Ok(ExitCode::FAILURE)
    }
}
