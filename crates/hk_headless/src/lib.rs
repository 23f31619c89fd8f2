//! Headless match runner for bot evaluation and CI verification.
//!
//! This crate plays HunterKiller matches between bots without any frontend:
//!
//! - **Single matches**: one seed, full per-seat statistics as JSON
//! - **Batches**: many seeds in parallel, summarised by bot and seat
//! - **Determinism checks**: the same seed played repeatedly must end in the
//!   same final state
//!
//! Logs go to stderr; results go to stdout or a JSON file.
//!
//! # Example
//!
//! ```bash
//! # One match, rules bot against the slightly random baseline
//! cargo run -p hk_headless -- run --seed 7
//!
//! # 500 matches from a config file
//! cargo run -p hk_headless -- batch --config matches/duel.ron --count 500
//!
//! # Verify determinism
//! cargo run -p hk_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod config;
pub mod match_runner;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use config::{BotKind, MatchConfig, MatchError};
pub use match_runner::{MatchResult, MatchRunner, SeatResult};
