//! Batch match runner for bot evaluation.
//!
//! Runs many seeds of the same match configuration in parallel using rayon.
//! Every match owns its own state and bots, so results do not depend on
//! scheduling.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{MatchConfig, MatchError};
use crate::match_runner::{MatchResult, MatchRunner};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Match template; its map seed is replaced per game.
    pub base: MatchConfig,
    /// Number of matches to run.
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default).
    pub parallel_games: u32,
    /// Seed of the first match; later matches count up from it.
    pub seed_start: u64,
    /// Output directory for results.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base: MatchConfig::default(),
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Batch of `game_count` matches of `base`.
    #[must_use]
    pub fn new(base: MatchConfig, game_count: u32) -> Self {
        Self {
            base,
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Limit the number of matches run at once.
    #[must_use]
    pub fn with_parallelism(mut self, parallel_games: u32) -> Self {
        self.parallel_games = parallel_games;
        self
    }

    /// Map seed for the `index`-th match.
    #[must_use]
    pub fn seed_for(&self, index: u32) -> u64 {
        self.seed_start.wrapping_add(u64::from(index))
    }
}

/// Aggregate numbers over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches that finished.
    pub total_games: u32,
    /// Wins by bot name.
    pub wins_by_bot: BTreeMap<String, u32>,
    /// Win rates by bot name.
    pub win_rates: BTreeMap<String, f64>,
    /// Wins by seat index.
    pub wins_by_seat: Vec<u32>,
    /// Matches without a winner.
    pub draws: u32,
    /// Mean rounds per match.
    pub avg_rounds: f64,
    /// Shortest match.
    pub min_rounds: u32,
    /// Longest match.
    pub max_rounds: u32,
    /// Rejected orders across all matches and seats.
    pub rejected_orders: u64,
}

impl BatchSummary {
    /// Calculate summary from a list of match results.
    #[must_use]
    pub fn from_games(games: &[MatchResult]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let seats = games.iter().map(|game| game.seats.len()).max().unwrap_or(0);
        let mut summary = Self {
            total_games: games.len() as u32,
            wins_by_seat: vec![0; seats],
            min_rounds: u32::MAX,
            ..Default::default()
        };

        let mut rounds_sum = 0u64;
        for game in games {
            rounds_sum += u64::from(game.rounds);
            summary.min_rounds = summary.min_rounds.min(game.rounds);
            summary.max_rounds = summary.max_rounds.max(game.rounds);
            summary.rejected_orders += game.total_rejected();

            match (game.winner, &game.winner_bot) {
                (Some(seat), Some(bot)) => {
                    *summary.wins_by_bot.entry(bot.clone()).or_insert(0) += 1;
                    if let Some(wins) = summary.wins_by_seat.get_mut(seat as usize) {
                        *wins += 1;
                    }
                }
                _ => summary.draws += 1,
            }
        }

        let total = f64::from(summary.total_games);
        summary.avg_rounds = rounds_sum as f64 / total;
        summary.win_rates = summary
            .wins_by_bot
            .iter()
            .map(|(bot, wins)| (bot.clone(), f64::from(*wins) / total))
            .collect();
        summary
    }
}

/// Match that failed to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index within the batch.
    pub game_index: u32,
    /// Map seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match results, in seed order.
    pub games: Vec<MatchResult>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), MatchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self, MatchError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn run_single_game(base: &MatchConfig, seed: u64) -> Result<MatchResult, MatchError> {
    let config = base.clone().with_seed(seed);
    MatchRunner::new(&config)?.run()
}

/// Run a batch of matches.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} games, seats [{}]",
        config.game_count,
        config
            .base
            .seats
            .iter()
            .map(|kind| kind.label())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let play = || -> Vec<Result<MatchResult, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|index| {
                let seed = config.seed_for(index);
                let outcome = run_single_game(&config.base, seed);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 {
                    debug!("Progress: {}/{}", done, config.game_count);
                }

                outcome.map_err(|err| {
                    warn!("Game {} (seed {}) failed: {}", index, seed, err);
                    BatchError {
                        game_index: index,
                        seed,
                        message: err.to_string(),
                    }
                })
            })
            .collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(err) => {
                warn!("Could not build a {}-thread pool: {}", config.parallel_games, err);
                play()
            }
        }
    } else {
        play()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<MatchResult> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Outcome of replaying one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Map seed checked.
    pub seed: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// True if every run ended identically.
    pub is_deterministic: bool,
}

/// Play the same match `runs` times and compare the outcomes.
pub fn verify_determinism(
    config: &MatchConfig,
    runs: u32,
) -> Result<DeterminismReport, MatchError> {
    let results = (0..runs.max(1))
        .map(|_| MatchRunner::new(config)?.run())
        .collect::<Result<Vec<_>, _>>()?;

    let first = &results[0];
    let is_deterministic = results.iter().all(|result| result == first);
    Ok(DeterminismReport {
        seed: config.map.seed,
        hashes: results
            .iter()
            .map(|result| result.final_state_hash)
            .collect(),
        is_deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_runner::SeatResult;

    fn result(winner: Option<u32>, rounds: u32, rejected: u64) -> MatchResult {
        let seat = |player: u32, bot: &str| SeatResult {
            player,
            bot: bot.to_string(),
            score: 0,
            eliminated: false,
            units: 0,
            structures: 1,
            orders_submitted: 10,
            orders_rejected: rejected,
            warnings: 0,
        };
        let seats = vec![seat(0, "RulesBot"), seat(1, "RandomBot")];
        MatchResult {
            seed: 0,
            winner,
            winner_bot: winner.map(|player| seats[player as usize].bot.clone()),
            rounds,
            turns: u64::from(rounds) * 2,
            seats,
            final_state_hash: 0,
        }
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(MatchConfig::default(), 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_parallelism(2);

        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.seed_for(3), 12348);
        assert_eq!(config.parallel_games, 2);
    }

    #[test]
    fn test_summary_counts() {
        let games = [
            result(Some(0), 40, 0),
            result(Some(0), 60, 0),
            result(Some(1), 20, 2),
            result(None, 200, 1),
        ];
        let summary = BatchSummary::from_games(&games);

        assert_eq!(summary.total_games, 4);
        assert_eq!(summary.wins_by_bot.get("RulesBot"), Some(&2));
        assert_eq!(summary.wins_by_bot.get("RandomBot"), Some(&1));
        assert_eq!(summary.wins_by_seat, vec![2, 1]);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.min_rounds, 20);
        assert_eq!(summary.max_rounds, 200);
        assert!((summary.avg_rounds - 80.0).abs() < f64::EPSILON);
        assert!((summary.win_rates["RulesBot"] - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.rejected_orders, 2 * 2 + 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_games(&[]);
        assert_eq!(summary.total_games, 0);
        assert!(summary.wins_by_bot.is_empty());
    }
}
