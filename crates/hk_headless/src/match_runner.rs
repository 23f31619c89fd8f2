//! Plays one match between bots, start to finish.
//!
//! Each turn the active seat's bot sees the true state, returns an action,
//! and the rules resolve it. The runner only counts: it never second-guesses
//! a bot's orders, so rejected orders show up in the result instead of being
//! filtered.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use hk_bot::Bot;
use hk_core::entity::PlayerId;
use hk_core::error::GameError;
use hk_core::map_generation::generate_match;
use hk_core::rules::{RulesEngine, StandardRules, TurnReport};
use hk_core::state::GameState;
use serde::{Deserialize, Serialize};

use crate::config::{MatchConfig, MatchError};

/// Per-seat outcome and order statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatResult {
    /// Seat index.
    pub player: PlayerId,
    /// Name reported by the seat's bot.
    pub bot: String,
    /// Final score.
    pub score: u32,
    /// True if the seat lost every base.
    pub eliminated: bool,
    /// Units alive at the end.
    pub units: usize,
    /// Structures standing at the end.
    pub structures: usize,
    /// Orders the bot submitted.
    pub orders_submitted: u64,
    /// Orders the rules refused.
    pub orders_rejected: u64,
    /// Problems reported while executing accepted orders.
    pub warnings: u64,
}

/// Summary of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Map seed the match was generated from.
    pub seed: u64,
    /// Winning seat, `None` for a draw.
    pub winner: Option<PlayerId>,
    /// Name of the winning bot.
    pub winner_bot: Option<String>,
    /// Rounds played.
    pub rounds: u32,
    /// Turns played, across all seats.
    pub turns: u64,
    /// One entry per seat.
    pub seats: Vec<SeatResult>,
    /// Hash of the final state, for determinism checks.
    pub final_state_hash: u64,
}

impl MatchResult {
    /// Total rejected orders across all seats.
    #[must_use]
    pub fn total_rejected(&self) -> u64 {
        self.seats.iter().map(|seat| seat.orders_rejected).sum()
    }
}

/// Hash a state with the standard hasher.
#[must_use]
pub fn state_hash(state: &GameState) -> u64 {
    let mut hasher = DefaultHasher::new();
    state.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, Default)]
struct SeatCounters {
    submitted: u64,
    rejected: u64,
    warnings: u64,
}

/// Drives a match to completion.
pub struct MatchRunner<R = StandardRules> {
    rules: R,
    state: GameState,
    bots: Vec<Box<dyn Bot + Send>>,
    counters: Vec<SeatCounters>,
    turns: u64,
    max_turns: u64,
    seed: u64,
}

impl MatchRunner {
    /// Generate the map and seat the configured bots.
    pub fn new(config: &MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let state = generate_match(&config.map)?;
        let bots = config
            .seats
            .iter()
            .enumerate()
            .map(|(seat, kind)| kind.build(&config.bot, config.seat_seed(seat as PlayerId)))
            .collect();

        let mut runner = Self::with_parts(StandardRules, state, bots)?;
        runner.seed = config.map.seed;
        Ok(runner)
    }
}

impl<R: RulesEngine> MatchRunner<R> {
    /// Run an existing state with explicit rules and one bot per seat.
    pub fn with_parts(
        rules: R,
        state: GameState,
        bots: Vec<Box<dyn Bot + Send>>,
    ) -> Result<Self, MatchError> {
        let players = state.players().len();
        if bots.len() != players {
            return Err(MatchError::SeatMismatch {
                seats: bots.len(),
                players,
            });
        }
        // Every round gives each seat at most one turn.
        let max_turns = (u64::from(state.round_limit()) + 1) * players as u64;

        Ok(Self {
            rules,
            state,
            bots,
            counters: vec![SeatCounters::default(); players],
            turns: 0,
            max_turns,
            seed: 0,
        })
    }

    /// Current state of the match.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Turns played so far.
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// True once the rules have ended the match.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Let the active seat's bot play one turn.
    pub fn play_turn(&mut self) -> Result<TurnReport, MatchError> {
        let player = self.state.active_player();
        let seat = player as usize;
        let bot = self
            .bots
            .get_mut(seat)
            .ok_or(MatchError::Game(GameError::UnknownPlayer(player)))?;

        let action = bot.handle(&self.state);
        let round = self.state.round();
        let report = self.rules.handle(&mut self.state, &action)?;
        self.turns += 1;

        let counters = &mut self.counters[seat];
        counters.submitted += action.len() as u64;
        counters.rejected += report.rejected.len() as u64;
        counters.warnings += report.warnings.len() as u64;

        if !report.rejected.is_empty() {
            tracing::warn!(
                "{} (player {}) had {}/{} orders rejected in round {}",
                bot.name(),
                player,
                report.rejected.len(),
                action.len(),
                round
            );
        }
        tracing::trace!(
            "Round {} player {}: {} accepted, {} rejected",
            round,
            player,
            report.accepted,
            report.rejected.len()
        );
        Ok(report)
    }

    /// Play until the rules end the match.
    pub fn run(mut self) -> Result<MatchResult, MatchError> {
        tracing::info!(
            "Match {} starting: {}x{} map, {} seats ({})",
            self.seed,
            self.state.map().width(),
            self.state.map().height(),
            self.bots.len(),
            self.bots
                .iter()
                .map(|bot| bot.name())
                .collect::<Vec<_>>()
                .join(" vs ")
        );

        while !self.state.is_finished() {
            if self.turns >= self.max_turns {
                tracing::error!("Match {} stalled after {} turns", self.seed, self.turns);
                return Err(MatchError::Stalled { turns: self.turns });
            }
            self.play_turn()?;
        }

        let result = self.result();
        match &result.winner_bot {
            Some(bot) => tracing::info!(
                "Match {} finished in round {}: player {} ({}) wins",
                result.seed,
                result.rounds,
                result.winner.unwrap_or_default(),
                bot
            ),
            None => tracing::info!(
                "Match {} finished in round {}: draw",
                result.seed,
                result.rounds
            ),
        }
        Ok(result)
    }

    /// Snapshot of the outcome so far.
    #[must_use]
    pub fn result(&self) -> MatchResult {
        let seats: Vec<SeatResult> = self
            .state
            .players()
            .iter()
            .zip(self.bots.iter().zip(&self.counters))
            .map(|(player, (bot, counters))| SeatResult {
                player: player.id,
                bot: bot.name().to_string(),
                score: player.score,
                eliminated: player.eliminated,
                units: self.state.units_of(player.id).count(),
                structures: self.state.structures_of(player.id).count(),
                orders_submitted: counters.submitted,
                orders_rejected: counters.rejected,
                warnings: counters.warnings,
            })
            .collect();

        let winner = self.state.winner();
        let winner_bot =
            winner.and_then(|player| seats.get(player as usize).map(|seat| seat.bot.clone()));

        MatchResult {
            seed: self.seed,
            winner,
            winner_bot,
            rounds: self.state.round().min(self.state.round_limit()),
            turns: self.turns,
            seats,
            final_state_hash: state_hash(&self.state),
        }
    }
}
