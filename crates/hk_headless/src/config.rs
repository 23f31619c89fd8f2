//! Match configuration: which map, which bots, which seeds.
//!
//! Configurations are RON files. Every field has a default, so a file only
//! needs to name what it changes:
//!
//! ```ron
//! (
//!     map: (width: 20, height: 20, seed: 7),
//!     seats: [Rules, SlightlyRandom],
//!     bot: (special_attack_baseline: 2),
//! )
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use hk_bot::{Bot, BotConfig, BotConfigError, RandomBot, RulesBot, SlightlyRandomBot};
use hk_core::entity::PlayerId;
use hk_core::error::GameError;
use hk_core::map_generation::MapConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Multiplier spreading map seeds apart before seat offsets are added.
const SEAT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Error type for match setup and execution.
#[derive(Error, Debug)]
pub enum MatchError {
    /// File not found.
    #[error("Match config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read match config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse match config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Map generation or rule handling failed.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The shared bot configuration is unusable.
    #[error(transparent)]
    Bot(#[from] BotConfigError),
    /// Bot name on the command line or in a file is not known.
    #[error("Unknown bot kind '{0}' (expected rules, random or slightly_random)")]
    UnknownBot(String),
    /// One bot is needed per seat.
    #[error("{seats} bots configured for {players} players")]
    SeatMismatch {
        /// Bots configured.
        seats: usize,
        /// Seats on the map.
        players: usize,
    },
    /// The match did not finish within the turn bound.
    #[error("Match did not finish after {turns} turns")]
    Stalled {
        /// Turns played before giving up.
        turns: u64,
    },
    /// Results could not be serialized.
    #[error("Failed to write results: {0}")]
    Output(#[from] serde_json::Error),
}

/// The bots a seat can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BotKind {
    /// [`RulesBot`], the rule-priority policy.
    Rules,
    /// [`RandomBot`], uniformly random legal orders.
    Random,
    /// [`SlightlyRandomBot`], random orders filtered for sense.
    SlightlyRandom,
}

impl BotKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 3] = [Self::Rules, Self::Random, Self::SlightlyRandom];

    /// Short name used on the command line and in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Random => "random",
            Self::SlightlyRandom => "slightly_random",
        }
    }

    /// Instantiate a bot of this kind.
    ///
    /// `config` only affects [`BotKind::Rules`]; its seed is replaced by `seed`.
    #[must_use]
    pub fn build(self, config: &BotConfig, seed: u64) -> Box<dyn Bot + Send> {
        match self {
            Self::Rules => Box::new(RulesBot::new(config.clone().with_seed(seed))),
            Self::Random => Box::new(RandomBot::new(seed)),
            Self::SlightlyRandom => Box::new(SlightlyRandomBot::new(seed)),
        }
    }
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BotKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "rules" | "rules_bot" => Ok(Self::Rules),
            "random" | "random_bot" => Ok(Self::Random),
            "slightly_random" | "slightly_random_bot" => Ok(Self::SlightlyRandom),
            _ => Err(MatchError::UnknownBot(s.to_string())),
        }
    }
}

/// Everything needed to set up one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Map generation parameters; the map seed identifies the match.
    pub map: MapConfig,
    /// Bot for each seat, in seat order.
    pub seats: Vec<BotKind>,
    /// Parameters shared by every [`BotKind::Rules`] seat.
    pub bot: BotConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            seats: vec![BotKind::Rules, BotKind::SlightlyRandom],
            bot: BotConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MatchError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MatchError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, MatchError> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Use a different map seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.map.seed = seed;
        self
    }

    /// Replace the seat list. The map's player count follows it.
    #[must_use]
    pub fn with_seats(mut self, seats: Vec<BotKind>) -> Self {
        self.map = self.map.with_players(seats.len() as u32);
        self.seats = seats;
        self
    }

    /// Seed for the bot in `seat`. Distinct per seat and per map seed.
    #[must_use]
    pub fn seat_seed(&self, seat: PlayerId) -> u64 {
        self.map
            .seed
            .wrapping_mul(SEAT_SEED_STRIDE)
            .wrapping_add(self.bot.seed)
            .wrapping_add(u64::from(seat))
    }

    /// Check that a match can be started from this configuration.
    pub fn validate(&self) -> Result<(), MatchError> {
        self.map.validate()?;
        self.bot.validate()?;
        if self.seats.len() != self.map.players as usize {
            return Err(MatchError::SeatMismatch {
                seats: self.seats.len(),
                players: self.map.players as usize,
            });
        }
        Ok(())
    }
}
