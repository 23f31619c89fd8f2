//! Tunable bot parameters loaded from RON.

use std::path::Path;

use hk_core::entity::UnitType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for bot configuration.
#[derive(Error, Debug)]
pub enum BotConfigError {
    /// File not found.
    #[error("Bot config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read bot config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse bot config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but unusable.
    #[error("Invalid bot config: {0}")]
    Invalid(String),
}

/// Policy knobs for [`crate::RulesBot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Spawn preference when unit counts tie. Must name every unit type once.
    pub spawn_priority: Vec<UnitType>,
    /// An area special is only used when it catches more enemy units than this.
    pub special_attack_baseline: usize,
    /// Seed for the bot's random choices.
    pub seed: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            spawn_priority: vec![UnitType::Infected, UnitType::Medic, UnitType::Soldier],
            special_attack_baseline: 1,
            seed: 0,
        }
    }
}

impl BotConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BotConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BotConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, BotConfigError> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Use a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that the priority list is a permutation of all unit types.
    pub fn validate(&self) -> Result<(), BotConfigError> {
        if self.spawn_priority.len() != UnitType::ALL.len() {
            return Err(BotConfigError::Invalid(format!(
                "spawn_priority must list {} unit types, got {}",
                UnitType::ALL.len(),
                self.spawn_priority.len()
            )));
        }
        for unit_type in UnitType::ALL {
            if !self.spawn_priority.contains(&unit_type) {
                return Err(BotConfigError::Invalid(format!(
                    "spawn_priority is missing {unit_type:?}"
                )));
            }
        }
        Ok(())
    }
}
