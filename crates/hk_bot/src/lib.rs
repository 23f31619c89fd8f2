//! # HunterKiller Bots
//!
//! Turn-based decision makers for HunterKiller seats.
//!
//! [`RulesBot`] is a greedy, rule-priority policy: no search, no learning,
//! no coordination between units beyond the order in which they are
//! decided. Each turn it
//!
//! 1. clones the true state into a working copy,
//! 2. runs the [`spawn`] policy for every owned structure,
//! 3. runs the [`behavior`] chain for every owned unit,
//! 4. returns the accumulated [`Action`](hk_core::order::Action).
//!
//! Every candidate goes through [`commit::try_commit`], so the returned
//! action replays legally against the true state.
//!
//! [`RandomBot`] and [`SlightlyRandomBot`] are baseline opponents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod bot;
pub mod commit;
pub mod config;
pub mod path_cache;
pub mod random;
pub mod spawn;

pub use bot::{Bot, RulesBot};
pub use config::{BotConfig, BotConfigError};
pub use path_cache::PathCache;
pub use random::{RandomBot, SlightlyRandomBot};
