//! Error types for the game model and match handling.

use thiserror::Error;

use crate::entity::PlayerId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for state construction and match handling.
///
/// Per-order rule violations are not reported through this type; see
/// [`crate::rules::OrderError`].
#[derive(Debug, Error)]
pub enum GameError {
    /// Map dimensions or tile data are unusable.
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// A location lies outside the map.
    #[error("Location ({x}, {y}) is outside the map")]
    OutOfBounds {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// A location is already taken by a wall, structure or unit.
    #[error("Location ({x}, {y}) is occupied")]
    Occupied {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// A player id does not belong to this match.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// An action was submitted by a player who is not currently active.
    #[error("Action submitted by player {submitted} but player {active} is active")]
    WrongPlayer {
        /// Player named in the action.
        submitted: PlayerId,
        /// Player whose turn it is.
        active: PlayerId,
    },

    /// The match has already finished.
    #[error("Match is already finished")]
    MatchFinished,

    /// Failed to read a data file.
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}
