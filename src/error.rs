//! Gameplay error types.
//!
//! Lookups and purchases return these instead of panicking so that systems
//! can log a diagnostic and keep the frame going with a stale or default
//! value.
//!
//! ## Usage
//!
//! ```rust
//! use ascent::error::{GameError, GameResult};
//!
//! fn first_height(heights: &[f32]) -> GameResult<f32> {
//!     heights.first().copied().ok_or(GameError::NoRegions)
//! }
//! ```

use crate::characteristics::Characteristic;
use std::fmt;

/// Top-level error enum for the flight core.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// A region lookup was made against a catalog with no regions.
    NoRegions,

    /// The characteristic is not configured in the table that was queried.
    UnknownCharacteristic {
        /// The key that was looked up.
        characteristic: Characteristic,
    },

    /// A per-level lookup used a level past the end of the configured arrays.
    LevelOutOfRange {
        characteristic: Characteristic,
        /// Level that was requested.
        level: u32,
        /// Highest valid level for this characteristic.
        max_level: u32,
    },

    /// An upgrade was requested for a characteristic already at its last level.
    MaxLevelReached { characteristic: Characteristic },

    /// The next level has a value but no configured price.
    MissingCost { characteristic: Characteristic, level: u32 },

    /// The wallet could not cover the upgrade price.
    InsufficientFunds {
        /// Price of the next level.
        cost: u32,
    },

    /// A configuration file could not be parsed.
    Config {
        /// Path of the file (for logging).
        path: String,
        /// Parser message.
        reason: String,
    },

    /// A save profile could not be read, decoded, or written.
    Save { reason: String },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::NoRegions => write!(f, "region catalog is empty"),
            GameError::UnknownCharacteristic { characteristic } => {
                write!(f, "characteristic {:?} is not configured", characteristic)
            }
            GameError::LevelOutOfRange {
                characteristic,
                level,
                max_level,
            } => write!(
                f,
                "level {} for {:?} is out of range (max level {})",
                level, characteristic, max_level
            ),
            GameError::MaxLevelReached { characteristic } => {
                write!(f, "{:?} is already at its maximum level", characteristic)
            }
            GameError::MissingCost {
                characteristic,
                level,
            } => write!(f, "no cost configured for {:?} level {}", characteristic, level),
            GameError::InsufficientFunds { cost } => {
                write!(f, "not enough coins for upgrade (cost {})", cost)
            }
            GameError::Config { path, reason } => {
                write!(f, "failed to parse {}: {}", path, reason)
            }
            GameError::Save { reason } => write!(f, "save profile error: {}", reason),
        }
    }
}

impl std::error::Error for GameError {}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;
