//! Error types for the combat simulation.

use thiserror::Error;

use crate::tree::NodeId;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for all combat simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// The request names a map the catalog does not know.
    #[error("Invalid map ID: {0}")]
    UnknownMap(i32),

    /// A bounded random draw was asked for an empty range.
    #[error("Invalid random range: min {min} must be less than max {max}")]
    InvalidRange {
        /// Inclusive lower bound.
        min: i32,
        /// Exclusive upper bound.
        max: i32,
    },

    /// A component tree operation referenced a node that does not exist.
    #[error("Component node not found: {0}")]
    NodeNotFound(NodeId),

    /// An actor snapshot carries stats the simulation cannot run with.
    #[error("Invalid character snapshot '{name}': {reason}")]
    InvalidSnapshot {
        /// Name of the offending character.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A profile catalog file could not be parsed or failed validation.
    #[error("Failed to load profile catalog '{path}': {message}")]
    CatalogParse {
        /// Path (or `<inline>`) of the catalog source.
        path: String,
        /// Error message.
        message: String,
    },

    /// Binary encoding or decoding of a replay record failed.
    #[error("Replay codec error: {0}")]
    Codec(String),

    /// Reading or writing a replay file failed.
    #[error("Replay IO error: {0}")]
    Io(String),

    /// A replay record was written by an incompatible format version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the record.
        found: u32,
    },
}
