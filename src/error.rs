//! Error types for the game engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors that can occur while configuring, restoring or persisting a game.
///
/// Gameplay itself never fails: blocked moves, full lines and game over are
/// ordinary state transitions.
#[derive(Debug, Error)]
pub enum GameError {
    /// Field dimensions must both be positive
    #[error("Invalid field dimensions: {rows} rows x {cols} columns")]
    InvalidDimensions { rows: usize, cols: usize },

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Saved session data is structurally valid JSON but not a playable state
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Saved data was written by a newer format version
    #[error("Unsupported save format version {found} (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
