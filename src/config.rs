//! Game configuration

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GameError, Result};

pub const DEFAULT_COLS: usize = 10;
pub const DEFAULT_ROWS: usize = 20;
pub const DEFAULT_FALL_SPEED_MS: u64 = 500;
pub const DEFAULT_LINE_SCORE: u32 = 100;

// Largest extent of any canonical shape in either orientation
const MIN_EXTENT: usize = 4;

/// Largest accepted field dimension
pub const MAX_EXTENT: usize = 1000;

/// Field size, gravity cadence and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Number of columns in the field
    pub cols: usize,

    /// Number of rows in the field
    pub rows: usize,

    /// Play time between gravity steps, in milliseconds
    pub fall_speed_ms: u64,

    /// Points awarded per cleared line
    pub line_score: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            fall_speed_ms: DEFAULT_FALL_SPEED_MS,
            line_score: DEFAULT_LINE_SCORE,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Config = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cols(mut self, cols: usize) -> Self {
        self.cols = cols;
        self
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_fall_speed_ms(mut self, fall_speed_ms: u64) -> Self {
        self.fall_speed_ms = fall_speed_ms;
        self
    }

    pub fn with_line_score(mut self, line_score: u32) -> Self {
        self.line_score = line_score;
        self
    }

    pub fn fall_speed(&self) -> Duration {
        Duration::from_millis(self.fall_speed_ms)
    }

    /// Reject configurations no game can be played on.
    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(GameError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.cols < MIN_EXTENT || self.rows < MIN_EXTENT {
            return Err(GameError::InvalidConfig(format!(
                "field must be at least {MIN_EXTENT}x{MIN_EXTENT} to hold every piece, got {}x{}",
                self.cols, self.rows
            )));
        }
        if self.cols > MAX_EXTENT || self.rows > MAX_EXTENT {
            return Err(GameError::InvalidConfig(format!(
                "field must be at most {MAX_EXTENT}x{MAX_EXTENT}, got {}x{}",
                self.cols, self.rows
            )));
        }
        if self.fall_speed_ms == 0 {
            return Err(GameError::InvalidConfig(
                "fall speed must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
