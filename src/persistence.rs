//! Save files and lifetime statistics
//!
//! Both records are JSON. Loading never fails the game: a missing or broken
//! file yields a fresh session or zeroed stats and a warning in the log.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::field::CellState;
use crate::game::Game;
use crate::piece::{Color, Piece, PieceProvider, Shape};

/// Format version written into every save file
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

// ============================================================================
// Records
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PieceRecord {
    pub shape: Shape,
    pub color: Color,
    pub x: i32,
    pub y: i32,
}

impl From<&Piece> for PieceRecord {
    fn from(piece: &Piece) -> Self {
        Self {
            shape: piece.shape.clone(),
            color: piece.color,
            x: piece.position.x,
            y: piece.position.y,
        }
    }
}

impl From<PieceRecord> for Piece {
    fn from(record: PieceRecord) -> Self {
        Piece::at(record.shape, record.color, record.x, record.y)
    }
}

/// A paused session as written to disk
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub grid: Vec<Vec<CellState>>,
    pub current: PieceRecord,
    pub next: PieceRecord,
    pub score: u32,
}

/// Lifetime statistics across sessions
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stats {
    pub record: u32,
    pub games_played: u32,
}

impl Stats {
    /// Count a finished game. Returns true if `score` beat the record.
    pub fn record_game(&mut self, score: u32) -> bool {
        self.games_played = self.games_played.saturating_add(1);
        if score > self.record {
            self.record = score;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Stores
// ============================================================================

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read_snapshot(&self) -> Result<SessionSnapshot> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read and validate the saved session
    pub fn try_load(&self, config: Config, provider: Box<dyn PieceProvider>) -> Result<Game> {
        Game::restore(config, self.read_snapshot()?, provider)
    }

    /// Restore the saved session, or start a fresh one if there is none or it
    /// cannot be used. Only an invalid `config` is an error.
    pub fn load(&self, config: Config, provider: Box<dyn PieceProvider>) -> Result<Game> {
        config.validate()?;
        if !self.exists() {
            return Game::with_provider(config, provider);
        }
        let snapshot = self
            .read_snapshot()
            .and_then(|snapshot| Game::check_snapshot(&config, &snapshot).map(|_| snapshot));
        match snapshot {
            Ok(snapshot) => Game::restore(config, snapshot, provider),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unusable save file, starting fresh");
                Game::with_provider(config, provider)
            }
        }
    }

    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        write_json(&self.path, snapshot)
    }

    /// Remove the save file if present
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Stats {
        let Ok(bytes) = fs::read(&self.path) else {
            return Stats::default();
        };
        serde_json::from_slice::<Stats>(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "corrupt stats file, starting over");
            Stats::default()
        })
    }

    pub fn save(&self, stats: &Stats) -> Result<()> {
        write_json(&self.path, stats)
    }

    /// Load, count one finished game, and write back
    pub fn record_game(&self, score: u32) -> Result<Stats> {
        let mut stats = self.load();
        stats.record_game(score);
        self.save(&stats)?;
        Ok(stats)
    }
}
