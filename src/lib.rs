//! Falling-block puzzle engine: pieces, the locked-cell field, and the
//! session state machine that drives them. Rendering, input and the frame
//! clock live in the binary; the library performs no terminal I/O.

pub mod config;
pub mod error;
pub mod field;
pub mod game;
pub mod persistence;
pub mod piece;

pub use config::Config;
pub use error::{GameError, Result};
pub use field::{CellState, Field};
pub use game::{Command, Flow, Game, GameEvent, GameState};
pub use persistence::{SessionSnapshot, SessionStore, Stats, StatsStore};
pub use piece::{Color, Piece, PieceProvider, Shape, TetrominoType};
