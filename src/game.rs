use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{GameError, Result};
use crate::field::{CellState, Field};
use crate::persistence::{SessionSnapshot, Stats, SNAPSHOT_VERSION};
use crate::piece::{Piece, PieceProvider, Position, RandomPieceProvider};

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    LinesCleared(u32),
    ScoreChanged(u32),
    Paused,
    Unpaused,
    GameRestarted,
    GameOver { score: u32, new_record: bool },
}

/// Everything an input adapter can ask of a session
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    TogglePause,
    Save,
    Restart,
    ReturnToMenu,
    Quit,
    /// Dismiss the game-over screen
    Acknowledge,
    /// Elapsed play time since the previous tick
    GravityTick(Duration),
}

/// External effect the adapter should perform after a command
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Save,
    ReturnToMenu,
    Quit,
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    pub field: Field,
    pub current_piece: Piece,
    pub next_piece: Piece,
    pub score: u32,
    pub state: GameState,
    pub stats: Stats,
    config: Config,
    fall_accumulator: Duration,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_provider(config, Box::new(RandomPieceProvider::new()))
    }

    pub fn with_provider(config: Config, mut provider: Box<dyn PieceProvider>) -> Result<Self> {
        config.validate()?;
        let field = Field::new(config.rows, config.cols)?;
        let current_piece = provider.next_piece(config.cols);
        let next_piece = provider.next_piece(config.cols);
        Ok(Self::from_parts(
            config,
            field,
            current_piece,
            next_piece,
            0,
            provider,
        ))
    }

    /// Session over an existing field, with the default scoring and cadence.
    pub fn with_field(field: Field, current_piece: Piece) -> Self {
        let config = Config::default()
            .with_rows(field.rows())
            .with_cols(field.cols());
        let mut provider = RandomPieceProvider::new();
        let next_piece = provider.next_piece(config.cols);
        Self::from_parts(
            config,
            field,
            current_piece,
            next_piece,
            0,
            Box::new(provider),
        )
    }

    /// Rebuild a session from saved data. Fails if the snapshot does not fit
    /// `config` or does not describe a playable position.
    pub fn restore(
        config: Config,
        snapshot: SessionSnapshot,
        provider: Box<dyn PieceProvider>,
    ) -> Result<Self> {
        let field = Self::check_snapshot(&config, &snapshot)?;
        Ok(Self::from_parts(
            config,
            field,
            Piece::from(snapshot.current),
            Piece::from(snapshot.next),
            snapshot.score,
            provider,
        ))
    }

    /// Validate saved data against `config`, returning the field it describes.
    pub fn check_snapshot(config: &Config, snapshot: &SessionSnapshot) -> Result<Field> {
        config.validate()?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(GameError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        let field = Field::from_grid(snapshot.grid.clone())?;
        if field.rows() != config.rows || field.cols() != config.cols {
            return Err(GameError::InvalidSnapshot(format!(
                "saved field is {}x{}, configured field is {}x{}",
                field.cols(),
                field.rows(),
                config.cols,
                config.rows
            )));
        }
        let current = Piece::from(snapshot.current.clone());
        let next = Piece::from(snapshot.next.clone());
        Self::check_piece_bounds("current", &current, config)?;
        Self::check_piece_bounds("next", &next, config)?;
        if !field.fits(&current) {
            return Err(GameError::InvalidSnapshot(
                "current piece overlaps the stack".to_string(),
            ));
        }
        Ok(field)
    }

    /// A saved piece must sit within one field width of the walls and no
    /// higher than its own height above the top edge.
    fn check_piece_bounds(name: &str, piece: &Piece, config: &Config) -> Result<()> {
        let Position { x, y } = piece.position;
        let height = piece.shape.height() as i64;
        let x_ok = i64::from(x).abs() <= config.cols as i64;
        let y_ok = (-height..config.rows as i64).contains(&i64::from(y));
        if x_ok && y_ok {
            Ok(())
        } else {
            Err(GameError::InvalidSnapshot(format!(
                "{name} piece at ({x}, {y}) is outside a {}x{} field",
                config.cols, config.rows
            )))
        }
    }

    fn from_parts(
        config: Config,
        field: Field,
        current_piece: Piece,
        next_piece: Piece,
        score: u32,
        piece_provider: Box<dyn PieceProvider>,
    ) -> Self {
        Self {
            field,
            current_piece,
            next_piece,
            score,
            state: GameState::Playing,
            stats: Stats::default(),
            config,
            fall_accumulator: Duration::ZERO,
            piece_provider,
            events: Vec::new(),
        }
    }

    /// Carry lifetime stats into this session
    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Play time accumulated since the last gravity step
    pub fn fall_accumulator(&self) -> Duration {
        self.fall_accumulator
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Apply one command. Gameplay commands outside `Playing` are ignored.
    pub fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::MoveLeft => {
                self.move_piece(-1, 0);
            }
            Command::MoveRight => {
                self.move_piece(1, 0);
            }
            Command::SoftDrop => {
                self.soft_drop();
            }
            Command::Rotate => {
                self.rotate_piece();
            }
            Command::TogglePause => self.toggle_pause(),
            Command::GravityTick(elapsed) => self.advance(elapsed),
            Command::Save if self.state == GameState::Paused => return Flow::Save,
            Command::Save => {}
            Command::Restart => self.restart(),
            Command::Acknowledge if self.state == GameState::GameOver => {
                return Flow::ReturnToMenu
            }
            Command::Acknowledge => {}
            Command::ReturnToMenu => return Flow::ReturnToMenu,
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let moved = self.current_piece.moved(dx, dy);
        if self.field.fits(&moved) {
            self.current_piece = moved;
            self.events.push(GameEvent::PieceMoved);
            true
        } else {
            false
        }
    }

    /// One step down; a blocked drop is left for the next gravity step to lock.
    pub fn soft_drop(&mut self) -> bool {
        self.move_piece(0, 1)
    }

    /// Rotate in place. No kicks: a rotation that does not fit at the current
    /// position is discarded.
    pub fn rotate_piece(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        let rotated = self.current_piece.rotated();
        if self.field.fits(&rotated) {
            self.current_piece = rotated;
            self.events.push(GameEvent::PieceRotated);
            true
        } else {
            false
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => {
                self.state = GameState::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameState::Paused => {
                self.state = GameState::Playing;
                self.events.push(GameEvent::Unpaused);
            }
            GameState::GameOver => {
                // Cannot pause when game is over
            }
        }
    }

    /// Feed elapsed play time. Once the accumulated time exceeds the fall
    /// speed, a single gravity step runs and the accumulator starts over.
    pub fn advance(&mut self, elapsed: Duration) {
        if self.state != GameState::Playing {
            return;
        }
        self.fall_accumulator += elapsed;
        if self.fall_accumulator > self.config.fall_speed() {
            self.fall_accumulator = Duration::ZERO;
            self.tick();
        }
    }

    /// One gravity step: fall by one row, or lock and bring in the next piece.
    pub fn tick(&mut self) {
        if self.state != GameState::Playing {
            return;
        }

        if !self.move_piece(0, 1) {
            self.lock_and_spawn();
        }
    }

    pub fn restart(&mut self) {
        self.field.reset();
        self.score = 0;
        self.state = GameState::Playing;
        self.fall_accumulator = Duration::ZERO;
        self.events.clear();

        let cols = self.config.cols;
        self.current_piece = self.piece_provider.next_piece(cols);
        self.next_piece = self.piece_provider.next_piece(cols);

        info!("game restarted");
        self.events.push(GameEvent::GameRestarted);
    }

    // ------------------------------------------------------------------------
    // Turn cycle
    // ------------------------------------------------------------------------

    fn lock_and_spawn(&mut self) {
        self.field.merge(&self.current_piece);
        self.events.push(GameEvent::PieceLocked);
        debug!(
            x = self.current_piece.position.x,
            y = self.current_piece.position.y,
            "piece locked"
        );

        let lines = self.field.clear_lines();
        if lines > 0 {
            self.add_score(lines);
        }

        self.fall_accumulator = Duration::ZERO;
        self.spawn_next_piece();
    }

    /// Flat scoring: every cleared line is worth the configured line score.
    pub fn add_score(&mut self, lines: u32) {
        self.score = self
            .score
            .saturating_add(lines.saturating_mul(self.config.line_score));
        self.events.push(GameEvent::LinesCleared(lines));
        self.events.push(GameEvent::ScoreChanged(self.score));
    }

    /// Promote the preview piece and draw a new preview. The session ends if
    /// the promoted piece does not fit where it spawned.
    pub fn spawn_next_piece(&mut self) {
        let upcoming = self.piece_provider.next_piece(self.config.cols);
        self.current_piece = std::mem::replace(&mut self.next_piece, upcoming);

        if !self.field.fits(&self.current_piece) {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.state = GameState::GameOver;
        let new_record = self.stats.record_game(self.score);
        info!(
            score = self.score,
            record = self.stats.record,
            games_played = self.stats.games_played,
            "game over"
        );
        self.events.push(GameEvent::GameOver {
            score: self.score,
            new_record,
        });
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Capture the session for the persistence adapter
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            grid: self.field.grid().to_vec(),
            current: (&self.current_piece).into(),
            next: (&self.next_piece).into(),
            score: self.score,
        }
    }

    /// Returns the visual grid state with the current piece overlaid
    pub fn render_grid(&self) -> Vec<Vec<CellState>> {
        let mut visual_grid = self.field.grid().to_vec();
        if self.state == GameState::GameOver {
            return visual_grid;
        }

        for block in self.current_piece.blocks() {
            if block.y >= 0
                && block.y < self.field.rows() as i32
                && block.x >= 0
                && block.x < self.field.cols() as i32
            {
                visual_grid[block.y as usize][block.x as usize] =
                    CellState::Filled(self.current_piece.color);
            }
        }

        visual_grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Check if game is over
    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }
}
