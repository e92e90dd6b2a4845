use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ============================================================================
// Colors
// ============================================================================

/// RGB color of a piece and of the cells it leaves behind.
///
/// Serialized as a `[r, g, b]` array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

pub const CYAN: Color = Color(0, 255, 255);
pub const BLUE: Color = Color(0, 0, 255);
pub const ORANGE: Color = Color(255, 165, 0);
pub const YELLOW: Color = Color(255, 255, 0);
pub const GREEN: Color = Color(0, 255, 0);
pub const PURPLE: Color = Color(128, 0, 128);
pub const RED: Color = Color(255, 0, 0);

/// Colors a spawned piece may take. Chosen independently of the shape.
pub const PALETTE: [Color; 7] = [CYAN, BLUE, ORANGE, YELLOW, GREEN, PURPLE, RED];

// ============================================================================
// Shapes
// ============================================================================

/// Rectangular occupancy matrix of a piece, `true` = occupied.
///
/// A shape is never empty and never ragged; deserialization enforces both and
/// rejects cell values other than 0 and 1.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    /// Build a shape from boolean rows. Returns `None` for empty, ragged or
    /// fully unoccupied matrices.
    pub fn new(rows: Vec<Vec<bool>>) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        if !rows.iter().flatten().any(|&cell| cell) {
            return None;
        }
        Some(Self { rows })
    }

    fn from_bits<const W: usize, const H: usize>(bits: [[u8; W]; H]) -> Self {
        Self {
            rows: bits
                .iter()
                .map(|row| row.iter().map(|&b| b != 0).collect())
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Occupied cells as `(row, col)` offsets from the top-left corner
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell)
                .map(move |(c, _)| (r, c))
        })
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Quarter turn clockwise: transpose, then reverse every row.
    ///
    /// No recentering happens; the result stays anchored at the same corner.
    pub fn rotated(&self) -> Self {
        let height = self.height();
        let rows = (0..self.width())
            .map(|c| (0..height).rev().map(|r| self.rows[r][c]).collect())
            .collect();
        Self { rows }
    }
}

impl TryFrom<Vec<Vec<u8>>> for Shape {
    type Error = String;

    fn try_from(bits: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        if bits.iter().flatten().any(|&b| b > 1) {
            return Err("shape cells must be 0 or 1".to_string());
        }
        let rows = bits
            .into_iter()
            .map(|row| row.into_iter().map(|b| b == 1).collect())
            .collect();
        Shape::new(rows).ok_or_else(|| {
            "shape must be a non-empty rectangle with at least one occupied cell".to_string()
        })
    }
}

impl From<Shape> for Vec<Vec<u8>> {
    fn from(shape: Shape) -> Self {
        shape
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(u8::from).collect())
            .collect()
    }
}

// ============================================================================
// Tetromino Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TetrominoType {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::O,
        TetrominoType::T,
        TetrominoType::S,
        TetrominoType::Z,
        TetrominoType::J,
        TetrominoType::L,
    ];

    /// Spawn orientation, anchored at the top-left of its bounding box
    pub fn shape(&self) -> Shape {
        match self {
            TetrominoType::I => Shape::from_bits([[1, 1, 1, 1]]),
            TetrominoType::O => Shape::from_bits([[1, 1], [1, 1]]),
            TetrominoType::T => Shape::from_bits([[0, 1, 0], [1, 1, 1]]),
            TetrominoType::S => Shape::from_bits([[1, 1, 0], [0, 1, 1]]),
            TetrominoType::Z => Shape::from_bits([[0, 1, 1], [1, 1, 0]]),
            TetrominoType::J => Shape::from_bits([[1, 0, 0], [1, 1, 1]]),
            TetrominoType::L => Shape::from_bits([[0, 0, 1], [1, 1, 1]]),
        }
    }

    /// Conventional color for this kind, used where a deterministic color is
    /// wanted (fixed sequences, previews).
    pub fn color(&self) -> Color {
        match self {
            TetrominoType::I => CYAN,
            TetrominoType::O => YELLOW,
            TetrominoType::T => PURPLE,
            TetrominoType::S => GREEN,
            TetrominoType::Z => RED,
            TetrominoType::J => BLUE,
            TetrominoType::L => ORANGE,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

// ============================================================================
// Pieces
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A falling tetromino: shape, color and the field position of its
/// bounding box's top-left corner. `y` may be negative above the field.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    pub shape: Shape,
    pub color: Color,
    pub position: Position,
}

impl Piece {
    /// A piece of `kind` centered horizontally on a field `cols` wide, at the top.
    pub fn new(kind: TetrominoType, color: Color, cols: usize) -> Self {
        let shape = kind.shape();
        let x = (cols / 2) as i32 - (shape.width() / 2) as i32;
        Self::at(shape, color, x, 0)
    }

    pub fn at(shape: Shape, color: Color, x: i32, y: i32) -> Self {
        Self {
            shape,
            color,
            position: Position { x, y },
        }
    }

    /// Random shape and random palette color, both uniform.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, cols: usize) -> Self {
        let kind = TetrominoType::random(rng);
        let color = *PALETTE.choose(rng).unwrap_or(&CYAN);
        Self::new(kind, color, cols)
    }

    /// Field coordinates `(x, y)` of every occupied cell
    pub fn blocks(&self) -> impl Iterator<Item = Position> + '_ {
        self.shape.cells().map(move |(r, c)| Position {
            x: self.position.x + c as i32,
            y: self.position.y + r as i32,
        })
    }

    pub fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated(),
            color: self.color,
            position: self.position,
        }
    }

    pub fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            shape: self.shape.clone(),
            color: self.color,
            position: Position {
                x: self.position.x + dx,
                y: self.position.y + dy,
            },
        }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

/// Source of upcoming pieces
pub trait PieceProvider {
    fn next_piece(&mut self, cols: usize) -> Piece;
}

/// Uniformly random shapes and colors
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible piece sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self, cols: usize) -> Piece {
        Piece::spawn(&mut self.rng, cols)
    }
}

/// Cycles through a fixed list of kinds, each in its conventional color
pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self, cols: usize) -> Piece {
        let kind = if self.pieces.is_empty() {
            TetrominoType::O
        } else {
            self.pieces[self.index % self.pieces.len()]
        };
        self.index += 1;
        Piece::new(kind, kind.color(), cols)
    }
}
