use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Sentinel for an entity that is not on the board.
    pub const REMOVED: Position = Position { x: -1, y: -1 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_removed(&self) -> bool {
        *self == Self::REMOVED
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Dimensions of the toroidal board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSize {
    pub width: usize,
    pub height: usize,
}

impl BoardSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Wraps arbitrary coordinates onto the torus.
    pub fn wrap(&self, x: i32, y: i32) -> Position {
        Position {
            x: x.rem_euclid(self.width as i32),
            y: y.rem_euclid(self.height as i32),
        }
    }

    pub fn step(&self, from: Position, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        self.wrap(from.x + dx, from.y + dy)
    }

    pub fn neighbors(&self, pos: Position) -> [Position; 4] {
        Direction::ALL.map(|d| self.step(pos, d))
    }

    /// Row-major index of `pos` after wrapping it onto the board.
    pub fn index(&self, pos: Position) -> usize {
        let wrapped = self.wrap(pos.x, pos.y);
        wrapped.y as usize * self.width + wrapped.x as usize
    }

    pub fn position_of(&self, index: usize) -> Position {
        Position::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position::new(
            rng.gen_range(0..self.width) as i32,
            rng.gen_range(0..self.height) as i32,
        )
    }

    /// Every cell position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let size = *self;
        (0..size.cell_count()).map(move |i| size.position_of(i))
    }
}
