//! # Game Module
//!
//! Level state, quest tracking, and the grid primitives everything else is built on.
//!
//! This module contains:
//! - Tile coordinates, directions and grid bounds
//! - Level descriptors (biome, layout style, features, theme tags)
//! - Quest entities, goal stacks and the quest state machine
//! - The collision map and the per-level session context

pub mod buildings;
pub mod collision;
pub mod entities;
pub mod goals;
pub mod quest;
pub mod state;
pub mod world;

pub use buildings::*;
pub use collision::*;
pub use entities::*;
pub use goals::*;
pub use quest::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Represents a tile coordinate on the level grid.
///
/// A tile carries no payload; its identity is its coordinates. Ordering is
/// lexicographic on `(x, y)`, which is what every deterministic tile scan in
/// the crate relies on.
///
/// # Examples
///
/// ```
/// use questgrid::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// An ordered set of tiles. Iteration order is deterministic.
pub type TileSet = BTreeSet<Position>;

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Calculates the Chebyshev (king-move) distance to another position.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x).abs().max((self.y - other.y).abs()) as u32
    }

    /// True when `other` is this tile or one of its 8 neighbours.
    ///
    /// This is the reach used by every interaction.
    pub fn is_within_reach(self, other: Position) -> bool {
        self.chebyshev_distance(other) <= 1
    }

    /// Returns only the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        vec![
            Position::new(self.x, self.y - 1), // N
            Position::new(self.x - 1, self.y), // W
            Position::new(self.x + 1, self.y), // E
            Position::new(self.x, self.y + 1), // S
        ]
    }

    /// Returns this position shifted one step in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Directions for player movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }
}

/// The rectangular extent of a level grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    /// Creates bounds for a `width` × `height` grid.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Checks if a position lies on the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Clamps a position into the grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::{GridBounds, Position};
    ///
    /// let bounds = GridBounds::new(16, 12);
    /// assert_eq!(bounds.clamp(Position::new(-3, 40)), Position::new(0, 11));
    /// ```
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(0, (self.width - 1).max(0)),
            pos.y.clamp(0, (self.height - 1).max(0)),
        )
    }

    /// The tile at the geometric centre of the grid.
    pub fn center(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    /// Iterates every tile in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAP_WIDTH,
            crate::config::DEFAULT_MAP_HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.x, 5);
        assert_eq!(pos.y, 10);
    }

    #[test]
    fn test_position_distances() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(pos2), 7);
        assert_eq!(pos1.chebyshev_distance(pos2), 4);
    }

    #[test]
    fn test_position_reach() {
        let pos = Position::new(5, 5);
        assert!(pos.is_within_reach(Position::new(5, 5)));
        assert!(pos.is_within_reach(Position::new(6, 6)));
        assert!(!pos.is_within_reach(Position::new(7, 5)));
    }

    #[test]
    fn test_position_cardinal_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.cardinal_adjacent_positions();
        assert_eq!(adjacent.len(), 4);
        assert!(adjacent.contains(&Position::new(5, 4))); // North
        assert!(adjacent.contains(&Position::new(4, 5))); // West
        assert!(!adjacent.contains(&Position::new(4, 4))); // No diagonal
    }

    #[test]
    fn test_position_ordering_is_lexicographic() {
        let mut tiles = vec![
            Position::new(2, 0),
            Position::new(1, 5),
            Position::new(1, 2),
        ];
        tiles.sort();
        assert_eq!(
            tiles,
            vec![Position::new(1, 2), Position::new(1, 5), Position::new(2, 0)]
        );
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
        assert_eq!(pos1.step(Direction::West), Position::new(4, 10));
    }

    #[test]
    fn test_grid_bounds() {
        let bounds = GridBounds::default();
        assert_eq!(bounds.width, 16);
        assert_eq!(bounds.height, 12);
        assert_eq!(bounds.center(), Position::new(8, 6));
        assert!(bounds.contains(Position::new(15, 11)));
        assert!(!bounds.contains(Position::new(16, 0)));
        assert!(!bounds.contains(Position::new(0, -1)));
        assert_eq!(bounds.positions().count(), 192);
        assert_eq!(bounds.positions().nth(16), Some(Position::new(0, 1)));
    }
}
