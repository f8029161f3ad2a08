//! # Grid Reachability
//!
//! One breadth-first traversal over the 4-connected grid, parameterised by a
//! blocked-tile predicate. Every reachable set of a level comes from it.

use crate::{CollisionMap, GridBounds, Position, TileSet};
use log::warn;
use ::pathfinding::directed::bfs::bfs_reach;
use serde::{Deserialize, Serialize};

/// Tiles connected to `start` through 4-directional steps over in-bounds,
/// unblocked tiles. `start` itself is always a member.
///
/// # Examples
///
/// ```
/// use questgrid::{flood_fill, GridBounds, Position};
///
/// // A wall down column 2 splits a 5×3 grid.
/// let reached = flood_fill(GridBounds::new(5, 3), Position::new(0, 0), |p| p.x == 2);
/// assert_eq!(reached.len(), 6);
/// assert!(!reached.contains(&Position::new(3, 0)));
/// ```
pub fn flood_fill<F>(bounds: GridBounds, start: Position, is_blocked: F) -> TileSet
where
    F: Fn(Position) -> bool,
{
    bfs_reach(start, |pos: &Position| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|next| bounds.contains(*next) && !is_blocked(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// The reachable region from one start tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    pub start: Position,
    pub tiles: TileSet,
    /// The start tile was solid and was treated as open for this analysis
    pub start_was_solid: bool,
}

impl Reachability {
    pub fn contains(&self, pos: Position) -> bool {
        self.tiles.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Computes reachable regions over a collision map.
pub struct ReachabilityAnalyzer;

impl ReachabilityAnalyzer {
    /// BFS from `start` over the complement of the map's solid tiles.
    ///
    /// Never fails. A solid start tile is treated as open for this call only
    /// and flagged in the result.
    pub fn analyze(map: &CollisionMap, start: Position) -> Reachability {
        let start_was_solid = map.is_solid(start);
        if start_was_solid {
            warn!(
                "Reachability start ({}, {}) is solid; treating it as open",
                start.x, start.y
            );
        }
        let tiles = flood_fill(map.bounds(), start, |pos| map.is_solid(pos));
        Reachability {
            start,
            tiles,
            start_was_solid,
        }
    }
}
