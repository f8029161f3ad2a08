//! # Bridge Crossing Selection
//!
//! Picks the two-tile water span that hosts the repair-bridge goal.
//!
//! Candidates are enumerated by walking water tiles in ascending `(x, y)`
//! order and testing the horizontal span starting there before the vertical
//! one. The first candidate with the highest score wins, so ties go to the
//! span whose lower tile is lexicographically smallest, horizontal first.

use crate::{GridBounds, Position, TileSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Orientation of a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanAxis {
    Horizontal,
    Vertical,
}

/// The selected water span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeCrossing {
    /// The two deck tiles, lower coordinate first
    pub tiles: [Position; 2],
    pub axis: SpanAxis,
    /// `None` for the fixed fallback span
    pub score: Option<i32>,
}

impl BridgeCrossing {
    fn new(start: Position, axis: SpanAxis, score: Option<i32>) -> Self {
        let step = match axis {
            SpanAxis::Horizontal => Position::new(1, 0),
            SpanAxis::Vertical => Position::new(0, 1),
        };
        Self {
            tiles: [start, start + step],
            axis,
            score,
        }
    }

    /// The fixed vertical span at the grid centre.
    pub fn fallback(bounds: GridBounds) -> Self {
        Self::new(bounds.center(), SpanAxis::Vertical, None)
    }

    pub fn is_fallback(&self) -> bool {
        self.score.is_none()
    }

    /// The two land tiles flanking the span.
    pub fn banks(&self) -> [Position; 2] {
        let step = self.tiles[1] - self.tiles[0];
        [self.tiles[0] - step, self.tiles[1] + step]
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.tiles.contains(&pos)
    }

    /// True if `pos` is within interaction reach of either deck tile.
    pub fn is_within_reach(&self, pos: Position) -> bool {
        self.tiles.iter().any(|tile| tile.is_within_reach(pos))
    }

    pub fn tile_set(&self) -> TileSet {
        self.tiles.iter().copied().collect()
    }
}

/// Terrain inputs the selector scores against.
#[derive(Debug, Clone, Copy)]
pub struct CrossingTerrain<'a> {
    pub bounds: GridBounds,
    pub water: &'a TileSet,
    pub path: &'a TileSet,
    /// Solid tiles that are not water (obstacles, reserved entrances)
    pub blocked: &'a TileSet,
}

impl CrossingTerrain<'_> {
    fn is_land(&self, pos: Position) -> bool {
        self.bounds.contains(pos) && !self.water.contains(&pos) && !self.blocked.contains(&pos)
    }
}

/// Scores and selects water crossings.
///
/// # Examples
///
/// ```
/// use questgrid::{BridgeCrossingSelector, CrossingTerrain, GridBounds, Position, TileSet};
///
/// let bounds = GridBounds::new(16, 12);
/// // A two-wide river down columns 7 and 8.
/// let water: TileSet = (0..12)
///     .flat_map(|y| [Position::new(7, y), Position::new(8, y)])
///     .collect();
/// let path = TileSet::new();
/// let blocked = TileSet::new();
/// let reachable: TileSet = (0..12).flat_map(|y| (0..7).map(move |x| Position::new(x, y))).collect();
///
/// let terrain = CrossingTerrain { bounds, water: &water, path: &path, blocked: &blocked };
/// let crossing = BridgeCrossingSelector::select(&terrain, &reachable, Position::new(3, 6));
/// assert_eq!(crossing.tiles, [Position::new(7, 6), Position::new(8, 6)]);
/// ```
pub struct BridgeCrossingSelector;

impl BridgeCrossingSelector {
    /// Every admissible span in discovery order.
    ///
    /// A span is two water tiles in a row whose flanking tiles are both land,
    /// with at least one bank reachable. Score is 2 per bank on a path minus
    /// the spawn's distance from the span along the perpendicular axis.
    pub fn candidates(
        terrain: &CrossingTerrain<'_>,
        reachable: &TileSet,
        spawn: Position,
    ) -> Vec<BridgeCrossing> {
        let mut found = Vec::new();
        for &start in terrain.water {
            for axis in [SpanAxis::Horizontal, SpanAxis::Vertical] {
                let span = BridgeCrossing::new(start, axis, None);
                if !terrain.water.contains(&span.tiles[1]) {
                    continue;
                }
                let banks = span.banks();
                if !banks.iter().all(|bank| terrain.is_land(*bank)) {
                    continue;
                }
                if !banks.iter().any(|bank| reachable.contains(bank)) {
                    continue;
                }
                let path_bonus = 2 * banks.iter().filter(|bank| terrain.path.contains(*bank)).count() as i32;
                let offset = match axis {
                    SpanAxis::Horizontal => (start.y - spawn.y).abs(),
                    SpanAxis::Vertical => (start.x - spawn.x).abs(),
                };
                found.push(BridgeCrossing {
                    score: Some(path_bonus - offset),
                    ..span
                });
            }
        }
        found
    }

    /// The best admissible span, or the fixed centre span if none exists.
    pub fn select(terrain: &CrossingTerrain<'_>, reachable: &TileSet, spawn: Position) -> BridgeCrossing {
        let mut best: Option<BridgeCrossing> = None;
        for candidate in Self::candidates(terrain, reachable, spawn) {
            let better = match &best {
                Some(current) => candidate.score > current.score,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(crossing) => {
                debug!(
                    "Bridge span {:?} at ({}, {}) scored {:?}",
                    crossing.axis, crossing.tiles[0].x, crossing.tiles[0].y, crossing.score
                );
                crossing
            }
            None => {
                let crossing = BridgeCrossing::fallback(terrain.bounds);
                warn!(
                    "No admissible water crossing; using fallback span at ({}, {})",
                    crossing.tiles[0].x, crossing.tiles[0].y
                );
                crossing
            }
        }
    }
}
