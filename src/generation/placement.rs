//! # Entity Placement
//!
//! Moves quest entities onto tiles that are reachable from spawn, not solid,
//! and not already taken by another entity.

use super::GenerationConfig;
use crate::utils::{flood_fill, square_box};
use crate::{GridBounds, Position, TileSet};
use log::{debug, warn};

/// Finds a free, reachable tile near a preferred one.
///
/// # Examples
///
/// ```
/// use questgrid::{EntityPlacementResolver, GridBounds, Position, TileSet};
///
/// let bounds = GridBounds::new(16, 12);
/// let reachable: TileSet = bounds.positions().collect();
/// let solid: TileSet = [Position::new(5, 4)].into_iter().collect();
/// let occupied = TileSet::new();
///
/// let resolver = EntityPlacementResolver::new(bounds, 12);
/// let tile = resolver.resolve(Position::new(5, 4), &reachable, &occupied, &solid);
/// assert_eq!(tile, Position::new(4, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityPlacementResolver {
    bounds: GridBounds,
    search_radius: i32,
    open_tile_radius: i32,
}

impl EntityPlacementResolver {
    pub fn new(bounds: GridBounds, search_radius: i32) -> Self {
        Self {
            bounds,
            search_radius,
            open_tile_radius: crate::config::OPEN_TILE_SEARCH_RADIUS,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            bounds: config.bounds(),
            search_radius: config.placement_search_radius,
            open_tile_radius: config.open_tile_search_radius,
        }
    }

    /// Returns `preferred` if it is reachable, not solid and not occupied.
    /// Otherwise scans boxes of radius 1 up to the search radius in row-major
    /// order, then the whole reachable set in order, and finally gives up and
    /// returns `preferred` unchanged.
    pub fn resolve(
        &self,
        preferred: Position,
        reachable: &TileSet,
        occupied: &TileSet,
        solid: &TileSet,
    ) -> Position {
        let is_free =
            |pos: &Position| reachable.contains(pos) && !solid.contains(pos) && !occupied.contains(pos);

        if is_free(&preferred) {
            return preferred;
        }

        for radius in 1..=self.search_radius {
            if let Some(found) = square_box(preferred, radius, self.bounds).find(is_free) {
                debug!(
                    "Placement ({}, {}) moved to ({}, {}) at radius {}",
                    preferred.x, preferred.y, found.x, found.y, radius
                );
                return found;
            }
        }

        if let Some(found) = reachable.iter().copied().find(is_free) {
            debug!(
                "Placement ({}, {}) fell back to reachable tile ({}, {})",
                preferred.x, preferred.y, found.x, found.y
            );
            return found;
        }

        warn!(
            "No free reachable tile for ({}, {}); keeping it",
            preferred.x, preferred.y
        );
        preferred
    }

    /// Nearest in-bounds tile that is not solid, within the open-tile radius.
    /// Returns `pos` itself if it is open or nothing nearby is.
    pub fn nearest_open(&self, pos: Position, solid: &TileSet) -> Position {
        if !solid.contains(&pos) {
            return pos;
        }
        (1..=self.open_tile_radius)
            .find_map(|radius| {
                square_box(pos, radius, self.bounds).find(|candidate| !solid.contains(candidate))
            })
            .unwrap_or(pos)
    }

    /// Full placement of one entity: clamp into the grid, pre-search for an
    /// open tile, resolve, then record the result in `occupied`.
    pub fn place(
        &self,
        requested: Position,
        reachable: &TileSet,
        occupied: &mut TileSet,
        solid: &TileSet,
    ) -> Position {
        let open = self.nearest_open(self.clamp_logged(requested), solid);
        let tile = self.resolve(open, reachable, occupied, solid);
        occupied.insert(tile);
        tile
    }

    /// Placement of an entity that blocks movement once it stands.
    ///
    /// Candidates come in the same order as [`place`](Self::place), but a
    /// tile is skipped if blocking it would cut any tile of `open` off from
    /// `start`, or leave one of `anchors` (or the new tile itself) without a
    /// walkable cardinal neighbour. The chosen tile joins `occupied` and
    /// `solid`, and `open` shrinks to what `start` still reaches.
    ///
    /// When every free candidate cuts the grid the first free one is taken
    /// anyway.
    pub fn place_blocking(
        &self,
        requested: Position,
        start: Position,
        anchors: &[Position],
        open: &mut TileSet,
        occupied: &mut TileSet,
        solid: &mut TileSet,
    ) -> Position {
        let preferred = self.nearest_open(self.clamp_logged(requested), solid);
        let has_open_neighbour = |tiles: &TileSet, pos: &Position| {
            pos.cardinal_adjacent_positions()
                .iter()
                .any(|next| tiles.contains(next))
        };
        let served: Vec<Position> = anchors
            .iter()
            .filter(|anchor| has_open_neighbour(&*open, *anchor))
            .copied()
            .collect();

        let mut skipped = occupied.clone();
        let tile = loop {
            let tile = self.resolve(preferred, open, &skipped, solid);
            if !open.contains(&tile) || solid.contains(&tile) || skipped.contains(&tile) {
                let fallback = self.resolve(preferred, open, occupied, solid);
                warn!(
                    "Every free tile near ({}, {}) cuts the level apart; using ({}, {})",
                    preferred.x, preferred.y, fallback.x, fallback.y
                );
                break fallback;
            }

            let remaining = flood_fill(self.bounds, start, |pos| pos == tile || solid.contains(&pos));
            let connected = open.iter().all(|pos| *pos == tile || remaining.contains(pos));
            let reachable_sides = served
                .iter()
                .chain([&tile])
                .all(|anchor| has_open_neighbour(&remaining, anchor));
            if connected && reachable_sides {
                break tile;
            }
            debug!("Skipping ({}, {}): blocking it cuts off part of the level", tile.x, tile.y);
            skipped.insert(tile);
        };

        occupied.insert(tile);
        solid.insert(tile);
        *open = flood_fill(self.bounds, start, |pos| solid.contains(&pos));
        tile
    }

    fn clamp_logged(&self, requested: Position) -> Position {
        let clamped = self.bounds.clamp(requested);
        if clamped != requested {
            warn!(
                "Entity coordinates ({}, {}) out of bounds; clamped to ({}, {})",
                requested.x, requested.y, clamped.x, clamped.y
            );
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GridBounds {
        GridBounds::new(16, 12)
    }

    fn all_tiles() -> TileSet {
        bounds().positions().collect()
    }

    #[test]
    fn test_free_preferred_is_kept() {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let tile = resolver.resolve(Position::new(5, 4), &all_tiles(), &TileSet::new(), &TileSet::new());
        assert_eq!(tile, Position::new(5, 4));
    }

    #[test]
    fn test_occupied_preferred_moves_in_raster_order() {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let occupied: TileSet = [Position::new(5, 4), Position::new(4, 3)].into_iter().collect();
        let tile = resolver.resolve(Position::new(5, 4), &all_tiles(), &occupied, &TileSet::new());
        assert_eq!(tile, Position::new(5, 3));
    }

    #[test]
    fn test_unreachable_region_is_skipped() {
        // Only the bottom-right corner is reachable.
        let reachable: TileSet = [Position::new(15, 11), Position::new(14, 11)].into_iter().collect();
        let resolver = EntityPlacementResolver::new(bounds(), 3);
        let tile = resolver.resolve(Position::new(2, 2), &reachable, &TileSet::new(), &TileSet::new());
        // Box search fails within radius 3, so the reachable set is scanned in order.
        assert_eq!(tile, Position::new(14, 11));
    }

    #[test]
    fn test_nothing_free_keeps_preferred() {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let reachable: TileSet = [Position::new(1, 1)].into_iter().collect();
        let occupied = reachable.clone();
        let tile = resolver.resolve(Position::new(9, 9), &reachable, &occupied, &TileSet::new());
        assert_eq!(tile, Position::new(9, 9));
    }

    #[test]
    fn test_nearest_open() {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let solid: TileSet = square_box(Position::new(8, 6), 1, bounds()).collect();
        let open = resolver.nearest_open(Position::new(8, 6), &solid);
        assert_eq!(open, Position::new(6, 4));
        assert_eq!(resolver.nearest_open(Position::new(0, 0), &solid), Position::new(0, 0));
    }

    #[test]
    fn test_place_clamps_and_records() {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let mut occupied = TileSet::new();
        let tile = resolver.place(Position::new(40, -3), &all_tiles(), &mut occupied, &TileSet::new());
        assert_eq!(tile, Position::new(15, 0));
        assert!(occupied.contains(&tile));

        let second = resolver.place(Position::new(40, -3), &all_tiles(), &mut occupied, &TileSet::new());
        assert_ne!(second, tile);
        assert_eq!(occupied.len(), 2);
    }

    #[test]
    fn test_place_blocking_skips_chokepoints() {
        let bounds = GridBounds::new(6, 1);
        let resolver = EntityPlacementResolver::new(bounds, 12);
        let start = Position::new(0, 0);
        let mut solid = TileSet::new();
        let mut open = flood_fill(bounds, start, |_| false);
        let mut occupied: TileSet = [start].into_iter().collect();

        // Every corridor tile but the far end would cut the tiles beyond it.
        let tile = resolver.place_blocking(Position::new(2, 0), start, &[], &mut open, &mut occupied, &mut solid);
        assert_eq!(tile, Position::new(5, 0));
        assert!(solid.contains(&tile));
        assert_eq!(open.len(), 5);
    }

    #[test]
    fn test_place_blocking_keeps_anchor_approachable() {
        // The anchor at (3, 0) can only be approached from (2, 0).
        let bounds = GridBounds::new(4, 2);
        let resolver = EntityPlacementResolver::new(bounds, 12);
        let start = Position::new(0, 0);
        let anchor = Position::new(3, 0);
        let mut solid: TileSet = [anchor, Position::new(3, 1)].into_iter().collect();
        let mut open = flood_fill(bounds, start, |pos| solid.contains(&pos));
        let mut occupied: TileSet = [start].into_iter().collect();

        let tile = resolver.place_blocking(Position::new(2, 0), start, &[anchor], &mut open, &mut occupied, &mut solid);
        assert_eq!(tile, Position::new(1, 0));
        assert!(open.contains(&Position::new(2, 0)));
    }

    #[test]
    fn test_place_blocking_falls_back_when_everything_cuts() {
        let bounds = GridBounds::new(3, 1);
        let resolver = EntityPlacementResolver::new(bounds, 12);
        let start = Position::new(0, 0);
        let mut solid = TileSet::new();
        let mut open = flood_fill(bounds, start, |_| false);
        let mut occupied: TileSet = [start, Position::new(2, 0)].into_iter().collect();

        let tile = resolver.place_blocking(Position::new(1, 0), start, &[], &mut open, &mut occupied, &mut solid);
        assert_eq!(tile, Position::new(1, 0));
        assert_eq!(open.len(), 1);
    }
}
