//! # Collision Map
//!
//! The single source of truth for "is this tile currently blocking movement".
//!
//! Solidity is never stored as a flat, hand-maintained set. The map keeps the
//! static terrain layer, the decks built over it, and a keyed layer of quest
//! blockers separately. A tile is solid iff it is uncovered terrain or holds a
//! blocker. Resolving a quest step removes its blocker by kind, so the answer
//! is always derived from current state.

use crate::{GridBounds, Position, TileSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a non-terrain tile is blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocker {
    Npc,
    MixStation,
    /// Unopened chest
    Chest,
    /// Locked door
    Door,
    /// Un-repaired bridge gap
    Bridge,
    /// Building entrance, reserved and not walkable from outside
    Entrance,
    /// Indoor occupant (shopkeeper, inn guests)
    Occupant,
}

/// Layered collision state for one scene (outdoor or one interior).
///
/// # Examples
///
/// ```
/// use questgrid::{Blocker, CollisionMap, GridBounds, Position, TileSet};
///
/// let water: TileSet = [Position::new(3, 3)].into_iter().collect();
/// let mut map = CollisionMap::new(GridBounds::default(), water);
/// map.block(Position::new(4, 4), Blocker::Chest);
/// assert!(map.is_solid(Position::new(3, 3)));
/// assert!(map.is_solid(Position::new(4, 4)));
///
/// map.clear(Position::new(4, 4), Blocker::Chest);
/// assert!(!map.is_solid(Position::new(4, 4)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionMap {
    bounds: GridBounds,
    /// Water, obstacle clusters, or interior walls and furniture
    terrain: TileSet,
    /// Terrain tiles made walkable by construction (a repaired bridge deck)
    decks: TileSet,
    blockers: BTreeMap<Position, Blocker>,
}

impl CollisionMap {
    /// Creates a map whose static layer is `terrain`.
    pub fn new(bounds: GridBounds, terrain: TileSet) -> Self {
        Self {
            bounds,
            terrain,
            decks: TileSet::new(),
            blockers: BTreeMap::new(),
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// True if the tile blocks movement right now.
    pub fn is_solid(&self, pos: Position) -> bool {
        (self.terrain.contains(&pos) && !self.decks.contains(&pos))
            || self.blockers.contains_key(&pos)
    }

    /// True if the tile is on the grid and not solid.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.bounds.contains(pos) && !self.is_solid(pos)
    }

    /// Marks a tile as blocked by a quest prop. A later block on the same tile wins.
    pub fn block(&mut self, pos: Position, blocker: Blocker) {
        self.blockers.insert(pos, blocker);
    }

    /// Removes a blocker if the tile is held by that kind. Returns whether it was removed.
    ///
    /// Terrain is never cleared this way.
    pub fn clear(&mut self, pos: Position, blocker: Blocker) -> bool {
        if self.blockers.get(&pos) == Some(&blocker) {
            self.blockers.remove(&pos);
            true
        } else {
            false
        }
    }

    /// Removes every tile held by `blocker`. Returns how many were removed.
    pub fn clear_all(&mut self, blocker: Blocker) -> usize {
        let before = self.blockers.len();
        self.blockers.retain(|_, b| *b != blocker);
        before - self.blockers.len()
    }

    /// Covers a terrain tile so it stops blocking, e.g. a bridge deck over water.
    pub fn lay_deck(&mut self, pos: Position) {
        self.decks.insert(pos);
    }

    pub fn decks(&self) -> &TileSet {
        &self.decks
    }

    /// The blocker on a tile, if any.
    pub fn blocker_at(&self, pos: Position) -> Option<Blocker> {
        self.blockers.get(&pos).copied()
    }

    /// Tiles currently held by `blocker`.
    pub fn tiles_blocked_by(&self, blocker: Blocker) -> TileSet {
        self.blockers
            .iter()
            .filter(|(_, b)| **b == blocker)
            .map(|(pos, _)| *pos)
            .collect()
    }

    pub fn terrain(&self) -> &TileSet {
        &self.terrain
    }

    /// Every solid tile, terrain and blockers combined.
    pub fn solid_tiles(&self) -> TileSet {
        self.terrain
            .difference(&self.decks)
            .chain(self.blockers.keys())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> CollisionMap {
        let terrain: TileSet = [Position::new(0, 0), Position::new(1, 0)].into_iter().collect();
        CollisionMap::new(GridBounds::new(4, 4), terrain)
    }

    #[test]
    fn test_terrain_is_solid() {
        let map = sample_map();
        assert!(map.is_solid(Position::new(0, 0)));
        assert!(!map.is_solid(Position::new(2, 2)));
        assert!(map.is_walkable(Position::new(2, 2)));
        assert!(!map.is_walkable(Position::new(4, 2)));
    }

    #[test]
    fn test_clear_requires_matching_blocker() {
        let mut map = sample_map();
        map.block(Position::new(2, 2), Blocker::Door);
        assert!(!map.clear(Position::new(2, 2), Blocker::Chest));
        assert!(map.is_solid(Position::new(2, 2)));
        assert!(map.clear(Position::new(2, 2), Blocker::Door));
        assert!(!map.is_solid(Position::new(2, 2)));
    }

    #[test]
    fn test_clearing_a_blocker_never_clears_terrain() {
        let mut map = sample_map();
        map.block(Position::new(0, 0), Blocker::Bridge);
        assert!(map.clear(Position::new(0, 0), Blocker::Bridge));
        assert!(map.is_solid(Position::new(0, 0)));
    }

    #[test]
    fn test_deck_opens_terrain() {
        let mut map = sample_map();
        map.block(Position::new(1, 0), Blocker::Bridge);
        map.clear(Position::new(1, 0), Blocker::Bridge);
        map.lay_deck(Position::new(1, 0));
        assert!(!map.is_solid(Position::new(1, 0)));
        assert!(!map.solid_tiles().contains(&Position::new(1, 0)));
        assert!(map.is_solid(Position::new(0, 0)));
    }

    #[test]
    fn test_clear_all_and_queries() {
        let mut map = sample_map();
        map.block(Position::new(2, 1), Blocker::Bridge);
        map.block(Position::new(2, 2), Blocker::Bridge);
        map.block(Position::new(3, 3), Blocker::Npc);
        assert_eq!(map.tiles_blocked_by(Blocker::Bridge).len(), 2);
        assert_eq!(map.blocker_at(Position::new(3, 3)), Some(Blocker::Npc));
        assert_eq!(map.solid_tiles().len(), 5);

        assert_eq!(map.clear_all(Blocker::Bridge), 2);
        assert_eq!(map.solid_tiles().len(), 3);
        assert!(map.tiles_blocked_by(Blocker::Bridge).is_empty());
    }
}
