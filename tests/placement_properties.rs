//! Property tests for entity placement and bridge selection.

use proptest::collection::btree_set;
use proptest::prelude::*;
use questgrid::{
    Biome, EntityPlacementResolver, GameEvent, GenerationConfig, GoalKind, GoalStack, GridBounds,
    LayoutStyle, LevelDefinition, LevelSession, LevelSpec, Position, TileSet,
};

fn bounds() -> GridBounds {
    GridBounds::new(16, 12)
}

fn tile() -> impl Strategy<Value = Position> {
    (0..16i32, 0..12i32).prop_map(|(x, y)| Position::new(x, y))
}

fn tiles(max: usize) -> impl Strategy<Value = TileSet> {
    btree_set(tile(), 0..max)
}

fn free_tiles(reachable: &TileSet, occupied: &TileSet, solid: &TileSet) -> TileSet {
    reachable
        .iter()
        .filter(|pos| !solid.contains(*pos) && !occupied.contains(*pos))
        .copied()
        .collect()
}

proptest! {
    #[test]
    fn prop_resolve_finds_a_free_tile_or_keeps_preferred(
        preferred in tile(),
        reachable in tiles(120),
        occupied in tiles(40),
        solid in tiles(80),
    ) {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let result = resolver.resolve(preferred, &reachable, &occupied, &solid);
        let free = free_tiles(&reachable, &occupied, &solid);

        if free.is_empty() {
            prop_assert_eq!(result, preferred);
        } else {
            prop_assert!(free.contains(&result));
        }
        if free.contains(&preferred) {
            prop_assert_eq!(result, preferred);
        }
    }

    #[test]
    fn prop_place_reserves_distinct_tiles(
        requests in proptest::collection::vec((-3..19i32, -3..15i32), 1..8),
        reachable in tiles(150),
        solid in tiles(60),
    ) {
        let resolver = EntityPlacementResolver::new(bounds(), 12);
        let mut occupied = TileSet::new();
        let mut placed = Vec::new();

        for (x, y) in requests {
            let free_before = free_tiles(&reachable, &occupied, &solid);
            let tile = resolver.place(Position::new(x, y), &reachable, &mut occupied, &solid);
            prop_assert!(bounds().contains(tile));
            prop_assert!(occupied.contains(&tile));
            if !free_before.is_empty() {
                prop_assert!(free_before.contains(&tile));
                prop_assert!(!placed.contains(&tile));
            }
            placed.push(tile);
        }
    }

    /// A generated bridge is two orthogonally adjacent tiles that block until
    /// repaired and are walkable afterwards.
    #[test]
    fn prop_bridge_span_blocks_until_repaired(seed in any::<u64>(), layout_index in 0usize..12) {
        let layout_style = LayoutStyle::all()[layout_index % LayoutStyle::all().len()];
        let config = GenerationConfig::default();
        let spec = LevelSpec::new(seed, Biome::Meadow, layout_style);
        let goals = GoalStack::new([GoalKind::RepairBridge]);
        let definition = LevelDefinition::with_defaults(spec, goals, &config);
        let mut session = LevelSession::new(definition, config).unwrap();

        let crossing = session.bridge.clone().expect("bridge goal always selects a span");
        let [a, b] = crossing.tiles;
        prop_assert_eq!(a.manhattan_distance(b), 1);
        for tile in crossing.tiles {
            prop_assert!(session.outdoor_collision().is_solid(tile));
        }

        // Props only fall onto a span when the level had no free tile for them.
        let entities = session.entities();
        prop_assume!(entities.iter().all(|e| !crossing.contains(e.position)));

        let busy: Vec<Position> = session
            .buildings
            .iter()
            .map(|building| building.entrance)
            .chain([session.npc.position])
            .collect();
        let stand = bounds()
            .positions()
            .find(|pos| crossing.is_within_reach(*pos) && busy.iter().all(|other| !other.is_within_reach(*pos)));
        prop_assume!(stand.is_some());

        session.player = stand.unwrap_or(a);
        for id in ["planks", "rope", "nails"] {
            session.inventory.add(id, id);
        }
        let events = session.interact();
        let repaired = GameEvent::BridgeRepaired { tiles: crossing.tiles };
        prop_assert!(events.contains(&repaired));
        for tile in crossing.tiles {
            prop_assert!(!session.outdoor_collision().is_solid(tile));
        }
    }
}
