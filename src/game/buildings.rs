//! # Buildings
//!
//! The two enterable buildings of every level: a shop and an inn. Each has an
//! outdoor entrance tile, an indoor exit, a keeper NPC and a goods list.

use crate::{
    Blocker, CollisionMap, GoalKind, GoalStack, GridBounds, InteriorLayout, InteriorTheme,
    Position,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Shop,
    Inn,
}

impl BuildingKind {
    pub fn interior_theme(self) -> InteriorTheme {
        match self {
            BuildingKind::Shop => InteriorTheme::Shop,
            BuildingKind::Inn => InteriorTheme::InnLobby,
        }
    }
}

/// Something for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Good {
    pub id: String,
    pub name: String,
    pub price: u32,
}

impl Good {
    pub fn new(id: &str, name: &str, price: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
        }
    }
}

/// Shop stock. Bridge materials are only sold when the level needs them.
pub fn shop_goods(goals: &GoalStack) -> Vec<Good> {
    if goals.contains(GoalKind::RepairBridge) {
        vec![
            Good::new("planks", "Bridge Planks", 20),
            Good::new("rope", "Hemp Rope Coil", 15),
            Good::new("nails", "Iron Nails", 10),
        ]
    } else {
        vec![
            Good::new("torch", "Traveler's Torch", 8),
            Good::new("bandage", "Bandage Wraps", 6),
            Good::new("map", "Hand-drawn Map", 12),
        ]
    }
}

pub fn inn_goods() -> Vec<Good> {
    vec![
        Good::new("sleep", "Rent a Bed", 12),
        Good::new("stew", "Hearty Stew", 6),
        Good::new("tea", "Warm Tea", 5),
    ]
}

/// An enterable building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub name: String,
    pub keeper: String,
    pub greeting: String,
    /// Outdoor tile; solid from outside
    pub entrance: Position,
    pub interior: InteriorLayout,
    pub keeper_position: Position,
    /// Other indoor occupants
    pub guests: Vec<Position>,
    pub goods: Vec<Good>,
}

impl Building {
    pub fn shop(entrance: Position, goals: &GoalStack, bounds: GridBounds) -> Self {
        let interior = InteriorLayout::for_theme(InteriorTheme::Shop, bounds.width / 2, bounds);
        let keeper_position = interior.keeper_tile();
        let guests = interior.guest_tiles();
        Self {
            kind: BuildingKind::Shop,
            name: "Shop".to_string(),
            keeper: "Shopkeeper".to_string(),
            greeting: "Welcome. Everything on the shelf is for sale.".to_string(),
            entrance,
            interior,
            keeper_position,
            guests,
            goods: shop_goods(goals),
        }
    }

    pub fn inn(entrance: Position, bounds: GridBounds) -> Self {
        let interior = InteriorLayout::for_theme(InteriorTheme::InnLobby, bounds.width / 2, bounds);
        let keeper_position = interior.keeper_tile();
        let guests = interior.guest_tiles();
        Self {
            kind: BuildingKind::Inn,
            name: "Inn".to_string(),
            keeper: "Inn Host".to_string(),
            greeting: "Welcome, traveler. Rest a while.".to_string(),
            entrance,
            interior,
            keeper_position,
            guests,
            goods: inn_goods(),
        }
    }

    pub fn exit(&self) -> Position {
        self.interior.exit
    }

    /// Indoor collision: walls, furniture, keeper and guests.
    pub fn interior_collision(&self) -> CollisionMap {
        let mut map = self.interior.collision_map();
        map.block(self.keeper_position, Blocker::Occupant);
        for guest in &self.guests {
            map.block(*guest, Blocker::Occupant);
        }
        map
    }

    /// "1:Bridge Planks(20g), 2:..." listing for the entry message.
    pub fn price_list(&self) -> String {
        self.goods
            .iter()
            .enumerate()
            .map(|(i, good)| format!("{}:{}({}g)", i + 1, good.name, good.price))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReachabilityAnalyzer;

    #[test]
    fn test_shop_goods_follow_goals() {
        let bridge = shop_goods(&GoalStack::new([GoalKind::RepairBridge]));
        let ids: Vec<&str> = bridge.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["planks", "rope", "nails"]);
        assert_eq!(bridge.iter().map(|g| g.price).sum::<u32>(), 45);

        let general = shop_goods(&GoalStack::new([GoalKind::Cure]));
        assert_eq!(general[0].id, "torch");
    }

    #[test]
    fn test_interior_occupants_are_solid() {
        let bounds = GridBounds::new(16, 12);
        let inn = Building::inn(Position::new(12, 6), bounds);
        let map = inn.interior_collision();
        assert!(map.is_solid(Position::new(8, 3)));
        assert!(map.is_solid(Position::new(3, 9)));
        assert_eq!(map.blocker_at(Position::new(11, 9)), Some(Blocker::Occupant));
        assert_eq!(map.blocker_at(Position::new(11, 8)), None);
        assert_eq!(inn.exit(), Position::new(8, 11));
    }

    #[test]
    fn test_keepers_are_reachable_from_arrival() {
        let bounds = GridBounds::new(16, 12);
        let goals = GoalStack::new([GoalKind::LostItem]);
        for building in [Building::shop(Position::new(3, 6), &goals, bounds), Building::inn(Position::new(12, 6), bounds)] {
            let map = building.interior_collision();
            let reach = ReachabilityAnalyzer::analyze(&map, building.interior.arrival_tile());
            let keeper = building.keeper_position;
            assert!(
                reach.tiles.iter().any(|tile| tile.is_within_reach(keeper)),
                "{} keeper unreachable",
                building.name
            );
        }
    }

    #[test]
    fn test_price_list() {
        let inn = Building::inn(Position::new(12, 6), GridBounds::new(16, 12));
        assert_eq!(inn.price_list(), "1:Rent a Bed(12g), 2:Hearty Stew(6g), 3:Warm Tea(5g)");
    }
}
