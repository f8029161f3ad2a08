//! # Quest Entities
//!
//! Objects placed on the grid for quests, world pickups, and the player's inventory.

use crate::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a placed quest object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Npc,
    Ingredient,
    LostItem,
    MixStation,
    Chest,
    Key,
    Door,
    BridgeTile,
    BuildingEntrance,
    /// A generic world pickup with no quest role
    Pickup,
}

/// Kind tag of a world pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Required by the cure goal's mix step
    Ingredient,
    /// The tagged pickup of the lost-item goal
    LostItem,
    #[default]
    Generic,
}

impl ItemKind {
    /// The entity kind a placed item of this kind reports.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            ItemKind::Ingredient => EntityKind::Ingredient,
            ItemKind::LostItem => EntityKind::LostItem,
            ItemKind::Generic => EntityKind::Pickup,
        }
    }
}

/// A resolved quest object on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEntity {
    pub id: String,
    pub kind: EntityKind,
    pub position: Position,
}

impl QuestEntity {
    pub fn new(id: impl Into<String>, kind: EntityKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
        }
    }
}

/// A named static prop (NPC, mix station, chest, door) with its tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    pub name: String,
    pub position: Position,
}

impl Prop {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// A world pickup the player collects by stepping on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub position: Position,
}

impl QuestItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ItemKind,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            position,
        }
    }

    /// This item as a placed quest entity.
    pub fn as_entity(&self) -> QuestEntity {
        QuestEntity::new(self.id.clone(), self.kind.entity_kind(), self.position)
    }
}

/// What the player carries: collected ids, display names, and gold.
///
/// # Examples
///
/// ```
/// use questgrid::Inventory;
///
/// let mut inventory = Inventory::new(60);
/// inventory.add("rope", "Hemp Rope Coil");
/// assert!(inventory.has("rope"));
/// assert!(!inventory.has_all(&["rope", "nails"]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Ids of everything collected or bought
    pub collected: BTreeSet<String>,
    /// Display names in pickup order
    pub names: Vec<String>,
    pub gold: u32,
}

impl Inventory {
    pub fn new(gold: u32) -> Self {
        Self {
            collected: BTreeSet::new(),
            names: Vec::new(),
            gold,
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.collected.contains(id)
    }

    pub fn has_all(&self, ids: &[&str]) -> bool {
        ids.iter().all(|id| self.has(id))
    }

    /// Adds an item. Returns false if the id was already held.
    pub fn add(&mut self, id: impl Into<String>, name: impl Into<String>) -> bool {
        let inserted = self.collected.insert(id.into());
        if inserted {
            self.names.push(name.into());
        }
        inserted
    }

    /// Removes an id. Display names are a pickup log and are left alone.
    pub fn remove(&mut self, id: &str) -> bool {
        self.collected.remove(id)
    }

    /// Deducts `price` gold if affordable.
    pub fn spend(&mut self, price: u32) -> bool {
        if self.gold < price {
            return false;
        }
        self.gold -= price;
        true
    }
}
