//! # Quest State Machine
//!
//! Per-goal-kind trackers for one level and the aggregate "level won" check.
//!
//! This is not a single automaton. Each goal kind in the level's [`GoalStack`]
//! gets its own tracker with its own ordered steps, and the level is won when
//! every present tracker reports complete. Trackers only change in response to
//! discrete interactions; collision side effects (clearing a chest, door or
//! bridge from the solid set) are applied by the session that owns the map.

use crate::{config, GoalKind, GoalStack, Inventory, Position};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id given to the brewed remedy when it enters the inventory.
pub const POTION_ID: &str = "healing_potion";

/// Returns true iff every goal kind present in `flags` is complete.
///
/// Only kinds present in the map are checked, so an empty map is complete.
///
/// # Examples
///
/// ```
/// use questgrid::{all_complete, GoalKind};
/// use std::collections::BTreeMap;
///
/// let flags = BTreeMap::from([(GoalKind::Cure, true), (GoalKind::LostItem, false)]);
/// assert!(!all_complete(&flags));
///
/// let flags = BTreeMap::from([(GoalKind::Cure, true)]);
/// assert!(all_complete(&flags));
/// ```
pub fn all_complete(flags: &BTreeMap<GoalKind, bool>) -> bool {
    flags.values().all(|done| *done)
}

/// Cure: talk → collect every ingredient → mix → deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CureTracker {
    pub ingredient_ids: Vec<String>,
    pub mixed: bool,
    pub healed: bool,
}

impl CureTracker {
    pub fn new(ingredient_ids: Vec<String>) -> Self {
        Self {
            ingredient_ids,
            ..Self::default()
        }
    }

    /// Number of ingredients held, and how many are required.
    pub fn ingredient_count(&self, inventory: &Inventory) -> (usize, usize) {
        let have = self
            .ingredient_ids
            .iter()
            .filter(|id| inventory.has(id))
            .count();
        (have, self.ingredient_ids.len())
    }

    /// Mixing needs a non-empty ingredient list, all of it held.
    pub fn can_mix(&self, inventory: &Inventory) -> bool {
        let (have, need) = self.ingredient_count(inventory);
        need > 0 && have >= need
    }
}

/// Lost item: find the tagged pickup → deliver it to the NPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostItemTracker {
    pub found: bool,
    pub returned: bool,
}

/// Key and door: open chest (key appears) → collect key → unlock door.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAndDoorTracker {
    pub chest_opened: bool,
    pub key_spawned: bool,
    /// Where the key lies once spawned and not yet collected
    pub key_position: Option<Position>,
    pub key_collected: bool,
    pub door_opened: bool,
}

/// Repair bridge: hold every material → interact next to the gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTracker {
    pub materials: Vec<String>,
    pub repaired: bool,
}

impl Default for BridgeTracker {
    fn default() -> Self {
        Self {
            materials: config::BRIDGE_MATERIALS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            repaired: false,
        }
    }
}

impl BridgeTracker {
    pub fn has_materials(&self, inventory: &Inventory) -> bool {
        self.materials.iter().all(|m| inventory.has(m))
    }
}

/// What a talk with the quest NPC accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TalkOutcome {
    pub first_talk: bool,
    pub healed: bool,
    pub returned: bool,
}

impl TalkOutcome {
    /// True if the talk completed a goal step beyond the introduction.
    pub fn made_progress(&self) -> bool {
        self.healed || self.returned
    }
}

/// Result of using the mix station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixOutcome {
    Mixed,
    AlreadyMixed,
    MissingIngredients { have: usize, need: usize },
}

/// Result of using the chest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestOutcome {
    Opened { key_at: Position },
    AlreadyEmpty,
}

/// Result of using the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorOutcome {
    Unlocked,
    AlreadyOpen,
    Locked,
}

/// Result of working on the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    Repaired,
    AlreadyRepaired,
    MissingMaterials,
}

/// Conjunction of the trackers selected by a level's goal stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStateMachine {
    goals: GoalStack,
    pub npc_name: String,
    pub talked_to_npc: bool,
    /// Set the first time the NPC explains the quest
    pub quest_known: bool,
    pub cure: Option<CureTracker>,
    pub lost_item: Option<LostItemTracker>,
    pub key_and_door: Option<KeyAndDoorTracker>,
    pub bridge: Option<BridgeTracker>,
    /// Terminal for the level once set
    pub won: bool,
}

impl QuestStateMachine {
    /// Creates trackers for exactly the goal kinds in `goals`.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::{GoalKind, GoalStack, QuestStateMachine};
    ///
    /// let quest = QuestStateMachine::new(
    ///     GoalStack::new([GoalKind::KeyAndDoor]),
    ///     "Elder",
    ///     Vec::new(),
    /// );
    /// assert!(quest.key_and_door.is_some());
    /// assert!(quest.cure.is_none());
    /// assert!(!quest.is_complete());
    /// ```
    pub fn new(goals: GoalStack, npc_name: impl Into<String>, ingredient_ids: Vec<String>) -> Self {
        Self {
            cure: goals
                .contains(GoalKind::Cure)
                .then(|| CureTracker::new(ingredient_ids)),
            lost_item: goals
                .contains(GoalKind::LostItem)
                .then(LostItemTracker::default),
            key_and_door: goals
                .contains(GoalKind::KeyAndDoor)
                .then(KeyAndDoorTracker::default),
            bridge: goals
                .contains(GoalKind::RepairBridge)
                .then(BridgeTracker::default),
            goals,
            npc_name: npc_name.into(),
            talked_to_npc: false,
            quest_known: false,
            won: false,
        }
    }

    pub fn goals(&self) -> &GoalStack {
        &self.goals
    }

    pub fn has_goal(&self, goal: GoalKind) -> bool {
        self.goals.contains(goal)
    }

    /// Completion flag of one goal kind, or `None` if the level lacks it.
    pub fn goal_complete(&self, goal: GoalKind) -> Option<bool> {
        match goal {
            GoalKind::Cure => self.cure.as_ref().map(|t| t.healed),
            GoalKind::LostItem => self.lost_item.as_ref().map(|t| t.returned),
            GoalKind::KeyAndDoor => self.key_and_door.as_ref().map(|t| t.door_opened),
            GoalKind::RepairBridge => self.bridge.as_ref().map(|t| t.repaired),
        }
    }

    /// Completion flags of every goal kind in the stack.
    pub fn completion_flags(&self) -> BTreeMap<GoalKind, bool> {
        self.goals
            .iter()
            .filter_map(|goal| self.goal_complete(goal).map(|done| (goal, done)))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        all_complete(&self.completion_flags())
    }

    /// Re-checks the aggregate condition. Returns true only on the transition to won.
    pub fn evaluate_win(&mut self) -> bool {
        if self.won || !self.is_complete() {
            return false;
        }
        self.won = true;
        info!("Level won: goals {:?} complete", self.goals.goals());
        true
    }

    /// Talking to the quest NPC: introduces the quest and delivers remedy or lost item.
    pub fn talk_to_npc(&mut self) -> TalkOutcome {
        let mut outcome = TalkOutcome {
            first_talk: !self.talked_to_npc,
            ..TalkOutcome::default()
        };
        self.talked_to_npc = true;

        if let Some(cure) = self.cure.as_mut() {
            if !cure.healed && cure.mixed {
                cure.healed = true;
                outcome.healed = true;
            }
        }
        if let Some(lost) = self.lost_item.as_mut() {
            if !lost.returned && lost.found {
                lost.returned = true;
                outcome.returned = true;
            }
        }
        outcome
    }

    /// Records that the tagged lost item was picked up.
    pub fn record_lost_item_found(&mut self) {
        if let Some(lost) = self.lost_item.as_mut() {
            lost.found = true;
        }
    }

    /// Brews the remedy if every ingredient is held. The potion enters the inventory.
    pub fn mix(&mut self, inventory: &mut Inventory) -> Option<MixOutcome> {
        let cure = self.cure.as_mut()?;
        if cure.mixed {
            return Some(MixOutcome::AlreadyMixed);
        }
        if !cure.can_mix(inventory) {
            let (have, need) = cure.ingredient_count(inventory);
            return Some(MixOutcome::MissingIngredients { have, need });
        }
        cure.mixed = true;
        inventory.add(POTION_ID, "Healing Potion");
        Some(MixOutcome::Mixed)
    }

    /// Opens the chest at `chest_at`; the key spawns on that tile.
    pub fn open_chest(&mut self, chest_at: Position) -> Option<ChestOutcome> {
        let tracker = self.key_and_door.as_mut()?;
        if tracker.chest_opened {
            return Some(ChestOutcome::AlreadyEmpty);
        }
        tracker.chest_opened = true;
        tracker.key_spawned = true;
        tracker.key_position = Some(chest_at);
        Some(ChestOutcome::Opened { key_at: chest_at })
    }

    /// Picks up the spawned key if the player stands on it.
    pub fn collect_key_at(&mut self, player: Position) -> bool {
        let Some(tracker) = self.key_and_door.as_mut() else {
            return false;
        };
        if !tracker.key_spawned || tracker.key_collected || tracker.key_position != Some(player) {
            return false;
        }
        tracker.key_collected = true;
        tracker.key_position = None;
        true
    }

    /// Unlocks the door if the key has been collected.
    pub fn unlock_door(&mut self) -> Option<DoorOutcome> {
        let tracker = self.key_and_door.as_mut()?;
        Some(if tracker.door_opened {
            DoorOutcome::AlreadyOpen
        } else if tracker.key_collected {
            tracker.door_opened = true;
            DoorOutcome::Unlocked
        } else {
            DoorOutcome::Locked
        })
    }

    /// Repairs the bridge, consuming the materials from the inventory.
    pub fn repair_bridge(&mut self, inventory: &mut Inventory) -> Option<BridgeOutcome> {
        let tracker = self.bridge.as_mut()?;
        if tracker.repaired {
            return Some(BridgeOutcome::AlreadyRepaired);
        }
        if !tracker.has_materials(inventory) {
            return Some(BridgeOutcome::MissingMaterials);
        }
        for material in &tracker.materials {
            inventory.remove(material);
        }
        tracker.repaired = true;
        info!("Bridge repaired");
        Some(BridgeOutcome::Repaired)
    }

    /// Ordered (label, done) pairs for the quest log.
    pub fn step_states(&self, inventory: &Inventory) -> Vec<(String, bool)> {
        let mut steps = vec![(format!("Talk to {}", self.npc_name), self.talked_to_npc)];

        for goal in self.goals.iter() {
            match goal {
                GoalKind::Cure => {
                    if let Some(cure) = &self.cure {
                        let (have, need) = cure.ingredient_count(inventory);
                        steps.push(("Gather ingredients".to_string(), have >= need));
                        steps.push(("Brew the remedy".to_string(), cure.mixed));
                        steps.push(("Heal the patient".to_string(), cure.healed));
                    }
                }
                GoalKind::LostItem => {
                    if let Some(lost) = &self.lost_item {
                        steps.push(("Find the lost item".to_string(), lost.found));
                        steps.push(("Return it to NPC".to_string(), lost.returned));
                    }
                }
                GoalKind::KeyAndDoor => {
                    if let Some(tracker) = &self.key_and_door {
                        steps.push(("Open the chest".to_string(), tracker.chest_opened));
                        steps.push(("Pick up the key".to_string(), tracker.key_collected));
                        steps.push(("Unlock the door".to_string(), tracker.door_opened));
                    }
                }
                GoalKind::RepairBridge => {
                    if let Some(bridge) = &self.bridge {
                        steps.push((
                            "Buy planks, rope, nails".to_string(),
                            bridge.repaired || bridge.has_materials(inventory),
                        ));
                        steps.push(("Repair the bridge".to_string(), bridge.repaired));
                    }
                }
            }
        }
        steps
    }

    /// (completed steps, total steps).
    pub fn progress(&self, inventory: &Inventory) -> (usize, usize) {
        let steps = self.step_states(inventory);
        let done = steps.iter().filter(|(_, done)| *done).count();
        (done, steps.len())
    }

    /// Label of the first incomplete step, or "Quest complete".
    pub fn next_step_label(&self, inventory: &Inventory) -> String {
        self.step_states(inventory)
            .into_iter()
            .find(|(_, done)| !done)
            .map(|(label, _)| label)
            .unwrap_or_else(|| "Quest complete".to_string())
    }
}
