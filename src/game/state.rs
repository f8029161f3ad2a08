//! # Level Session
//!
//! The explicit per-level context: terrain, collision maps, placed entities,
//! buildings, inventory, player tile and quest state for one level.
//!
//! A [`LevelSession`] is rebuilt from its [`LevelDefinition`] on every reset.
//! All mutation goes through its movement, interaction and purchase entry
//! points, each of which returns the [`GameEvent`]s it produced.

use crate::{
    Blocker, BridgeCrossing, BridgeCrossingSelector, BridgeOutcome, Building, BuildingKind,
    ChestOutcome, CollisionMap, CrossingTerrain, Direction, DoorOutcome, EntityKind,
    EntityPlacementResolver, GenerationConfig, GoalKind, GoalStack, GridBounds, Inventory,
    ItemKind, LevelSpec, MixOutcome, Position, Prop, QuestEntity, QuestGridError,
    QuestGridResult, QuestItem, QuestStateMachine, Reachability, ReachabilityAnalyzer,
    TerrainLayout, TerrainLayoutGenerator, TileSet,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id the spawned key enters the inventory under.
pub const KEY_ID: &str = "key";

/// Everything a level is built from before placement runs.
///
/// Entity tiles here are preferences; [`LevelSession::reset`] moves each one
/// onto a free tile reachable from spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub spec: LevelSpec,
    /// Never empty once built through [`LevelDefinition::with_defaults`]
    pub goals: GoalStack,
    pub spawn: Position,
    /// The quest NPC
    pub npc: Prop,
    /// World pickups: ingredients, the lost item, generic finds
    pub items: Vec<QuestItem>,
    pub mix_station: Option<Prop>,
    pub chest: Option<Prop>,
    pub door: Option<Prop>,
    pub shop_entrance_hint: Position,
    pub inn_entrance_hint: Position,
}

impl LevelDefinition {
    /// Default layout of quest entities for a goal stack.
    ///
    /// Only the entities the goals need are created. An empty goal stack
    /// becomes `[lost_item]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::{Biome, GenerationConfig, GoalKind, GoalStack, LayoutStyle, LevelDefinition, LevelSpec, Position};
    ///
    /// let spec = LevelSpec::new(1, Biome::Meadow, LayoutStyle::Crossroads);
    /// let def = LevelDefinition::with_defaults(spec, GoalStack::default(), &GenerationConfig::default());
    /// assert_eq!(def.goals.goals(), &[GoalKind::LostItem]);
    /// assert_eq!(def.spawn, Position::new(8, 6));
    /// assert!(def.chest.is_none());
    /// ```
    pub fn with_defaults(spec: LevelSpec, goals: GoalStack, config: &GenerationConfig) -> Self {
        let goals = goals.or_default_goal();
        let bounds = config.bounds();

        let mut items = Vec::new();
        if goals.contains(GoalKind::Cure) {
            let herbs = [
                ("ingredient1", "Crystal Herb", Position::new(10, 3)),
                ("ingredient2", "Sunleaf", Position::new(12, 6)),
                ("ingredient3", "River Moss", Position::new(7, 9)),
            ];
            for (id, name, pos) in herbs {
                items.push(QuestItem::new(id, name, ItemKind::Ingredient, pos));
            }
        }
        if goals.contains(GoalKind::LostItem) {
            items.push(QuestItem::new(
                "lost_item",
                "Lost Heirloom",
                ItemKind::LostItem,
                Position::new(9, 6),
            ));
        }

        let key_and_door = goals.contains(GoalKind::KeyAndDoor);
        Self {
            spawn: bounds.center(),
            npc: Prop::new("Elder", Position::new(5, 4)),
            items,
            mix_station: goals
                .contains(GoalKind::Cure)
                .then(|| Prop::new("Mixing Table", Position::new(9, 5))),
            chest: key_and_door.then(|| Prop::new("Old Chest", Position::new(12, 4))),
            door: key_and_door.then(|| Prop::new("Sealed Door", Position::new(14, 6))),
            shop_entrance_hint: Position::new(3, bounds.height / 2),
            inn_entrance_hint: Position::new(12, bounds.height / 2),
            spec,
            goals,
        }
    }

    /// Ids of the ingredient-kind items, in definition order.
    pub fn ingredient_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.kind == ItemKind::Ingredient)
            .map(|item| item.id.clone())
            .collect()
    }
}

/// Where the player currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scene", rename_all = "snake_case")]
pub enum Scene {
    Outdoor,
    Indoor { building: BuildingKind },
}

/// Something that happened in response to a player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// Text for the message line
    Message { text: String },
    Moved { to: Position },
    MoveBlocked { to: Position },
    ItemPickedUp { id: String, name: String },
    KeyCollected { at: Position },
    EnteredBuilding { building: BuildingKind },
    LeftBuilding { building: BuildingKind },
    NpcTalked { first_talk: bool },
    PotionMixed,
    NpcHealed,
    ItemReturned,
    ChestOpened { key_at: Position },
    DoorUnlocked { at: Position },
    BridgeRepaired { tiles: [Position; 2] },
    Purchased { id: String, price: u32, gold_left: u32 },
    LevelWon,
}

impl GameEvent {
    fn message(text: impl Into<String>) -> Self {
        GameEvent::Message { text: text.into() }
    }
}

/// Counters for one level run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub steps_taken: u32,
    pub moves_blocked: u32,
    pub items_collected: u32,
    pub purchases: u32,
    pub gold_spent: u32,
    pub buildings_entered: u32,
}

impl SessionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Moved { .. } => self.steps_taken += 1,
            GameEvent::MoveBlocked { .. } => self.moves_blocked += 1,
            GameEvent::ItemPickedUp { .. } | GameEvent::KeyCollected { .. } => {
                self.items_collected += 1;
            }
            GameEvent::Purchased { price, .. } => {
                self.purchases += 1;
                self.gold_spent += price;
            }
            GameEvent::EnteredBuilding { .. } => self.buildings_entered += 1,
            _ => {}
        }
    }
}

/// Immutable, serialisable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub spec: LevelSpec,
    pub goals: GoalStack,
    pub bounds: GridBounds,
    pub spawn: Position,
    pub player: Position,
    pub scene: Scene,
    pub water: TileSet,
    pub path: TileSet,
    /// Solid tiles of the active scene
    pub solid: TileSet,
    /// Reachable set entities were placed against
    pub reachable: TileSet,
    /// Tiles the player can walk to from spawn right now
    pub walkable: TileSet,
    pub entities: Vec<QuestEntity>,
    pub bridge: Option<BridgeCrossing>,
    pub completion: BTreeMap<GoalKind, bool>,
    pub steps: Vec<(String, bool)>,
    pub next_step: String,
    pub inventory: Inventory,
    pub won: bool,
    pub statistics: SessionStatistics,
}

/// The per-level context object.
///
/// # Examples
///
/// ```
/// use questgrid::{Biome, GenerationConfig, GoalKind, GoalStack, LayoutStyle, LevelDefinition, LevelSession, LevelSpec};
///
/// let config = GenerationConfig::default();
/// let spec = LevelSpec::new(42, Biome::Meadow, LayoutStyle::Crossroads);
/// let definition = LevelDefinition::with_defaults(spec, GoalStack::new([GoalKind::KeyAndDoor]), &config);
/// let session = LevelSession::new(definition, config).unwrap();
///
/// for entity in session.entities() {
///     assert!(session.reachable.contains(entity.position));
/// }
/// assert!(!session.quest.won);
/// ```
#[derive(Debug, Clone)]
pub struct LevelSession {
    definition: LevelDefinition,
    config: GenerationConfig,
    /// Generated outdoor terrain
    pub layout: TerrainLayout,
    outdoor: CollisionMap,
    /// Collision map of the building the player is in
    indoor: Option<CollisionMap>,
    /// Reachable from spawn over terrain alone; entrances and bridge banks use it
    pub approach_reachable: Reachability,
    /// Reachable from spawn once entrances and the bridge are solid; entities use it
    pub reachable: Reachability,
    /// Reachable from spawn over the current outdoor collision map
    pub walkable: Reachability,
    pub spawn: Position,
    pub npc: Prop,
    pub items: Vec<QuestItem>,
    pub mix_station: Option<Prop>,
    pub chest: Option<Prop>,
    pub door: Option<Prop>,
    pub bridge: Option<BridgeCrossing>,
    pub buildings: Vec<Building>,
    pub inventory: Inventory,
    pub player: Position,
    pub scene: Scene,
    pub quest: QuestStateMachine,
    pub statistics: SessionStatistics,
}

impl LevelSession {
    /// Generates the terrain for `definition` and sets the level up.
    ///
    /// Fails only if `config` does not validate.
    pub fn new(definition: LevelDefinition, config: GenerationConfig) -> QuestGridResult<Self> {
        config.validate()?;
        Ok(Self::generate(definition, config))
    }

    /// Sets a level up on a prebuilt terrain layout.
    ///
    /// Order matters: the bridge span is chosen against terrain-only
    /// reachability and made solid, then building entrances are placed
    /// clear of the span and its banks, and only then are the NPC, items and
    /// props placed against the reachable set that remains. No blocking
    /// placement may cut a reachable tile off from spawn.
    pub fn from_layout(
        definition: LevelDefinition,
        config: GenerationConfig,
        layout: TerrainLayout,
    ) -> QuestGridResult<Self> {
        config.validate()?;
        Ok(Self::build(definition, config, layout))
    }

    fn generate(definition: LevelDefinition, config: GenerationConfig) -> Self {
        let layout = TerrainLayoutGenerator::new(definition.spec.clone()).generate_seeded(&config);
        Self::build(definition, config, layout)
    }

    fn build(definition: LevelDefinition, config: GenerationConfig, layout: TerrainLayout) -> Self {
        let bounds = layout.bounds;
        let resolver = EntityPlacementResolver::from_config(&config);
        let mut outdoor = CollisionMap::new(bounds, layout.solid_tiles());

        let spawn = settle_spawn(&resolver, &outdoor, bounds.clamp(definition.spawn));
        let approach_reachable = ReachabilityAnalyzer::analyze(&outdoor, spawn);

        let bridge = definition.goals.contains(GoalKind::RepairBridge).then(|| {
            let blocked = layout.obstacle_tiles();
            let terrain = CrossingTerrain {
                bounds,
                water: &layout.water,
                path: &layout.path,
                blocked: &blocked,
            };
            BridgeCrossingSelector::select(&terrain, &approach_reachable.tiles, spawn)
        });

        // Tiles that must keep a walkable side: interaction targets placed so far.
        let mut anchors = Vec::new();
        let mut occupied = TileSet::new();
        if let Some(crossing) = &bridge {
            for tile in crossing.tiles {
                outdoor.block(tile, Blocker::Bridge);
            }
            anchors.extend(crossing.tiles);
            occupied.extend(crossing.banks());
        }

        let spawn = settle_spawn(&resolver, &outdoor, spawn);
        occupied.insert(spawn);
        let mut solid = outdoor.solid_tiles();
        let mut open = ReachabilityAnalyzer::analyze(&outdoor, spawn).tiles;

        let mut entrances = Vec::with_capacity(2);
        for hint in [definition.shop_entrance_hint, definition.inn_entrance_hint] {
            let tile = resolver.place_blocking(hint, spawn, &anchors, &mut open, &mut occupied, &mut solid);
            outdoor.block(tile, Blocker::Entrance);
            anchors.push(tile);
            entrances.push(tile);
        }
        let reachable = ReachabilityAnalyzer::analyze(&outdoor, spawn);

        // NPC, then items, then props; each placement reserves its tile.
        let npc_at = resolver.place_blocking(
            definition.npc.position,
            spawn,
            &anchors,
            &mut open,
            &mut occupied,
            &mut solid,
        );
        anchors.push(npc_at);
        let npc = Prop::new(definition.npc.name.clone(), npc_at);
        let items: Vec<QuestItem> = definition
            .items
            .iter()
            .map(|item| QuestItem {
                position: resolver.place(item.position, &open, &mut occupied, &solid),
                ..item.clone()
            })
            .collect();
        let mut place_prop = |prop: &Prop| {
            let tile = resolver.place_blocking(prop.position, spawn, &anchors, &mut open, &mut occupied, &mut solid);
            anchors.push(tile);
            Prop::new(prop.name.clone(), tile)
        };
        let mix_station = definition.mix_station.as_ref().map(&mut place_prop);
        let chest = definition.chest.as_ref().map(&mut place_prop);
        let door = definition.door.as_ref().map(&mut place_prop);

        outdoor.block(npc.position, Blocker::Npc);
        if let Some(station) = &mix_station {
            outdoor.block(station.position, Blocker::MixStation);
        }
        if let Some(chest) = &chest {
            outdoor.block(chest.position, Blocker::Chest);
        }
        if let Some(door) = &door {
            outdoor.block(door.position, Blocker::Door);
        }
        let walkable = ReachabilityAnalyzer::analyze(&outdoor, spawn);

        let buildings = vec![
            Building::shop(entrances[0], &definition.goals, bounds),
            Building::inn(entrances[1], bounds),
        ];
        let quest = QuestStateMachine::new(
            definition.goals.clone(),
            npc.name.clone(),
            definition.ingredient_ids(),
        );

        debug!(
            "Level {} ready: spawn ({}, {}), {} reachable tiles, {} walkable, goals {:?}",
            definition.spec.seed,
            spawn.x,
            spawn.y,
            reachable.len(),
            walkable.len(),
            definition.goals.goals()
        );

        Self {
            inventory: Inventory::new(config.starting_gold),
            definition,
            config,
            layout,
            outdoor,
            indoor: None,
            approach_reachable,
            reachable,
            walkable,
            spawn,
            npc,
            items,
            mix_station,
            chest,
            door,
            bridge,
            buildings,
            player: spawn,
            scene: Scene::Outdoor,
            quest,
            statistics: SessionStatistics::new(),
        }
    }

    /// Rebuilds the level from its definition, discarding all progress.
    pub fn reset(&mut self) {
        *self = Self::generate(self.definition.clone(), self.config.clone());
    }

    pub fn definition(&self) -> &LevelDefinition {
        &self.definition
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn bounds(&self) -> GridBounds {
        self.layout.bounds
    }

    pub fn outdoor_collision(&self) -> &CollisionMap {
        &self.outdoor
    }

    /// The collision map of the scene the player is in.
    pub fn active_collision(&self) -> &CollisionMap {
        match (&self.scene, &self.indoor) {
            (Scene::Indoor { .. }, Some(map)) => map,
            _ => &self.outdoor,
        }
    }

    /// The building the player is inside, if any.
    pub fn current_building(&self) -> Option<&Building> {
        match self.scene {
            Scene::Indoor { building } => self.buildings.iter().find(|b| b.kind == building),
            Scene::Outdoor => None,
        }
    }

    pub fn building(&self, kind: BuildingKind) -> Option<&Building> {
        self.buildings.iter().find(|b| b.kind == kind)
    }

    /// Quest entities currently in the outdoor world: the NPC, props whose
    /// blockers still stand, uncollected items and a spawned key.
    pub fn entities(&self) -> Vec<QuestEntity> {
        let mut entities = vec![QuestEntity::new("npc", EntityKind::Npc, self.npc.position)];
        if let Some(station) = &self.mix_station {
            entities.push(QuestEntity::new("mix_station", EntityKind::MixStation, station.position));
        }
        let tracker = self.quest.key_and_door.as_ref();
        if let Some(chest) = &self.chest {
            if !tracker.is_some_and(|t| t.chest_opened) {
                entities.push(QuestEntity::new("chest", EntityKind::Chest, chest.position));
            }
        }
        if let Some(door) = &self.door {
            if !tracker.is_some_and(|t| t.door_opened) {
                entities.push(QuestEntity::new("door", EntityKind::Door, door.position));
            }
        }
        entities.extend(
            self.items
                .iter()
                .filter(|item| !self.inventory.has(&item.id))
                .map(QuestItem::as_entity),
        );
        if let Some(key_at) = tracker.and_then(|t| t.key_position) {
            entities.push(QuestEntity::new(KEY_ID, EntityKind::Key, key_at));
        }
        entities
    }

    /// Building entrances and bridge tiles as entities.
    pub fn landmarks(&self) -> Vec<QuestEntity> {
        let mut landmarks: Vec<QuestEntity> = self
            .buildings
            .iter()
            .map(|b| {
                let id = match b.kind {
                    BuildingKind::Shop => "shop_entrance",
                    BuildingKind::Inn => "inn_entrance",
                };
                QuestEntity::new(id, EntityKind::BuildingEntrance, b.entrance)
            })
            .collect();
        if let Some(crossing) = &self.bridge {
            for (i, tile) in crossing.tiles.iter().enumerate() {
                landmarks.push(QuestEntity::new(format!("bridge_{}", i), EntityKind::BridgeTile, *tile));
            }
        }
        landmarks
    }

    /// Moves the player one tile. Blocked by the grid edge and by solid tiles
    /// of the active scene. Pickups run after an outdoor move.
    pub fn move_player(&mut self, direction: Direction) -> Vec<GameEvent> {
        let target = self.player.step(direction);
        let mut events = Vec::new();
        if !self.active_collision().is_walkable(target) {
            events.push(GameEvent::MoveBlocked { to: target });
        } else {
            self.player = target;
            events.push(GameEvent::Moved { to: target });
            events.extend(self.check_pickups());
        }
        self.record(events)
    }

    /// Collects whatever the player is standing on.
    pub fn check_pickups(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.scene != Scene::Outdoor {
            return events;
        }

        let here = self.player;
        let found: Vec<QuestItem> = self
            .items
            .iter()
            .filter(|item| item.position == here && !self.inventory.has(&item.id))
            .cloned()
            .collect();
        for item in found {
            self.inventory.add(item.id.clone(), item.name.clone());
            events.push(GameEvent::ItemPickedUp {
                id: item.id.clone(),
                name: item.name.clone(),
            });
            match item.kind {
                ItemKind::LostItem => {
                    self.quest.record_lost_item_found();
                    events.push(GameEvent::message(format!("Found {}!", item.name)));
                }
                ItemKind::Ingredient => {
                    let (have, need) = self
                        .quest
                        .cure
                        .as_ref()
                        .map(|cure| cure.ingredient_count(&self.inventory))
                        .unwrap_or((0, 0));
                    let text = if need > 0 && have >= need {
                        "All ingredients found! Mix at the cauldron.".to_string()
                    } else {
                        format!("Found {}! ({}/{} ingredients)", item.name, have, need)
                    };
                    events.push(GameEvent::message(text));
                }
                ItemKind::Generic => {
                    events.push(GameEvent::message(format!("Found {}!", item.name)));
                }
            }
        }

        if self.quest.collect_key_at(here) {
            self.inventory.add(KEY_ID, "Old Key");
            events.push(GameEvent::KeyCollected { at: here });
            events.push(GameEvent::message("Picked up Old Key!"));
        }
        events
    }

    /// Interacts with whatever is within reach, first match wins.
    ///
    /// Outdoors: entrances, quest NPC, bridge, mix station, chest, door.
    /// Indoors: exit, keeper, guests.
    pub fn interact(&mut self) -> Vec<GameEvent> {
        let events = match self.scene {
            Scene::Outdoor => self.interact_outdoor(),
            Scene::Indoor { building } => self.interact_indoor(building),
        };
        self.record(events)
    }

    fn interact_outdoor(&mut self) -> Vec<GameEvent> {
        let here = self.player;

        if let Some(kind) = self
            .buildings
            .iter()
            .find(|b| b.entrance.is_within_reach(here))
            .map(|b| b.kind)
        {
            return self.enter_building(kind);
        }

        if self.npc.position.is_within_reach(here) {
            return self.talk_to_npc();
        }

        if let Some(crossing) = self.bridge.clone() {
            if crossing.is_within_reach(here) {
                return self.work_on_bridge(&crossing);
            }
        }

        if let Some(station) = &self.mix_station {
            if station.position.is_within_reach(here) {
                return match self.quest.mix(&mut self.inventory) {
                    Some(MixOutcome::Mixed) => vec![
                        GameEvent::PotionMixed,
                        GameEvent::message("Quest update: potion mixed."),
                    ],
                    Some(MixOutcome::AlreadyMixed) => vec![GameEvent::message("The potion is ready.")],
                    _ => vec![GameEvent::message("Need more ingredients.")],
                };
            }
        }

        if let Some(chest) = self.chest.clone() {
            if chest.position.is_within_reach(here) {
                return match self.quest.open_chest(chest.position) {
                    Some(ChestOutcome::Opened { key_at }) => {
                        self.outdoor.clear(chest.position, Blocker::Chest);
                        self.refresh_walkable();
                        vec![
                            GameEvent::ChestOpened { key_at },
                            GameEvent::message("Quest update: chest opened. A key appears."),
                        ]
                    }
                    _ => vec![GameEvent::message("The chest is empty.")],
                };
            }
        }

        if let Some(door) = self.door.clone() {
            if door.position.is_within_reach(here) {
                return match self.quest.unlock_door() {
                    Some(DoorOutcome::Unlocked) => {
                        self.outdoor.clear(door.position, Blocker::Door);
                        self.refresh_walkable();
                        let mut events = vec![
                            GameEvent::DoorUnlocked { at: door.position },
                            GameEvent::message("Quest update: door unlocked!"),
                        ];
                        events.extend(self.check_win());
                        events
                    }
                    Some(DoorOutcome::AlreadyOpen) => vec![GameEvent::message("The door is open.")],
                    _ => vec![GameEvent::message("The door is locked.")],
                };
            }
        }

        vec![GameEvent::message("Nothing here...")]
    }

    fn talk_to_npc(&mut self) -> Vec<GameEvent> {
        let outcome = self.quest.talk_to_npc();
        let name = self.npc.name.clone();
        let mut events = vec![GameEvent::NpcTalked {
            first_talk: outcome.first_talk,
        }];

        if outcome.healed {
            events.push(GameEvent::NpcHealed);
            events.push(GameEvent::message(format!("{}: \"I feel better!\"", name)));
        }
        if outcome.returned {
            events.push(GameEvent::ItemReturned);
            events.push(GameEvent::message(format!("{}: \"You found it!\"", name)));
        }
        if !outcome.made_progress() {
            let line = if self.quest.is_complete() {
                "Well done!".to_string()
            } else {
                format!(
                    "If you are unsure, focus on this next step: {}.",
                    self.quest.next_step_label(&self.inventory)
                )
            };
            events.push(GameEvent::message(format!("{}: \"{}\"", name, line)));
        }

        if !self.quest.quest_known {
            self.quest.quest_known = true;
            let goals: Vec<&str> = self.quest.goals().iter().map(GoalKind::name).collect();
            events.push(GameEvent::message(format!(
                "Quest: {}. Next: {}.",
                goals.join(" + "),
                self.quest.next_step_label(&self.inventory)
            )));
        }

        if outcome.made_progress() {
            events.extend(self.check_win());
        }
        events
    }

    fn work_on_bridge(&mut self, crossing: &BridgeCrossing) -> Vec<GameEvent> {
        match self.quest.repair_bridge(&mut self.inventory) {
            Some(BridgeOutcome::Repaired) => {
                self.outdoor.clear_all(Blocker::Bridge);
                for tile in crossing.tiles {
                    self.outdoor.lay_deck(tile);
                }
                self.refresh_walkable();
                let mut events = vec![
                    GameEvent::BridgeRepaired {
                        tiles: crossing.tiles,
                    },
                    GameEvent::message("Repaired the bridge!"),
                ];
                events.extend(self.check_win());
                events
            }
            Some(BridgeOutcome::AlreadyRepaired) => vec![GameEvent::message("The bridge is sturdy now.")],
            _ => vec![GameEvent::message(
                "You need planks, rope, and nails. Buy them at the Shop.",
            )],
        }
    }

    fn refresh_walkable(&mut self) {
        self.walkable = ReachabilityAnalyzer::analyze(&self.outdoor, self.spawn);
    }

    fn check_win(&mut self) -> Vec<GameEvent> {
        if self.quest.evaluate_win() {
            vec![GameEvent::LevelWon]
        } else {
            Vec::new()
        }
    }

    fn enter_building(&mut self, kind: BuildingKind) -> Vec<GameEvent> {
        let Some(building) = self.building(kind) else {
            return Vec::new();
        };
        let map = building.interior_collision();
        let arrival = building.interior.arrival_tile();
        let text = format!(
            "Entered {}. Buy: {}. Gold: {}g.",
            building.name,
            building.price_list(),
            self.inventory.gold
        );

        self.indoor = Some(map);
        self.scene = Scene::Indoor { building: kind };
        self.player = arrival;
        info!("Entered {:?}", kind);
        vec![GameEvent::EnteredBuilding { building: kind }, GameEvent::message(text)]
    }

    fn interact_indoor(&mut self, kind: BuildingKind) -> Vec<GameEvent> {
        let here = self.player;
        let Some(building) = self.building(kind) else {
            return Vec::new();
        };

        if building.exit().is_within_reach(here) {
            let entrance = building.entrance;
            return self.leave_building(kind, entrance);
        }

        if building.keeper_position.is_within_reach(here) {
            let text = format!("{}: \"{}\"", building.keeper, building.greeting);
            return vec![GameEvent::message(text)];
        }

        if let Some(index) = building.guests.iter().position(|g| g.is_within_reach(here)) {
            let text = format!(
                "Guest {}: \"The common room feels warmer once the lamps are lit.\"",
                index + 1
            );
            return vec![GameEvent::message(text)];
        }

        vec![GameEvent::message("Nothing here...")]
    }

    fn leave_building(&mut self, kind: BuildingKind, entrance: Position) -> Vec<GameEvent> {
        let bounds = self.bounds();
        let resolver = EntityPlacementResolver::from_config(&self.config);
        let below = bounds.clamp(Position::new(entrance.x, entrance.y + 1));
        let outside = resolver.nearest_open(below, &self.outdoor.solid_tiles());

        self.indoor = None;
        self.scene = Scene::Outdoor;
        self.player = outside;
        vec![
            GameEvent::LeftBuilding { building: kind },
            GameEvent::message("Back outside."),
        ]
    }

    /// Buys the good at `index` (0-based) from the building the player is in.
    ///
    /// Errors when outdoors or when the index is out of range. Already-owned
    /// goods and short gold are refused with a message instead.
    pub fn buy(&mut self, index: usize) -> QuestGridResult<Vec<GameEvent>> {
        let building = self
            .current_building()
            .ok_or_else(|| QuestGridError::InvalidAction("nothing to buy outdoors".to_string()))?;
        let good = building.goods.get(index).cloned().ok_or_else(|| {
            QuestGridError::InvalidAction(format!(
                "{} has no good #{} ({} for sale)",
                building.name,
                index + 1,
                building.goods.len()
            ))
        })?;

        let events = if self.inventory.has(&good.id) {
            vec![GameEvent::message(format!("Already bought {}.", good.name))]
        } else if !self.inventory.spend(good.price) {
            vec![GameEvent::message(format!(
                "Not enough gold. Need {}g, you have {}g.",
                good.price, self.inventory.gold
            ))]
        } else {
            self.inventory.add(good.id.clone(), good.name.clone());
            debug!("Bought {} for {}g", good.id, good.price);
            vec![
                GameEvent::Purchased {
                    id: good.id.clone(),
                    price: good.price,
                    gold_left: self.inventory.gold,
                },
                GameEvent::message(format!(
                    "Bought {} for {}g. Gold left: {}g.",
                    good.name, good.price, self.inventory.gold
                )),
            ]
        };
        Ok(self.record(events))
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        let mut entities = self.entities();
        entities.extend(self.landmarks());
        LevelSnapshot {
            spec: self.definition.spec.clone(),
            goals: self.quest.goals().clone(),
            bounds: self.bounds(),
            spawn: self.spawn,
            player: self.player,
            scene: self.scene,
            water: self.layout.water.clone(),
            path: self.layout.path.clone(),
            solid: self.active_collision().solid_tiles(),
            reachable: self.reachable.tiles.clone(),
            walkable: self.walkable.tiles.clone(),
            entities,
            bridge: self.bridge.clone(),
            completion: self.quest.completion_flags(),
            steps: self.quest.step_states(&self.inventory),
            next_step: self.quest.next_step_label(&self.inventory),
            inventory: self.inventory.clone(),
            won: self.quest.won,
            statistics: self.statistics.clone(),
        }
    }

    fn record(&mut self, events: Vec<GameEvent>) -> Vec<GameEvent> {
        for event in &events {
            self.statistics.update_from_event(event);
        }
        events
    }
}

/// Moves a solid spawn to the nearest open tile, if one is close.
fn settle_spawn(resolver: &EntityPlacementResolver, map: &CollisionMap, spawn: Position) -> Position {
    if !map.is_solid(spawn) {
        return spawn;
    }
    let moved = resolver.nearest_open(spawn, &map.solid_tiles());
    if moved == spawn {
        warn!("Spawn ({}, {}) is solid with no open tile nearby", spawn.x, spawn.y);
    } else {
        warn!(
            "Spawn ({}, {}) is solid; moved to ({}, {})",
            spawn.x, spawn.y, moved.x, moved.y
        );
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Biome, LayoutStyle};

    fn open_session(goals: &[GoalKind]) -> LevelSession {
        let config = GenerationConfig::default();
        let spec = LevelSpec::new(5, Biome::Meadow, LayoutStyle::Crossroads);
        let definition = LevelDefinition::with_defaults(spec, GoalStack::new(goals.iter().copied()), &config);
        let layout = TerrainLayout::empty(config.bounds());
        LevelSession::from_layout(definition, config, layout).unwrap()
    }

    #[test]
    fn test_defaults_follow_goals() {
        let config = GenerationConfig::default();
        let spec = LevelSpec::new(1, Biome::Meadow, LayoutStyle::Crossroads);
        let def = LevelDefinition::with_defaults(
            spec,
            GoalStack::new([GoalKind::Cure, GoalKind::KeyAndDoor]),
            &config,
        );
        assert_eq!(def.ingredient_ids(), vec!["ingredient1", "ingredient2", "ingredient3"]);
        assert_eq!(def.mix_station.as_ref().map(|p| p.position), Some(Position::new(9, 5)));
        assert_eq!(def.chest.as_ref().map(|p| p.position), Some(Position::new(12, 4)));
        assert_eq!(def.door.as_ref().map(|p| p.position), Some(Position::new(14, 6)));
        assert_eq!(def.shop_entrance_hint, Position::new(3, 6));
        assert_eq!(def.inn_entrance_hint, Position::new(12, 6));
        assert!(def.items.iter().all(|item| item.kind == ItemKind::Ingredient));
    }

    #[test]
    fn test_open_field_keeps_preferred_tiles() {
        let session = open_session(&[GoalKind::Cure, GoalKind::KeyAndDoor]);
        assert_eq!(session.npc.position, Position::new(5, 4));
        assert_eq!(session.buildings[0].entrance, Position::new(3, 6));
        assert_eq!(session.buildings[1].entrance, Position::new(12, 6));
        let map = session.outdoor_collision();
        assert_eq!(map.blocker_at(Position::new(5, 4)), Some(Blocker::Npc));
        assert_eq!(map.blocker_at(Position::new(12, 4)), Some(Blocker::Chest));
        assert_eq!(map.blocker_at(Position::new(14, 6)), Some(Blocker::Door));
        assert_eq!(map.blocker_at(Position::new(3, 6)), Some(Blocker::Entrance));
        assert!(session.bridge.is_none());
    }

    #[test]
    fn test_entities_are_reachable_and_distinct() {
        let session = open_session(&[GoalKind::Cure, GoalKind::LostItem, GoalKind::KeyAndDoor]);
        let entities = session.entities();
        let tiles: TileSet = entities.iter().map(|e| e.position).collect();
        assert_eq!(tiles.len(), entities.len());
        assert!(!tiles.contains(&session.spawn));
        for entity in &entities {
            assert!(session.reachable.contains(entity.position), "{} unreachable", entity.id);
        }
    }

    #[test]
    fn test_fallback_bridge_moves_spawn_off_span() {
        let session = open_session(&[GoalKind::RepairBridge]);
        let crossing = session.bridge.clone().unwrap();
        assert!(crossing.is_fallback());
        assert!(!crossing.contains(session.spawn));
        assert!(!session.outdoor_collision().is_solid(session.spawn));
        for tile in crossing.tiles {
            assert!(session.outdoor_collision().is_solid(tile));
        }
    }

    #[test]
    fn test_entrance_never_shares_the_bridge_span() {
        let config = GenerationConfig::default();
        let spec = LevelSpec::new(5, Biome::Meadow, LayoutStyle::Crossroads);
        let mut definition =
            LevelDefinition::with_defaults(spec, GoalStack::new([GoalKind::RepairBridge]), &config);
        definition.inn_entrance_hint = Position::new(8, 6);
        let layout = TerrainLayout::empty(config.bounds());
        let session = LevelSession::from_layout(definition, config, layout).unwrap();

        let crossing = session.bridge.clone().unwrap();
        assert!(crossing.is_fallback());
        let map = session.outdoor_collision();
        for tile in crossing.tiles {
            assert_eq!(map.blocker_at(tile), Some(Blocker::Bridge));
        }
        for building in &session.buildings {
            assert!(!crossing.contains(building.entrance));
            assert!(!crossing.banks().contains(&building.entrance));
            assert_eq!(map.blocker_at(building.entrance), Some(Blocker::Entrance));
        }
    }

    #[test]
    fn test_npc_does_not_seal_the_spawn_pocket() {
        // A 2x2 pocket in the top-left corner whose only way out is (2, 1).
        let config = GenerationConfig::default();
        let mut layout = TerrainLayout::empty(config.bounds());
        layout.rocks = vec![
            Position::new(2, 0),
            Position::new(3, 0),
            Position::new(0, 2),
            Position::new(1, 2),
            Position::new(2, 2),
            Position::new(3, 2),
        ];
        let spec = LevelSpec::new(5, Biome::Meadow, LayoutStyle::Crossroads);
        let mut definition =
            LevelDefinition::with_defaults(spec, GoalStack::new([GoalKind::LostItem]), &config);
        definition.spawn = Position::new(0, 0);
        definition.npc.position = Position::new(2, 1);
        let session = LevelSession::from_layout(definition, config, layout).unwrap();

        assert_ne!(session.npc.position, Position::new(2, 1));
        assert_ne!(session.npc.position, Position::new(3, 1));
        assert_eq!(session.walkable.len() + 1, session.reachable.len());
        assert!(session.walkable.contains(session.items[0].position));
    }

    #[test]
    fn test_move_blocked_by_solid_and_edge() {
        let mut session = open_session(&[GoalKind::LostItem]);
        session.player = Position::new(5, 5);
        let events = session.move_player(Direction::North);
        assert_eq!(events, vec![GameEvent::MoveBlocked { to: Position::new(5, 4) }]);
        assert_eq!(session.player, Position::new(5, 5));

        session.player = Position::new(0, 0);
        let events = session.move_player(Direction::West);
        assert_eq!(events, vec![GameEvent::MoveBlocked { to: Position::new(-1, 0) }]);
        assert_eq!(session.statistics.moves_blocked, 2);
    }

    #[test]
    fn test_lost_item_flow() {
        let mut session = open_session(&[GoalKind::LostItem]);
        let item_at = session.items[0].position;
        session.player = Position::new(item_at.x - 1, item_at.y);
        let events = session.move_player(Direction::East);
        assert!(events.contains(&GameEvent::ItemPickedUp {
            id: "lost_item".to_string(),
            name: "Lost Heirloom".to_string(),
        }));
        assert!(session.quest.lost_item.as_ref().unwrap().found);
        assert!(session.entities().iter().all(|e| e.kind != EntityKind::LostItem));

        session.player = Position::new(5, 5);
        let events = session.interact();
        assert!(events.contains(&GameEvent::ItemReturned));
        assert!(events.contains(&GameEvent::LevelWon));
        assert!(session.quest.won);
        assert!(session.quest.quest_known);
    }

    #[test]
    fn test_first_talk_without_progress() {
        let mut session = open_session(&[GoalKind::Cure]);
        session.player = Position::new(5, 5);
        let events = session.interact();
        assert_eq!(events[0], GameEvent::NpcTalked { first_talk: true });
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Message { text } if text.contains("Gather ingredients")
        )));
        assert!(!session.quest.won);
    }

    #[test]
    fn test_nothing_here() {
        let mut session = open_session(&[GoalKind::LostItem]);
        session.player = Position::new(0, 11);
        assert_eq!(session.interact(), vec![GameEvent::message("Nothing here...")]);
    }

    #[test]
    fn test_enter_shop_and_buy() {
        let mut session = open_session(&[GoalKind::RepairBridge]);
        session.player = Position::new(3, 7);
        let events = session.interact();
        assert_eq!(events[0], GameEvent::EnteredBuilding { building: BuildingKind::Shop });
        assert_eq!(session.player, Position::new(8, 9));
        assert!(session.active_collision().is_solid(Position::new(0, 5)));

        let events = session.buy(0).unwrap();
        assert!(matches!(events[0], GameEvent::Purchased { price: 20, gold_left: 40, .. }));
        let events = session.buy(0).unwrap();
        assert_eq!(events, vec![GameEvent::message("Already bought Bridge Planks.")]);
        assert!(session.buy(7).is_err());

        session.player = Position::new(8, 10);
        let events = session.interact();
        assert_eq!(events[0], GameEvent::LeftBuilding { building: BuildingKind::Shop });
        assert_eq!(session.scene, Scene::Outdoor);
        assert_eq!(session.player, Position::new(3, 7));
    }

    #[test]
    fn test_buy_needs_building_and_gold() {
        let mut session = open_session(&[GoalKind::RepairBridge]);
        assert!(matches!(session.buy(0), Err(QuestGridError::InvalidAction(_))));

        session.player = Position::new(3, 7);
        session.interact();
        session.inventory.gold = 12;
        let events = session.buy(1).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::message("Not enough gold. Need 15g, you have 12g.")]
        );
        assert!(!session.inventory.has("rope"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = open_session(&[GoalKind::KeyAndDoor]);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.scene, Scene::Outdoor);
        assert!(snapshot.entities.iter().any(|e| e.kind == EntityKind::BuildingEntrance));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: LevelSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
