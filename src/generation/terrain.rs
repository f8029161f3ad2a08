//! # Terrain Layout Generation
//!
//! Turns a [`LevelSpec`] into path and water tile sets, blocking obstacle
//! clusters, and non-blocking decor.
//!
//! ## Draw order
//!
//! All randomness comes from one stream, consumed in this order: paths,
//! water, tree/rock/bush clusters, flowers, lamps, signs, ruins, fences, then
//! theme decor. Changing the order changes every level generated after it.

use super::utils::{chance, create_rng, pick, rand_between};
use super::{GenerationConfig, Generator};
use crate::utils::within_pond_disk;
use crate::{
    Feature, GridBounds, LayoutStyle, LevelSpec, Position, QuestGridError, QuestGridResult,
    TileRole, TileSet,
};
use log::debug;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Non-blocking dressing placed on the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorKind {
    Bush,
    Flower,
    Lamp,
    Sign,
    Ruin,
    Fence,
    Cactus,
    Shell,
    SnowPile,
    Crate,
    Statue,
    Vine,
    Mushroom,
}

/// The generated outdoor terrain of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainLayout {
    pub bounds: GridBounds,
    pub water: TileSet,
    pub path: TileSet,
    /// Blocking tree points, in generation order
    pub trees: Vec<Position>,
    /// Blocking rock points, in generation order
    pub rocks: Vec<Position>,
    pub decor: BTreeMap<DecorKind, Vec<Position>>,
}

impl TerrainLayout {
    /// An empty layout: all ground.
    pub fn empty(bounds: GridBounds) -> Self {
        Self {
            bounds,
            water: TileSet::new(),
            path: TileSet::new(),
            trees: Vec::new(),
            rocks: Vec::new(),
            decor: BTreeMap::new(),
        }
    }

    /// Blocking tiles that are not water.
    pub fn obstacle_tiles(&self) -> TileSet {
        self.trees.iter().chain(self.rocks.iter()).copied().collect()
    }

    /// Static outdoor collision: water ∪ trees ∪ rocks.
    pub fn solid_tiles(&self) -> TileSet {
        let mut solid = self.water.clone();
        solid.extend(self.obstacle_tiles());
        solid
    }

    /// Decor points of one kind.
    pub fn decor(&self, kind: DecorKind) -> &[Position] {
        self.decor.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn decor_count(&self, kind: DecorKind) -> usize {
        self.decor(kind).len()
    }

    /// Classifies a tile. Water wins over obstacles, obstacles over paths,
    /// and paths over decor.
    pub fn tile_role(&self, pos: Position) -> TileRole {
        if self.water.contains(&pos) {
            TileRole::Water
        } else if self.trees.contains(&pos) || self.rocks.contains(&pos) {
            TileRole::SolidObstacle
        } else if self.path.contains(&pos) {
            TileRole::Path
        } else if self.decor.values().any(|points| points.contains(&pos)) {
            TileRole::Decor
        } else {
            TileRole::Ground
        }
    }

    fn is_water_or_path(&self, pos: Position) -> bool {
        self.water.contains(&pos) || self.path.contains(&pos)
    }

    fn push_decor(&mut self, kind: DecorKind, pos: Position) {
        self.decor.entry(kind).or_default().push(pos);
    }
}

/// Generates a [`TerrainLayout`] for one level description.
///
/// # Examples
///
/// ```
/// use questgrid::{Biome, GenerationConfig, LayoutStyle, LevelSpec, TerrainLayoutGenerator};
///
/// let spec = LevelSpec::new(7, Biome::Meadow, LayoutStyle::Crossroads);
/// let generator = TerrainLayoutGenerator::new(spec);
/// let a = generator.generate_seeded(&GenerationConfig::default());
/// let b = generator.generate_seeded(&GenerationConfig::default());
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct TerrainLayoutGenerator {
    spec: LevelSpec,
}

impl TerrainLayoutGenerator {
    pub fn new(spec: LevelSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &LevelSpec {
        &self.spec
    }

    /// Generates with a fresh stream seeded from the level's own seed.
    pub fn generate_seeded(&self, config: &GenerationConfig) -> TerrainLayout {
        let mut rng = create_rng(self.spec.seed);
        self.build(config, &mut rng)
    }

    /// Runs every generation phase against `rng`.
    pub fn build(&self, config: &GenerationConfig, rng: &mut StdRng) -> TerrainLayout {
        let mut layout = TerrainLayout::empty(config.bounds());

        if self.spec.has_feature(Feature::Path) {
            self.add_paths(&mut layout, config, rng);
        }
        if self.spec.has_feature(Feature::Water) {
            self.add_water(&mut layout, config, rng);
        }
        self.add_clusters(&mut layout, rng);
        if self.spec.has_feature(Feature::Flowers) {
            self.add_flowers(&mut layout, rng);
        }
        self.add_landmarks(&mut layout, config, rng);
        self.add_theme_decor(&mut layout, rng);

        debug!(
            "Generated {} layout (seed {}): {} water, {} path, {} trees, {} rocks",
            self.spec.layout_style,
            self.spec.seed,
            layout.water.len(),
            layout.path.len(),
            layout.trees.len(),
            layout.rocks.len()
        );
        layout
    }

    fn add_paths(&self, layout: &mut TerrainLayout, config: &GenerationConfig, rng: &mut StdRng) {
        let (w, h) = (layout.bounds.width, layout.bounds.height);
        let (cx, cy) = (w / 2, h / 2);
        let path = &mut layout.path;

        match self.spec.layout_style {
            LayoutStyle::Crossroads => {
                for x in 0..w {
                    path.insert(Position::new(x, cy));
                    if chance(rng, config.crossroads_second_lane_chance) {
                        path.insert(Position::new(x, cy + 1));
                    }
                }
                for y in 0..h {
                    path.insert(Position::new(cx, y));
                    if chance(rng, config.crossroads_second_lane_chance) {
                        path.insert(Position::new(cx + 1, y));
                    }
                }
            }
            LayoutStyle::RingRoad => {
                for x in 1..w - 1 {
                    for y in [2, 3, h - 4, h - 3] {
                        path.insert(Position::new(x, y));
                    }
                }
                for y in 2..h - 2 {
                    for x in [1, 2, w - 3, w - 2] {
                        path.insert(Position::new(x, y));
                    }
                }
            }
            LayoutStyle::Plaza => {
                for y in cy - 1..=cy + 1 {
                    for x in cx - 2..=cx + 2 {
                        path.insert(Position::new(x, y));
                    }
                }
                for x in 0..w {
                    if chance(rng, config.plaza_arm_chance) {
                        path.insert(Position::new(x, cy));
                    }
                }
                for y in 0..h {
                    if chance(rng, config.plaza_arm_chance) {
                        path.insert(Position::new(cx, y));
                    }
                }
            }
            LayoutStyle::MarketStreet => {
                let y = rand_between(rng, 2, h - 3);
                for x in 0..w {
                    path.insert(Position::new(x, y));
                    if chance(rng, config.market_second_lane_chance) {
                        path.insert(Position::new(x, y + 1));
                    }
                }
                for _ in 0..3 {
                    let sx = rand_between(rng, 3, w - 4);
                    for yy in 2..h - 2 {
                        if chance(rng, config.market_side_street_chance) {
                            path.insert(Position::new(sx, yy));
                        }
                    }
                }
            }
            _ => {
                // Winding road from the west edge.
                let mut py = h / 2;
                for px in 0..w {
                    path.insert(Position::new(px, py));
                    if chance(rng, config.winding_second_lane_chance) {
                        path.insert(Position::new(px, py + 1));
                    }
                    if chance(rng, config.winding_drift_chance) {
                        py = (py + pick(rng, &[-1, 1], 0)).clamp(2, h - 3);
                    }
                }
            }
        }
    }

    fn add_water(&self, layout: &mut TerrainLayout, config: &GenerationConfig, rng: &mut StdRng) {
        let (w, h) = (layout.bounds.width, layout.bounds.height);

        match self.spec.layout_style {
            LayoutStyle::Coastline => {
                let edge = pick(rng, &["top", "bottom", "left", "right"], "top");
                let band: Vec<Position> = match edge {
                    "top" | "bottom" => {
                        let y0 = if edge == "top" { 0 } else { h - 4 };
                        (y0..y0 + 4)
                            .flat_map(|y| (0..w).map(move |x| Position::new(x, y)))
                            .collect()
                    }
                    _ => {
                        let x0 = if edge == "left" { 0 } else { w - 4 };
                        (x0..x0 + 4)
                            .flat_map(|x| (0..h).map(move |y| Position::new(x, y)))
                            .collect()
                    }
                };
                layout.water.extend(band);
            }
            LayoutStyle::Riverbend | LayoutStyle::MazeGrove => {
                let horizontal = chance(rng, 0.5);
                add_river(layout, config, rng, horizontal);
                if chance(rng, config.riverbend_pond_chance) {
                    let px = rand_between(rng, 4, w - 5);
                    let py = rand_between(rng, 3, h - 4);
                    add_pond(layout, Position::new(px, py), 2);
                }
            }
            LayoutStyle::Islands => {
                for _ in 0..rand_between(rng, 2, 4) {
                    let px = rand_between(rng, 3, w - 4);
                    let py = rand_between(rng, 3, h - 4);
                    let r = rand_between(rng, 2, 3);
                    add_pond(layout, Position::new(px, py), r);
                }
            }
            LayoutStyle::Oasis => {
                let py = rand_between(rng, 3, h - 5);
                add_pond(layout, Position::new(w / 2, py), 3);
            }
            LayoutStyle::LakeCenter => {
                add_pond(layout, layout.bounds.center(), 4);
            }
            _ => {
                let px = rand_between(rng, 5, w - 5);
                let py = rand_between(rng, 3, h - 4);
                add_pond(layout, Position::new(px, py), 3);
            }
        }
    }

    fn add_clusters(&self, layout: &mut TerrainLayout, rng: &mut StdRng) {
        if self.spec.has_feature(Feature::Trees) {
            let count = rand_between(rng, 5, 10);
            let clusters = rand_between(rng, 2, 3);
            let points = scatter_cluster(layout, rng, count, clusters);
            layout.trees.extend(points);
        }
        if self.spec.has_feature(Feature::Rocks) {
            let count = rand_between(rng, 3, 6);
            let clusters = rand_between(rng, 2, 3);
            let points = scatter_cluster(layout, rng, count, clusters);
            layout.rocks.extend(points);
        }
        let count = rand_between(rng, 4, 9);
        let clusters = rand_between(rng, 2, 3);
        for pos in scatter_cluster(layout, rng, count, clusters) {
            layout.push_decor(DecorKind::Bush, pos);
        }
    }

    fn add_flowers(&self, layout: &mut TerrainLayout, rng: &mut StdRng) {
        let (w, h) = (layout.bounds.width, layout.bounds.height);
        for _ in 0..rand_between(rng, 10, 20) {
            let pos = Position::new(rand_between(rng, 0, w - 1), rand_between(rng, 0, h - 1));
            if !layout.is_water_or_path(pos) {
                layout.push_decor(DecorKind::Flower, pos);
            }
        }
    }

    fn add_landmarks(&self, layout: &mut TerrainLayout, config: &GenerationConfig, rng: &mut StdRng) {
        for _ in 0..rand_between(rng, 2, 4) {
            let pos = interior_point(layout.bounds, rng);
            if layout.path.contains(&pos) && !layout.water.contains(&pos) {
                layout.push_decor(DecorKind::Lamp, pos);
            }
        }

        for _ in 0..rand_between(rng, 1, 3) {
            let pos = interior_point(layout.bounds, rng);
            if !layout.is_water_or_path(pos) {
                layout.push_decor(DecorKind::Sign, pos);
            }
        }

        if self.spec.layout_style == LayoutStyle::RuinRing || self.spec.has_tag("ruins") {
            for _ in 0..rand_between(rng, 2, 4) {
                let pos = interior_point(layout.bounds, rng);
                if !layout.is_water_or_path(pos) {
                    layout.push_decor(DecorKind::Ruin, pos);
                }
            }
        }

        for _ in 0..rand_between(rng, 5, 10) {
            let pos = interior_point(layout.bounds, rng);
            if layout.path.contains(&pos)
                && !layout.water.contains(&pos)
                && chance(rng, config.fence_chance)
            {
                layout.push_decor(DecorKind::Fence, pos);
            }
        }
    }

    fn add_theme_decor(&self, layout: &mut TerrainLayout, rng: &mut StdRng) {
        let spec = &self.spec;
        if spec.has_tag("desert") {
            let count = rand_between(rng, 3, 6);
            sprinkle(layout, rng, DecorKind::Cactus, count, false);
        }
        if spec.has_tag("beach") {
            let count = rand_between(rng, 4, 8);
            sprinkle(layout, rng, DecorKind::Shell, count, false);
        }
        if spec.has_tag("snow") {
            let count = rand_between(rng, 3, 7);
            sprinkle(layout, rng, DecorKind::SnowPile, count, false);
        }
        if spec.has_any_tag(&["town", "market", "bazaar", "port", "harbor"]) {
            let count = rand_between(rng, 2, 5);
            sprinkle(layout, rng, DecorKind::Crate, count, true);
        }
        if spec.has_any_tag(&["ruins", "temple", "castle"]) {
            let count = rand_between(rng, 1, 3);
            sprinkle(layout, rng, DecorKind::Statue, count, false);
            let count = rand_between(rng, 4, 8);
            sprinkle(layout, rng, DecorKind::Vine, count, false);
        }
        if spec.has_tag("forest") && spec.has_any_tag(&["night", "mushroom"]) {
            let count = rand_between(rng, 4, 8);
            sprinkle(layout, rng, DecorKind::Mushroom, count, false);
        }
    }
}

impl Generator<TerrainLayout> for TerrainLayoutGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> QuestGridResult<TerrainLayout> {
        let layout = self.build(config, rng);
        self.validate(&layout, config)?;
        Ok(layout)
    }

    fn validate(&self, content: &TerrainLayout, config: &GenerationConfig) -> QuestGridResult<()> {
        let bounds = config.bounds();
        let all_tiles = content
            .water
            .iter()
            .chain(content.path.iter())
            .chain(content.trees.iter())
            .chain(content.rocks.iter())
            .chain(content.decor.values().flatten());
        if let Some(pos) = all_tiles.into_iter().find(|pos| !bounds.contains(**pos)) {
            return Err(QuestGridError::GenerationFailed(format!(
                "tile ({}, {}) lies outside the {}x{} grid",
                pos.x, pos.y, bounds.width, bounds.height
            )));
        }
        if let Some(pos) = content
            .trees
            .iter()
            .chain(content.rocks.iter())
            .find(|pos| content.is_water_or_path(**pos))
        {
            return Err(QuestGridError::GenerationFailed(format!(
                "obstacle at ({}, {}) sits on water or path",
                pos.x, pos.y
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "TerrainLayoutGenerator"
    }
}

/// Adds every in-bounds tile of a pond disk.
fn add_pond(layout: &mut TerrainLayout, center: Position, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let pos = center + Position::new(dx, dy);
            if within_pond_disk(dx, dy, radius) && layout.bounds.contains(pos) {
                layout.water.insert(pos);
            }
        }
    }
}

/// A river crossing the whole grid, drifting sideways inside a 2-tile margin.
fn add_river(layout: &mut TerrainLayout, config: &GenerationConfig, rng: &mut StdRng, horizontal: bool) {
    let (w, h) = (layout.bounds.width, layout.bounds.height);
    let (length, span) = if horizontal { (w, h) } else { (h, w) };
    let mut offset = rand_between(rng, 2, span - 3);
    for along in 0..length {
        let pos = if horizontal {
            Position::new(along, offset)
        } else {
            Position::new(offset, along)
        };
        layout.water.insert(pos);
        if chance(rng, config.river_drift_chance) {
            offset = (offset + pick(rng, &[-1, 0, 1], 0)).clamp(2, span - 3);
        }
    }
}

/// Two-phase cluster scatter. Points landing on water or path are dropped.
fn scatter_cluster(layout: &TerrainLayout, rng: &mut StdRng, count: i32, clusters: i32) -> Vec<Position> {
    if count <= 0 {
        return Vec::new();
    }
    let bounds = layout.bounds;
    let centers: Vec<Position> = (0..clusters.max(1))
        .map(|_| interior_point(bounds, rng))
        .collect();

    let mut points = Vec::new();
    for _ in 0..count {
        let center = pick(rng, &centers, bounds.center());
        let jitter = Position::new(rand_between(rng, -3, 3), rand_between(rng, -3, 3));
        let pos = bounds.clamp(center + jitter);
        if !layout.is_water_or_path(pos) {
            points.push(pos);
        }
    }
    points
}

/// Theme decor scatter. Water is always avoided; paths only when `allow_path` is false.
fn sprinkle(layout: &mut TerrainLayout, rng: &mut StdRng, kind: DecorKind, count: i32, allow_path: bool) {
    for _ in 0..count {
        let pos = interior_point(layout.bounds, rng);
        if layout.water.contains(&pos) || (!allow_path && layout.path.contains(&pos)) {
            continue;
        }
        layout.push_decor(kind, pos);
    }
}

/// A uniform tile one step in from every edge.
fn interior_point(bounds: GridBounds, rng: &mut StdRng) -> Position {
    Position::new(
        rand_between(rng, 1, bounds.width - 2),
        rand_between(rng, 1, bounds.height - 2),
    )
}
