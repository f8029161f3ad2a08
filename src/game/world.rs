//! # Level Descriptors
//!
//! The small set of style parameters a level is generated from.

use crate::{QuestGridError, QuestGridResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Implements `name()`, `all()`, `Display` and `FromStr` for a unit-only enum
/// whose serde names are snake_case.
macro_rules! named_enum {
    ($ty:ident, $what:literal, [$($variant:ident => $name:literal),+ $(,)?]) => {
        impl $ty {
            /// Canonical snake_case name.
            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            /// Every variant, in declaration order.
            pub fn all() -> &'static [$ty] {
                &[$($ty::$variant,)+]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = QuestGridError;

            fn from_str(s: &str) -> QuestGridResult<Self> {
                let normalized = s.trim().to_lowercase();
                match normalized.as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(QuestGridError::InvalidConfig(format!(
                        "unknown {}: {:?}",
                        $what, s
                    ))),
                }
            }
        }
    };
}

/// The visual/ecological family of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Meadow,
    Forest,
    Town,
    Beach,
    Snow,
    Desert,
    Ruins,
    Castle,
}

named_enum!(Biome, "biome", [
    Meadow => "meadow",
    Forest => "forest",
    Town => "town",
    Beach => "beach",
    Snow => "snow",
    Desert => "desert",
    Ruins => "ruins",
    Castle => "castle",
]);

impl Biome {
    /// Features a level of this biome draws from when none are given.
    pub fn default_features(self) -> &'static [Feature] {
        use Feature::*;
        match self {
            Biome::Meadow => &[Path, Flowers, Trees, Rocks, Water],
            Biome::Forest => &[Path, Trees, Flowers, Rocks, Water],
            Biome::Town => &[Path, Trees, Flowers],
            Biome::Beach => &[Path, Water, Rocks, Flowers],
            Biome::Snow => &[Path, Rocks, Trees, Water],
            Biome::Desert | Biome::Ruins | Biome::Castle => &[Path, Rocks, Water],
        }
    }

    /// Layout styles that suit this biome, used when none is given.
    pub fn layout_styles(self) -> &'static [LayoutStyle] {
        use LayoutStyle::*;
        match self {
            Biome::Meadow => &[WindingRoad, Crossroads, RingRoad, Plaza],
            Biome::Forest => &[WindingRoad, MazeGrove, Riverbend, RingRoad],
            Biome::Town => &[Plaza, Crossroads, MarketStreet, RingRoad],
            Biome::Beach => &[Coastline, WindingRoad, Islands, Riverbend],
            Biome::Snow => &[WindingRoad, Crossroads, LakeCenter, RingRoad],
            Biome::Desert => &[Oasis, RuinRing, WindingRoad, Riverbend],
            Biome::Ruins => &[RuinRing, Crossroads, MazeGrove, Riverbend],
            Biome::Castle => &[Plaza, RingRoad, Crossroads, RuinRing],
        }
    }
}

/// A named generation pattern for paths and water.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStyle {
    #[default]
    WindingRoad,
    Crossroads,
    RingRoad,
    LakeCenter,
    Islands,
    RuinRing,
    Oasis,
    MarketStreet,
    Plaza,
    Coastline,
    MazeGrove,
    Riverbend,
}

named_enum!(LayoutStyle, "layout style", [
    WindingRoad => "winding_road",
    Crossroads => "crossroads",
    RingRoad => "ring_road",
    LakeCenter => "lake_center",
    Islands => "islands",
    RuinRing => "ruin_ring",
    Oasis => "oasis",
    MarketStreet => "market_street",
    Plaza => "plaza",
    Coastline => "coastline",
    MazeGrove => "maze_grove",
    Riverbend => "riverbend",
]);

/// Time of day. Rendering-only; generation never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    #[default]
    Day,
    Dawn,
    Sunset,
    Night,
}

named_enum!(TimeOfDay, "time of day", [
    Day => "day",
    Dawn => "dawn",
    Sunset => "sunset",
    Night => "night",
]);

/// Terrain features a level may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Path,
    Water,
    Trees,
    Rocks,
    Flowers,
}

named_enum!(Feature, "feature", [
    Path => "path",
    Water => "water",
    Trees => "trees",
    Rocks => "rocks",
    Flowers => "flowers",
]);

/// What a single tile is, as far as movement and drawing are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileRole {
    Water,
    Path,
    SolidObstacle,
    /// Visual-only dressing; never blocks.
    Decor,
    /// Plain ground with nothing on it.
    Ground,
}

/// Everything terrain generation needs to know about one level.
///
/// # Examples
///
/// ```
/// use questgrid::{Biome, Feature, LayoutStyle, LevelSpec};
///
/// let spec = LevelSpec::new(12345, Biome::Desert, LayoutStyle::Oasis)
///     .with_theme_tags(["Desert"]);
/// assert!(spec.has_tag("desert"));
/// assert!(spec.has_feature(Feature::Water));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Seed for the level's single RNG stream
    pub seed: u64,
    pub biome: Biome,
    pub layout_style: LayoutStyle,
    pub time_of_day: TimeOfDay,
    /// Lowercase free-form labels driving theme decor
    pub theme_tags: BTreeSet<String>,
    pub features: BTreeSet<Feature>,
}

impl LevelSpec {
    /// Creates a spec with the biome's full default feature list and no tags.
    pub fn new(seed: u64, biome: Biome, layout_style: LayoutStyle) -> Self {
        Self {
            seed,
            biome,
            layout_style,
            time_of_day: TimeOfDay::Day,
            theme_tags: BTreeSet::new(),
            features: biome.default_features().iter().copied().collect(),
        }
    }

    /// Replaces the feature set.
    pub fn with_features<I: IntoIterator<Item = Feature>>(mut self, features: I) -> Self {
        self.features = features.into_iter().collect();
        self
    }

    /// Replaces the theme tags, normalising them to trimmed lowercase.
    pub fn with_theme_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.theme_tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn with_time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = time_of_day;
        self
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.theme_tags.contains(tag)
    }

    /// True if any of `tags` is present.
    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.has_tag(t))
    }
}
