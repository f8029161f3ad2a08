//! # Generation Module
//!
//! Procedural content generation for outdoor levels, building interiors, and
//! the placement of quest entities on them.
//!
//! Every random decision of a level comes from one seeded [`StdRng`] drawn in a
//! fixed order, so identical inputs always produce identical levels.

pub mod bridge;
pub mod hints;
pub mod interior;
pub mod placement;
pub mod terrain;

pub use bridge::*;
pub use hints::*;
pub use interior::*;
pub use placement::*;
pub use terrain::*;

use crate::{config, GridBounds, QuestGridError, QuestGridResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for procedural generation and level setup.
///
/// Controls grid size, placement search limits, and every tuning probability
/// the terrain generator draws against. Missing fields in a JSON config fall
/// back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid width in tiles
    pub width: i32,
    /// Grid height in tiles
    pub height: i32,
    /// Largest box radius searched around a preferred placement tile
    pub placement_search_radius: i32,
    /// Radius of the open-tile pre-search run before placement
    pub open_tile_search_radius: i32,
    /// Gold the player starts each level with
    pub starting_gold: u32,
    /// Chance per step that the winding road drifts a row
    pub winding_drift_chance: f64,
    /// Chance per column that the winding road gets a second lane
    pub winding_second_lane_chance: f64,
    /// Chance per tile of the crossroads' second row and column
    pub crossroads_second_lane_chance: f64,
    /// Chance per step that a river drifts sideways
    pub river_drift_chance: f64,
    /// Chance per tile of a plaza arm road
    pub plaza_arm_chance: f64,
    /// Chance per column of the market street's second lane
    pub market_second_lane_chance: f64,
    /// Chance per tile of a market side street
    pub market_side_street_chance: f64,
    /// Chance that a riverbend also gets a small pond
    pub riverbend_pond_chance: f64,
    /// Chance that a fence attempt on a path tile is kept
    pub fence_chance: f64,
}

impl GenerationConfig {
    /// Creates the default configuration: a 16×12 grid and the standard tuning.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::GenerationConfig;
    ///
    /// let config = GenerationConfig::new();
    /// assert_eq!((config.width, config.height), (16, 12));
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new() -> Self {
        Self {
            width: config::DEFAULT_MAP_WIDTH,
            height: config::DEFAULT_MAP_HEIGHT,
            placement_search_radius: config::PLACEMENT_SEARCH_RADIUS,
            open_tile_search_radius: config::OPEN_TILE_SEARCH_RADIUS,
            starting_gold: config::DEFAULT_STARTING_GOLD,
            winding_drift_chance: 0.35,
            winding_second_lane_chance: 0.6,
            crossroads_second_lane_chance: 0.6,
            river_drift_chance: 0.25,
            plaza_arm_chance: 0.7,
            market_second_lane_chance: 0.4,
            market_side_street_chance: 0.75,
            riverbend_pond_chance: 0.5,
            fence_chance: 0.35,
        }
    }

    /// Creates a configuration for tests: straight roads and rivers, full lanes.
    pub fn for_testing() -> Self {
        Self {
            winding_drift_chance: 0.0,
            winding_second_lane_chance: 1.0,
            crossroads_second_lane_chance: 1.0,
            river_drift_chance: 0.0,
            plaza_arm_chance: 1.0,
            market_second_lane_chance: 1.0,
            market_side_street_chance: 1.0,
            ..Self::new()
        }
    }

    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> QuestGridResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> QuestGridResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// The grid described by this configuration.
    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.width, self.height)
    }

    /// Rejects grids smaller than 8×8, non-positive search radii, and
    /// probabilities outside `[0, 1]`.
    pub fn validate(&self) -> QuestGridResult<()> {
        if self.width < 8 || self.height < 8 {
            return Err(QuestGridError::InvalidConfig(format!(
                "grid must be at least 8x8, got {}x{}",
                self.width, self.height
            )));
        }
        if self.placement_search_radius < 1 || self.open_tile_search_radius < 1 {
            return Err(QuestGridError::InvalidConfig(
                "search radii must be at least 1".to_string(),
            ));
        }

        let probabilities = [
            ("winding_drift_chance", self.winding_drift_chance),
            ("winding_second_lane_chance", self.winding_second_lane_chance),
            ("crossroads_second_lane_chance", self.crossroads_second_lane_chance),
            ("river_drift_chance", self.river_drift_chance),
            ("plaza_arm_chance", self.plaza_arm_chance),
            ("market_second_lane_chance", self.market_second_lane_chance),
            ("market_side_street_chance", self.market_side_street_chance),
            ("riverbend_pond_chance", self.riverbend_pond_chance),
            ("fence_chance", self.fence_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(QuestGridError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for procedural generators.
///
/// Generators take their inputs at construction and draw every random
/// decision from the caller's RNG, so the caller controls draw order.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> QuestGridResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> QuestGridResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    /// Creates the single seeded random stream for one level.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Inclusive integer draw. An empty range yields `lo`.
    pub fn rand_between(rng: &mut StdRng, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }

    /// Bernoulli draw. Always consumes one value from the stream.
    pub fn chance(rng: &mut StdRng, p: f64) -> bool {
        rng.gen::<f64>() < p
    }

    /// Uniform pick from a non-empty slice; `fallback` when empty.
    pub fn pick<T: Copy>(rng: &mut StdRng, items: &[T], fallback: T) -> T {
        items.choose(rng).copied().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new();
        assert_eq!(config.placement_search_radius, 12);
        assert_eq!(config.open_tile_search_radius, 4);
        assert_eq!(config.starting_gold, 60);
        assert_eq!(config.bounds(), GridBounds::new(16, 12));
        assert_eq!(config, GenerationConfig::default());
    }

    #[test]
    fn test_for_testing_is_valid() {
        let config = GenerationConfig::for_testing();
        assert!(config.validate().is_ok());
        assert_eq!(config.winding_drift_chance, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let small = GenerationConfig {
            width: 6,
            ..GenerationConfig::new()
        };
        assert!(matches!(small.validate(), Err(QuestGridError::InvalidConfig(_))));

        let bad_chance = GenerationConfig {
            fence_chance: 1.5,
            ..GenerationConfig::new()
        };
        assert!(bad_chance.validate().is_err());

        let bad_radius = GenerationConfig {
            placement_search_radius: 0,
            ..GenerationConfig::new()
        };
        assert!(bad_radius.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GenerationConfig::from_json_str(r#"{"width": 20, "starting_gold": 100}"#)
            .expect("config should parse");
        assert_eq!(config.width, 20);
        assert_eq!(config.height, 12);
        assert_eq!(config.starting_gold, 100);
        assert_eq!(config.river_drift_chance, 0.25);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            GenerationConfig::from_json_str("{not json"),
            Err(QuestGridError::Serde(_))
        ));
        assert!(GenerationConfig::from_json_str(r#"{"height": 4}"#).is_err());
    }

    #[test]
    fn test_utils_rng_is_seeded() {
        let mut a = utils::create_rng(12345);
        let mut b = utils::create_rng(12345);
        let xs: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_utils_draw_helpers() {
        let mut rng = utils::create_rng(7);
        for _ in 0..50 {
            let v = utils::rand_between(&mut rng, 2, 4);
            assert!((2..=4).contains(&v));
        }
        assert_eq!(utils::rand_between(&mut rng, 5, 5), 5);
        assert_eq!(utils::rand_between(&mut rng, 5, 3), 5);
        assert!(!utils::chance(&mut rng, 0.0));
        assert!(utils::chance(&mut rng, 1.0));
        assert_eq!(utils::pick::<i32>(&mut rng, &[], 9), 9);
    }
}
