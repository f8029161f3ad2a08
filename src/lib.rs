//! # Questgrid
//!
//! Seeded top-down level generation with reachability-checked quest placement.
//!
//! ## Architecture Overview
//!
//! A level is produced and played through a short pipeline:
//!
//! - **Generation**: a seeded [`TerrainLayoutGenerator`] turns a [`LevelSpec`]
//!   into water/path tile sets, obstacle clusters and decor
//! - **Collision**: a [`CollisionMap`] layers terrain and quest props into the
//!   single answer to "does this tile block movement"
//! - **Reachability**: a grid BFS from the spawn tile decides which tiles the
//!   player can ever stand on
//! - **Placement**: [`EntityPlacementResolver`] moves every quest entity onto a
//!   free, reachable tile; [`BridgeCrossingSelector`] picks the water span for
//!   the repair-bridge goal
//! - **Quests**: [`QuestStateMachine`] tracks the stacked goals of a level and
//!   reports when the level is won
//!
//! [`LevelSession`] owns all of the above for one level and is the entry point
//! for player movement and interactions.

pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use utils::*;

/// Core error type for the questgrid engine.
#[derive(thiserror::Error, Debug)]
pub enum QuestGridError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Level state is invalid
    #[error("Invalid level state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation produced unusable content
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Configuration values are out of range or unknown
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type used throughout the questgrid codebase.
pub type QuestGridResult<T> = Result<T, QuestGridError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Default map width in tiles
    pub const DEFAULT_MAP_WIDTH: i32 = 16;

    /// Default map height in tiles
    pub const DEFAULT_MAP_HEIGHT: i32 = 12;

    /// Largest square radius searched around a preferred placement tile
    pub const PLACEMENT_SEARCH_RADIUS: i32 = 12;

    /// Radius of the quick open-tile search run before placement resolution
    pub const OPEN_TILE_SEARCH_RADIUS: i32 = 4;

    /// Gold the player starts each level with
    pub const DEFAULT_STARTING_GOLD: u32 = 60;

    /// Resource ids consumed by a bridge repair
    pub const BRIDGE_MATERIALS: [&str; 3] = ["planks", "rope", "nails"];
}
