//! # Utilities Module
//!
//! Grid geometry helpers and the shared reachability traversal.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use pathfinding::*;
