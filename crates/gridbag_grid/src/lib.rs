//! # gridbag_grid - Grid Engine
//!
//! Per-container 2D occupancy model:
//! - Footprints and rotated placement rectangles
//! - Occupancy grid mapping each cell to at most one item
//! - Fit checks and deterministic free-slot search
//! - Locked tiles that never accept an item

pub mod footprint;
pub mod grid;
pub mod strategy;

pub use footprint::*;
pub use grid::*;
pub use strategy::*;

pub mod prelude {
    pub use crate::footprint::{Footprint, Placement, Rect};
    pub use crate::grid::{Collision, OccupancyGrid};
    pub use crate::strategy::{PlacementStrategy, RotationPolicy, ScanOrder};
}
