//! Free-slot search strategy
//!
//! The scan is deterministic: the first fitting origin in scan order wins, and
//! the alternate orientation is only tried once the preferred one found nothing.

use serde::{Deserialize, Serialize};

/// Order in which candidate origins are visited
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Left to right, then top to bottom
    #[default]
    RowMajor,
    /// Top to bottom, then left to right
    ColumnMajor,
}

/// Whether the search may turn an item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Try a quarter turn after the preferred orientation fails
    #[default]
    FallbackQuarterTurn,
    /// Keep the preferred orientation
    Never,
}

/// Free-slot search configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementStrategy {
    #[serde(default)]
    pub order: ScanOrder,
    #[serde(default)]
    pub rotation: RotationPolicy,
}

impl PlacementStrategy {
    pub fn with_order(mut self, order: ScanOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Candidate origins for an item of `width x height` inside a `grid_width x grid_height` grid
    pub fn origins(
        &self,
        grid_width: u32,
        grid_height: u32,
        width: u32,
        height: u32,
    ) -> Box<dyn Iterator<Item = (u32, u32)>> {
        if width > grid_width || height > grid_height {
            return Box::new(core::iter::empty());
        }
        let max_x = grid_width - width;
        let max_y = grid_height - height;
        match self.order {
            ScanOrder::RowMajor => {
                Box::new((0..=max_y).flat_map(move |y| (0..=max_x).map(move |x| (x, y))))
            }
            ScanOrder::ColumnMajor => {
                Box::new((0..=max_x).flat_map(move |x| (0..=max_y).map(move |y| (x, y))))
            }
        }
    }
}
