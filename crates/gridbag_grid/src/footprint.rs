//! Footprints, placements and rectangles

use gridbag_core::{InventoryError, Rotation};
use serde::{Deserialize, Serialize};

/// Unrotated size of an item in cells. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    width: u32,
    height: u32,
}

impl Footprint {
    /// Create a footprint, rejecting zero dimensions
    pub fn new(width: u32, height: u32) -> Result<Self, InventoryError> {
        if width == 0 || height == 0 {
            return Err(InventoryError::InvalidFootprint { width, height });
        }
        Ok(Self { width, height })
    }

    /// A single cell
    pub const fn unit() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Is the footprint the same after a quarter turn?
    #[inline]
    pub const fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Size after rotation
    pub const fn rotated(&self, rotation: Rotation) -> Self {
        let (width, height) = rotation.apply(self.width, self.height);
        Self { width, height }
    }

    /// Rectangle covered when the origin is at `(x, y)`
    pub const fn at(&self, x: u32, y: u32, rotation: Rotation) -> Rect {
        let size = self.rotated(rotation);
        Rect {
            x,
            y,
            width: size.width,
            height: size.height,
        }
    }

    /// Number of cells covered
    pub const fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Origin cell and rotation of an item inside a grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Placement {
    pub const fn new(x: u32, y: u32, rotation: Rotation) -> Self {
        Self { x, y, rotation }
    }

    /// Unrotated placement at `(x, y)`
    pub const fn at(x: u32, y: u32) -> Self {
        Self::new(x, y, Rotation::Zero)
    }

    /// Rectangle covered by `footprint` at this placement
    pub const fn rect(&self, footprint: Footprint) -> Rect {
        footprint.at(self.x, self.y, self.rotation)
    }
}

/// Axis-aligned rectangle of cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && (x as u64) < self.right() && y >= self.y && (y as u64) < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        (self.x as u64) < other.right()
            && (other.x as u64) < self.right()
            && (self.y as u64) < other.bottom()
            && (other.y as u64) < self.bottom()
    }

    /// Iterate over covered cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let Rect {
            x,
            y,
            width,
            height,
        } = *self;
        (y..y + height).flat_map(move |cy| (x..x + width).map(move |cx| (cx, cy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_rejects_zero() {
        assert!(Footprint::new(0, 1).is_err());
        assert!(Footprint::new(1, 0).is_err());
        assert_eq!(Footprint::new(2, 3).unwrap().area(), 6);
    }

    #[test]
    fn test_rotated_rect() {
        let fp = Footprint::new(3, 1).unwrap();
        let rect = Placement::new(1, 2, Rotation::Ninety).rect(fp);
        assert_eq!(rect, Rect { x: 1, y: 2, width: 1, height: 3 });
        assert_eq!(rect.cells().collect::<Vec<_>>(), vec![(1, 2), (1, 3), (1, 4)]);
    }

    #[test]
    fn test_intersects() {
        let a = Rect { x: 0, y: 0, width: 2, height: 2 };
        let b = Rect { x: 1, y: 1, width: 2, height: 2 };
        let c = Rect { x: 2, y: 0, width: 2, height: 2 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(1, 1));
        assert!(!a.contains(2, 1));
    }
}
