//! Quarter-turn rotation of item footprints

use serde::{Deserialize, Serialize};

/// Rotation of an item inside a grid.
///
/// `Ninety` and `TwoSeventy` swap the footprint's width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Zero,
    Ninety,
    OneEighty,
    TwoSeventy,
}

impl Rotation {
    /// All rotations in clockwise order
    pub const ALL: [Rotation; 4] = [
        Rotation::Zero,
        Rotation::Ninety,
        Rotation::OneEighty,
        Rotation::TwoSeventy,
    ];

    /// Does this rotation swap width and height?
    #[inline]
    pub const fn is_transposed(self) -> bool {
        matches!(self, Rotation::Ninety | Rotation::TwoSeventy)
    }

    /// Apply the rotation to a `(width, height)` pair
    #[inline]
    pub const fn apply(self, width: u32, height: u32) -> (u32, u32) {
        if self.is_transposed() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Next rotation clockwise
    pub const fn clockwise(self) -> Self {
        match self {
            Rotation::Zero => Rotation::Ninety,
            Rotation::Ninety => Rotation::OneEighty,
            Rotation::OneEighty => Rotation::TwoSeventy,
            Rotation::TwoSeventy => Rotation::Zero,
        }
    }

    /// Angle in degrees
    pub const fn degrees(self) -> u16 {
        match self {
            Rotation::Zero => 0,
            Rotation::Ninety => 90,
            Rotation::OneEighty => 180,
            Rotation::TwoSeventy => 270,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        assert_eq!(Rotation::Zero.apply(2, 3), (2, 3));
        assert_eq!(Rotation::Ninety.apply(2, 3), (3, 2));
        assert_eq!(Rotation::OneEighty.apply(2, 3), (2, 3));
        assert_eq!(Rotation::TwoSeventy.apply(2, 3), (3, 2));
    }

    #[test]
    fn test_clockwise_cycle() {
        let mut r = Rotation::Zero;
        for _ in 0..4 {
            r = r.clockwise();
        }
        assert_eq!(r, Rotation::Zero);
        assert_eq!(Rotation::TwoSeventy.degrees(), 270);
    }
}
