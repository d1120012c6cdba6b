//! Occupancy grid
//!
//! Maps every cell of a container to at most one occupying item. `occupy`
//! checks every covered cell before writing any of them, so a failed call
//! leaves the grid untouched.

use crate::footprint::{Footprint, Placement, Rect};
use crate::strategy::{PlacementStrategy, RotationPolicy};
use gridbag_core::{InventoryError, ItemId, Rotation};

/// Why a rectangle does not fit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    /// Rectangle leaves the grid
    OutOfBounds,
    /// Cell is locked
    Locked { x: u32, y: u32 },
    /// Cell is held by another item
    Occupied { x: u32, y: u32, item: ItemId },
}

/// Cell occupancy of one container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<ItemId>>,
    locked: Vec<bool>,
}

impl OccupancyGrid {
    /// Create an empty grid
    pub fn new(width: u32, height: u32) -> Result<Self, InventoryError> {
        if width == 0 || height == 0 {
            return Err(InventoryError::InvalidFootprint { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            cells: vec![None; len],
            locked: vec![false; len],
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Item occupying `(x, y)`
    pub fn item_at(&self, x: u32, y: u32) -> Option<ItemId> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    pub fn is_locked(&self, x: u32, y: u32) -> bool {
        self.index(x, y).map(|i| self.locked[i]).unwrap_or(false)
    }

    /// Lock or unlock a cell. Returns false when out of bounds.
    pub fn set_locked(&mut self, x: u32, y: u32, locked: bool) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.locked[i] = locked;
                true
            }
            None => false,
        }
    }

    /// Check a rectangle, ignoring cells held by `ignore`
    pub fn check(&self, rect: Rect, ignore: Option<ItemId>) -> Result<(), Collision> {
        if rect.right() > self.width as u64 || rect.bottom() > self.height as u64 {
            return Err(Collision::OutOfBounds);
        }
        for (x, y) in rect.cells() {
            let i = y as usize * self.width as usize + x as usize;
            if self.locked[i] {
                return Err(Collision::Locked { x, y });
            }
            if let Some(item) = self.cells[i] {
                if Some(item) != ignore {
                    return Err(Collision::Occupied { x, y, item });
                }
            }
        }
        Ok(())
    }

    /// Can `footprint` be placed at `(x, y)` with `rotation`?
    pub fn can_place(
        &self,
        footprint: Footprint,
        x: u32,
        y: u32,
        rotation: Rotation,
        ignore: Option<ItemId>,
    ) -> bool {
        self.check(footprint.at(x, y, rotation), ignore).is_ok()
    }

    /// Find the first free placement in scan order.
    ///
    /// The `preferred` orientation is scanned first; a quarter turn is only
    /// tried when the item is `rotatable`, the policy allows it and the
    /// preferred orientation found nothing.
    pub fn find_free_slot(
        &self,
        footprint: Footprint,
        preferred: Rotation,
        rotatable: bool,
        strategy: &PlacementStrategy,
        ignore: Option<ItemId>,
    ) -> Option<Placement> {
        if let Some(found) = self.scan(footprint, preferred, strategy, ignore) {
            return Some(found);
        }
        let may_turn = rotatable
            && strategy.rotation == RotationPolicy::FallbackQuarterTurn
            && !footprint.is_square();
        if may_turn {
            return self.scan(footprint, preferred.clockwise(), strategy, ignore);
        }
        None
    }

    fn scan(
        &self,
        footprint: Footprint,
        rotation: Rotation,
        strategy: &PlacementStrategy,
        ignore: Option<ItemId>,
    ) -> Option<Placement> {
        let size = footprint.rotated(rotation);
        strategy
            .origins(self.width, self.height, size.width(), size.height())
            .find(|&(x, y)| self.check(footprint.at(x, y, rotation), ignore).is_ok())
            .map(|(x, y)| Placement::new(x, y, rotation))
    }

    /// Mark `rect` as held by `item`. Cells already held by `item` are allowed.
    pub fn occupy(&mut self, item: ItemId, rect: Rect) -> Result<(), Collision> {
        self.check(rect, Some(item))?;
        for (x, y) in rect.cells() {
            let i = y as usize * self.width as usize + x as usize;
            self.cells[i] = Some(item);
        }
        Ok(())
    }

    /// Free every cell held by `item`; returns the number of cells freed
    pub fn release(&mut self, item: ItemId) -> usize {
        let mut freed = 0;
        for cell in self.cells.iter_mut().filter(|c| **c == Some(item)) {
            *cell = None;
            freed += 1;
        }
        freed
    }

    /// Remove every occupant, keeping locks
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Cells held by `item`, row-major
    pub fn cells_of(&self, item: ItemId) -> Vec<(u32, u32)> {
        self.iter()
            .filter(|&(_, _, occupant)| occupant == Some(item))
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Number of cells that are neither occupied nor locked
    pub fn free_count(&self) -> usize {
        self.cells
            .iter()
            .zip(&self.locked)
            .filter(|(c, l)| c.is_none() && !**l)
            .count()
    }

    /// Iterate over `(x, y, occupant)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Option<ItemId>)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| ((i as u32) % width, (i as u32) / width, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ScanOrder;

    fn item(raw: u64) -> ItemId {
        ItemId::from_raw(raw)
    }

    #[test]
    fn test_zero_grid_rejected() {
        assert!(OccupancyGrid::new(0, 4).is_err());
    }

    #[test]
    fn test_overlap_scenario() {
        let mut grid = OccupancyGrid::new(4, 4).unwrap();
        let square = Footprint::new(2, 2).unwrap();

        assert!(grid.can_place(square, 0, 0, Rotation::Zero, None));
        grid.occupy(item(1), square.at(0, 0, Rotation::Zero)).unwrap();

        assert!(!grid.can_place(square, 1, 1, Rotation::Zero, None));
        assert_eq!(
            grid.occupy(item(2), square.at(1, 1, Rotation::Zero)),
            Err(Collision::Occupied { x: 1, y: 1, item: item(1) })
        );
        // Failed occupy left nothing behind
        assert_eq!(grid.occupied_count(), 4);

        grid.occupy(item(2), square.at(2, 0, Rotation::Zero)).unwrap();
        assert_eq!(grid.occupied_count(), 8);
    }

    #[test]
    fn test_out_of_bounds() {
        let grid = OccupancyGrid::new(4, 4).unwrap();
        let bar = Footprint::new(3, 1).unwrap();
        assert_eq!(grid.check(bar.at(2, 0, Rotation::Zero), None), Err(Collision::OutOfBounds));
        assert!(grid.can_place(bar, 3, 0, Rotation::Ninety, None));
        assert!(!grid.can_place(bar, 3, 2, Rotation::Ninety, None));
    }

    #[test]
    fn test_find_free_slot_row_major() {
        let mut grid = OccupancyGrid::new(4, 2).unwrap();
        let square = Footprint::new(2, 2).unwrap();
        grid.occupy(item(1), square.at(0, 0, Rotation::Zero)).unwrap();

        let found = grid.find_free_slot(square, Rotation::Zero, false, &PlacementStrategy::default(), None);
        assert_eq!(found, Some(Placement::at(2, 0)));

        grid.occupy(item(2), square.at(2, 0, Rotation::Zero)).unwrap();
        assert_eq!(
            grid.find_free_slot(Footprint::unit(), Rotation::Zero, false, &PlacementStrategy::default(), None),
            None
        );
    }

    #[test]
    fn test_rotation_only_after_unrotated_fails() {
        let grid = OccupancyGrid::new(1, 3).unwrap();
        let bar = Footprint::new(3, 1).unwrap();
        let strategy = PlacementStrategy::default();

        assert_eq!(grid.find_free_slot(bar, Rotation::Zero, false, &strategy, None), None);
        assert_eq!(
            grid.find_free_slot(bar, Rotation::Zero, true, &strategy, None),
            Some(Placement::new(0, 0, Rotation::Ninety))
        );

        let never = strategy.with_rotation(RotationPolicy::Never);
        assert_eq!(grid.find_free_slot(bar, Rotation::Zero, true, &never, None), None);

        // Unrotated fit wins even for rotatable items
        let wide = OccupancyGrid::new(3, 3).unwrap();
        assert_eq!(
            wide.find_free_slot(bar, Rotation::Zero, true, &strategy, None),
            Some(Placement::at(0, 0))
        );
    }

    #[test]
    fn test_column_major_search() {
        let mut grid = OccupancyGrid::new(3, 3).unwrap();
        grid.occupy(item(1), Footprint::unit().at(0, 0, Rotation::Zero)).unwrap();
        let strategy = PlacementStrategy::default().with_order(ScanOrder::ColumnMajor);
        assert_eq!(
            grid.find_free_slot(Footprint::unit(), Rotation::Zero, false, &strategy, None),
            Some(Placement::at(0, 1))
        );
    }

    #[test]
    fn test_locked_cells() {
        let mut grid = OccupancyGrid::new(2, 1).unwrap();
        assert!(grid.set_locked(0, 0, true));
        assert!(!grid.set_locked(5, 0, true));
        assert_eq!(
            grid.check(Footprint::unit().at(0, 0, Rotation::Zero), None),
            Err(Collision::Locked { x: 0, y: 0 })
        );
        assert_eq!(grid.free_count(), 1);
        assert_eq!(
            grid.find_free_slot(Footprint::unit(), Rotation::Zero, false, &PlacementStrategy::default(), None),
            Some(Placement::at(1, 0))
        );
    }

    #[test]
    fn test_ignore_own_cells() {
        let mut grid = OccupancyGrid::new(3, 1).unwrap();
        let bar = Footprint::new(2, 1).unwrap();
        grid.occupy(item(1), bar.at(0, 0, Rotation::Zero)).unwrap();

        assert!(!grid.can_place(bar, 1, 0, Rotation::Zero, None));
        assert!(grid.can_place(bar, 1, 0, Rotation::Zero, Some(item(1))));

        assert_eq!(grid.release(item(1)), 2);
        assert!(grid.cells_of(item(1)).is_empty());
    }
}
