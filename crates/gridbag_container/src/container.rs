//! Containers
//!
//! A container owns an ordered item list and, unless it is data-only, an
//! occupancy grid derived from that list. Every mutating method keeps the two
//! consistent or fails without touching either.

use crate::instance::ItemInstance;
use crate::settings::ContainerSettings;
use gridbag_catalog::{ContainerStyle, ItemDefinition};
use gridbag_core::{ContainerId, InventoryError, ItemId, Result, Rotation};
use gridbag_grid::{Collision, Footprint, OccupancyGrid, Placement, PlacementStrategy};
use std::collections::HashSet;

/// A grid of cells holding item instances
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    id: ContainerId,
    settings: ContainerSettings,
    items: Vec<ItemInstance>,
    grid: Option<OccupancyGrid>,
    owner: Option<ItemId>,
    quarantine: Option<String>,
}

impl Container {
    /// Create an empty container
    pub fn new(id: ContainerId, settings: ContainerSettings) -> Result<Self> {
        let grid = Self::empty_grid(&settings)?;
        Ok(Self {
            id,
            settings,
            items: Vec::new(),
            grid,
            owner: None,
            quarantine: None,
        })
    }

    fn empty_grid(settings: &ContainerSettings) -> Result<Option<OccupancyGrid>> {
        settings.validate()?;
        if !settings.style.has_grid() {
            return Ok(None);
        }
        let mut grid = OccupancyGrid::new(settings.width, settings.height)?;
        for (x, y) in settings.locked_tiles() {
            grid.set_locked(x, y, true);
        }
        Ok(Some(grid))
    }

    #[inline]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    #[inline]
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    #[inline]
    pub fn style(&self) -> ContainerStyle {
        self.settings.style
    }

    /// Item carrying this container, if any
    #[inline]
    pub fn owner(&self) -> Option<ItemId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ItemId>) {
        self.owner = owner;
    }

    /// Items in insertion order
    #[inline]
    pub fn items(&self) -> &[ItemInstance] {
        &self.items
    }

    pub fn get(&self, item: ItemId) -> Option<&ItemInstance> {
        self.items.iter().find(|i| i.id == item)
    }

    pub(crate) fn get_mut(&mut self, item: ItemId) -> Option<&mut ItemInstance> {
        self.items.iter_mut().find(|i| i.id == item)
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.iter().any(|i| i.id == item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Occupancy grid (`None` for data-only containers)
    pub fn grid(&self) -> Option<&OccupancyGrid> {
        self.grid.as_ref()
    }

    /// Raw grid access for tooling. Bypasses every consistency check; run
    /// [`Container::verify`] afterwards.
    pub fn grid_mut(&mut self) -> Option<&mut OccupancyGrid> {
        self.grid.as_mut()
    }

    /// Number of cells that can still take an item (`None` when unbounded)
    pub fn free_cells(&self) -> Option<usize> {
        self.grid.as_ref().map(OccupancyGrid::free_count)
    }

    /// Sum of stack counts
    pub fn total_count(&self) -> u64 {
        self.items.iter().map(|i| i.count as u64).sum()
    }

    // ---- quarantine ----

    pub fn is_quarantined(&self) -> bool {
        self.quarantine.is_some()
    }

    /// Refuse every further operation until the grid is rebuilt
    pub fn quarantine(&mut self, reason: impl Into<String>) {
        self.quarantine = Some(reason.into());
    }

    /// Fail with `Corrupted` if the container is quarantined
    pub fn ensure_usable(&self) -> Result<()> {
        match &self.quarantine {
            Some(reason) => Err(self.corrupted(reason.clone())),
            None => Ok(()),
        }
    }

    fn corrupted(&self, reason: String) -> InventoryError {
        InventoryError::Corrupted {
            container: self.id,
            reason,
        }
    }

    // ---- placement ----

    /// Footprint an item of `definition` takes in this container
    pub fn footprint_of(&self, definition: &ItemDefinition) -> Footprint {
        if self.settings.style.is_spatial() {
            Footprint::new(definition.width, definition.height).unwrap_or_else(|_| Footprint::unit())
        } else {
            Footprint::unit()
        }
    }

    /// Drop whatever the style ignores
    fn normalize(&self, placement: Placement) -> Placement {
        match self.settings.style {
            ContainerStyle::Grid => placement,
            ContainerStyle::Traditional => Placement::at(placement.x, placement.y),
            ContainerStyle::DataOnly => Placement::default(),
        }
    }

    /// Check the compatibility rules
    pub fn accepts(&self, definition: &ItemDefinition) -> Result<()> {
        let fits_slot = match &self.settings.equipment_slot {
            Some(slot) => definition
                .kind
                .equip_slot()
                .map_or(false, |item_slot| item_slot.matches(slot)),
            None => true,
        };
        if fits_slot && self.settings.compatibility.accepts(definition) {
            Ok(())
        } else {
            Err(InventoryError::Incompatible {
                container: self.id,
                definition: definition.key.clone(),
            })
        }
    }

    /// Would an item of `definition` fit at `placement`?
    pub fn can_place(
        &self,
        definition: &ItemDefinition,
        placement: Placement,
        ignore: Option<ItemId>,
    ) -> bool {
        match &self.grid {
            None => true,
            Some(grid) => {
                let placement = self.normalize(placement);
                grid.check(placement.rect(self.footprint_of(definition)), ignore)
                    .is_ok()
            }
        }
    }

    /// First free placement for `definition`
    pub fn find_free_slot(
        &self,
        definition: &ItemDefinition,
        preferred: Rotation,
        strategy: &PlacementStrategy,
        ignore: Option<ItemId>,
    ) -> Option<Placement> {
        let grid = match &self.grid {
            None => return Some(Placement::default()),
            Some(grid) => grid,
        };
        if self.settings.style.is_spatial() {
            grid.find_free_slot(
                self.footprint_of(definition),
                preferred,
                definition.rotatable,
                strategy,
                ignore,
            )
        } else {
            grid.find_free_slot(Footprint::unit(), Rotation::Zero, false, strategy, ignore)
        }
    }

    /// Turn a requested placement (or none) into a valid one
    pub fn resolve_placement(
        &self,
        definition: &ItemDefinition,
        requested: Option<Placement>,
        preferred: Rotation,
        strategy: &PlacementStrategy,
        ignore: Option<ItemId>,
    ) -> Result<Placement> {
        let no_slot = InventoryError::NoFreeSlot { container: self.id };
        match requested {
            Some(placement) => {
                if self.settings.style.is_spatial()
                    && placement.rotation != Rotation::Zero
                    && !definition.rotatable
                {
                    return Err(InventoryError::RotationNotAllowed(definition.key.clone()));
                }
                let placement = self.normalize(placement);
                if self.can_place(definition, placement, ignore) {
                    Ok(placement)
                } else {
                    Err(no_slot)
                }
            }
            None => self
                .find_free_slot(definition, preferred, strategy, ignore)
                .ok_or(no_slot),
        }
    }

    // ---- mutation ----

    /// Place an instance at its recorded placement
    pub fn insert(&mut self, mut item: ItemInstance) -> Result<()> {
        if self.contains(item.id) {
            return Err(self.corrupted(format!("item {} inserted twice", item.id)));
        }
        item.container = self.id;
        item.equipped = self.settings.equipment_slot.clone();
        item.placement = self.normalize(item.placement);
        let rect = item.placement.rect(self.footprint_of(&item.definition));
        if let Some(grid) = &mut self.grid {
            grid.occupy(item.id, rect)
                .map_err(|_| InventoryError::NoFreeSlot { container: self.id })?;
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove an instance and free its cells
    pub fn take(&mut self, item: ItemId) -> Result<ItemInstance> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == item)
            .ok_or(InventoryError::ItemNotFound(item))?;
        if let Some(grid) = &mut self.grid {
            grid.release(item);
        }
        let mut taken = self.items.remove(index);
        taken.equipped = None;
        Ok(taken)
    }

    /// Move an instance to a new placement inside this container
    pub fn relocate(&mut self, item: ItemId, placement: Placement) -> Result<()> {
        let placement = self.normalize(placement);
        let footprint = match self.get(item) {
            Some(instance) => self.footprint_of(&instance.definition),
            None => return Err(InventoryError::ItemNotFound(item)),
        };
        let rect = placement.rect(footprint);
        if let Some(grid) = &mut self.grid {
            grid.check(rect, Some(item))
                .map_err(|_| InventoryError::NoFreeSlot { container: self.id })?;
            grid.release(item);
            grid.occupy(item, rect)
                .map_err(|_| InventoryError::NoFreeSlot { container: self.id })?;
        }
        if let Some(instance) = self.get_mut(item) {
            instance.placement = placement;
        }
        Ok(())
    }

    // ---- consistency ----

    /// Grid implied by the item list
    fn derive_grid(&self) -> Result<Option<OccupancyGrid>> {
        let mut grid = match Self::empty_grid(&self.settings)? {
            Some(grid) => grid,
            None => return Ok(None),
        };
        for item in &self.items {
            let rect = item.placement.rect(self.footprint_of(&item.definition));
            match grid.occupy(item.id, rect) {
                Ok(()) => {}
                Err(Collision::OutOfBounds) => {
                    return Err(self.corrupted(format!("item {} lies outside the grid", item.id)))
                }
                Err(Collision::Locked { x, y }) => {
                    return Err(self.corrupted(format!(
                        "item {} covers locked tile ({}, {})",
                        item.id, x, y
                    )))
                }
                Err(Collision::Occupied { item: other, .. }) => {
                    return Err(self.corrupted(format!(
                        "items {} and {} overlap",
                        other, item.id
                    )))
                }
            }
        }
        Ok(Some(grid))
    }

    /// Check the grid against the item list and the stack rules
    pub fn verify(&self) -> Result<()> {
        self.ensure_usable()?;
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(self.corrupted(format!("item {} listed twice", item.id)));
            }
            if item.container != self.id {
                return Err(self.corrupted(format!(
                    "item {} claims container {}",
                    item.id, item.container
                )));
            }
            if item.count == 0 || item.count > item.max_stack() {
                return Err(self.corrupted(format!(
                    "item {} has count {} (max {})",
                    item.id,
                    item.count,
                    item.max_stack()
                )));
            }
        }
        let expected = self.derive_grid()?;
        if let (Some(expected), Some(actual)) = (&expected, &self.grid) {
            let mismatch = expected
                .iter()
                .zip(actual.iter())
                .find(|(e, a)| e.2 != a.2);
            if let Some(((x, y, _), (_, _, found))) = mismatch {
                let reason = match found {
                    Some(item) => format!("cell ({}, {}) points at {} unexpectedly", x, y, item),
                    None => format!("cell ({}, {}) is missing its occupant", x, y),
                };
                return Err(self.corrupted(reason));
            }
        }
        Ok(())
    }

    /// Rebuild the grid from the item list and lift the quarantine.
    ///
    /// Fails if the item list itself is inconsistent (overlaps, out of bounds).
    pub fn rebuild_grid(&mut self) -> Result<()> {
        let grid = self.derive_grid()?;
        self.grid = grid;
        self.quarantine = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbag_core::{IdGenerator, Tag};
    use std::sync::Arc;

    fn square() -> Arc<ItemDefinition> {
        Arc::new(ItemDefinition::new("crate", "Crate").with_size(2, 2))
    }

    fn instance(ids: &IdGenerator, def: &Arc<ItemDefinition>, placement: Placement) -> ItemInstance {
        ItemInstance::new(ids.next_item(), Arc::clone(def), 1, ContainerId::from_raw(0), placement)
    }

    #[test]
    fn test_overlap_rejected_with_no_free_slot() {
        let ids = IdGenerator::new();
        let mut c = Container::new(ids.next_container(), ContainerSettings::grid(4, 4)).unwrap();
        let def = square();

        c.insert(instance(&ids, &def, Placement::at(0, 0))).unwrap();
        let err = c.insert(instance(&ids, &def, Placement::at(1, 1))).unwrap_err();
        assert_eq!(err, InventoryError::NoFreeSlot { container: c.id() });
        c.insert(instance(&ids, &def, Placement::at(2, 0))).unwrap();

        assert_eq!(c.len(), 2);
        assert!(c.verify().is_ok());
    }

    #[test]
    fn test_traditional_treats_items_as_single_cells() {
        let ids = IdGenerator::new();
        let mut c = Container::new(ids.next_container(), ContainerSettings::traditional(2, 1)).unwrap();
        let def = square();
        c.insert(instance(&ids, &def, Placement::new(0, 0, Rotation::Ninety))).unwrap();
        c.insert(instance(&ids, &def, Placement::at(1, 0))).unwrap();
        assert_eq!(c.items()[0].placement.rotation, Rotation::Zero);
        assert_eq!(c.free_cells(), Some(0));
        assert!(c.find_free_slot(&def, Rotation::Zero, &PlacementStrategy::default(), None).is_none());
    }

    #[test]
    fn test_data_only_is_unbounded() {
        let ids = IdGenerator::new();
        let mut c = Container::new(ids.next_container(), ContainerSettings::data_only()).unwrap();
        let def = square();
        for _ in 0..50 {
            c.insert(instance(&ids, &def, Placement::at(9, 9))).unwrap();
        }
        assert_eq!(c.len(), 50);
        assert!(c.grid().is_none());
        assert_eq!(c.items()[0].placement, Placement::default());
    }

    #[test]
    fn test_locked_tile_blocks_placement() {
        let ids = IdGenerator::new();
        let settings = ContainerSettings::grid(2, 2).with_locked_tile(0, 0);
        let c = Container::new(ids.next_container(), settings).unwrap();
        let unit = ItemDefinition::new("coin", "Coin");
        assert!(!c.can_place(&unit, Placement::at(0, 0), None));
        assert_eq!(
            c.find_free_slot(&unit, Rotation::Zero, &PlacementStrategy::default(), None),
            Some(Placement::at(1, 0))
        );
    }

    #[test]
    fn test_resolve_rejects_rotation_of_fixed_item() {
        let ids = IdGenerator::new();
        let c = Container::new(ids.next_container(), ContainerSettings::grid(4, 4)).unwrap();
        let def = ItemDefinition::new("plank", "Plank").with_size(3, 1);
        let err = c
            .resolve_placement(
                &def,
                Some(Placement::new(0, 0, Rotation::Ninety)),
                Rotation::Zero,
                &PlacementStrategy::default(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, InventoryError::RotationNotAllowed(_)));
    }

    #[test]
    fn test_verify_detects_and_rebuild_repairs() {
        let ids = IdGenerator::new();
        let mut c = Container::new(ids.next_container(), ContainerSettings::grid(3, 3)).unwrap();
        let def = square();
        c.insert(instance(&ids, &def, Placement::at(0, 0))).unwrap();

        let ghost = ItemId::from_raw(999);
        c.grid_mut()
            .unwrap()
            .occupy(ghost, Footprint::unit().at(2, 2, Rotation::Zero))
            .unwrap();
        assert!(matches!(c.verify(), Err(InventoryError::Corrupted { .. })));

        c.quarantine("test");
        assert!(c.ensure_usable().is_err());

        c.rebuild_grid().unwrap();
        assert!(c.verify().is_ok());
        assert_eq!(c.grid().unwrap().item_at(2, 2), None);
    }

    #[test]
    fn test_relocate_within_own_cells() {
        let ids = IdGenerator::new();
        let mut c = Container::new(ids.next_container(), ContainerSettings::grid(3, 2)).unwrap();
        let def = square();
        let item = instance(&ids, &def, Placement::at(0, 0));
        let id = item.id;
        c.insert(item).unwrap();

        c.relocate(id, Placement::at(1, 0)).unwrap();
        assert_eq!(c.get(id).unwrap().placement, Placement::at(1, 0));
        assert_eq!(c.grid().unwrap().item_at(0, 0), None);
        assert!(c.verify().is_ok());
    }

    #[test]
    fn test_equipment_slot_takes_matching_equippables_only() {
        let ids = IdGenerator::new();
        let mut head =
            Container::new(ids.next_container(), ContainerSettings::equipment("Equipment.Slot.Head"))
                .unwrap();
        let helmet = Arc::new(ItemDefinition::new("helmet", "Helmet").equippable("Equipment.Slot.Head.Helm"));
        let boots = ItemDefinition::new("boots", "Boots").equippable("Equipment.Slot.Feet");
        let rock = ItemDefinition::new("rock", "Rock");

        assert!(head.accepts(&helmet).is_ok());
        assert!(matches!(head.accepts(&boots), Err(InventoryError::Incompatible { .. })));
        assert!(matches!(head.accepts(&rock), Err(InventoryError::Incompatible { .. })));

        let worn = instance(&ids, &helmet, Placement::at(0, 0));
        let id = worn.id;
        head.insert(worn).unwrap();
        assert_eq!(head.get(id).unwrap().equipped, Some(Tag::new("Equipment.Slot.Head")));
        assert_eq!(head.take(id).unwrap().equipped, None);
    }
}
