//! Stable export representation
//!
//! Records carry only what is needed to rebuild state: container settings and,
//! per item, its id, definition key, position, rotation, count, tag values and
//! owned container. Grids, owners and nesting are derived again on import,
//! after every placement has been re-validated.

use crate::error::{PersistError, Result};
use gridbag_catalog::ItemCatalog;
use gridbag_container::{Container, ContainerArena, ContainerSettings, ItemInstance};
use gridbag_core::{ContainerId, DefinitionKey, IdGenerator, InventoryError, ItemId, Rotation, TagValues};
use gridbag_grid::{Placement, PlacementStrategy};
use gridbag_sync::{InventoryStore, StoreConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Current export format version
pub const EXPORT_VERSION: u32 = 1;

/// One item stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub definition: DefinitionKey,
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub rotation: Rotation,
    pub count: u32,
    #[serde(default)]
    pub tag_values: TagValues,
    #[serde(default)]
    pub child_container: Option<ContainerId>,
}

impl ItemRecord {
    pub fn from_instance(item: &ItemInstance) -> Self {
        Self {
            id: item.id,
            definition: item.key().clone(),
            x: item.placement.x,
            y: item.placement.y,
            rotation: item.placement.rotation,
            count: item.count,
            tag_values: item.tag_values.clone(),
            child_container: item.child_container,
        }
    }

    fn into_instance(self, container: &Container, catalog: &ItemCatalog) -> core::result::Result<ItemInstance, InventoryError> {
        let definition = Arc::clone(catalog.get(&self.definition)?);
        if self.count == 0 || self.count > definition.max_stack {
            return Err(InventoryError::InvalidAmount {
                requested: self.count,
                available: definition.max_stack,
            });
        }
        if self.rotation != Rotation::Zero && container.style().is_spatial() && !definition.rotatable {
            return Err(InventoryError::RotationNotAllowed(self.definition));
        }
        if definition.is_container() != self.child_container.is_some() {
            return Err(InventoryError::Corrupted {
                container: container.id(),
                reason: format!("item {} has a mismatched owned container", self.id),
            });
        }

        let placement = Placement::new(self.x, self.y, self.rotation);
        let mut instance = ItemInstance::new(self.id, definition, self.count, container.id(), placement);
        instance.tag_values = self.tag_values;
        instance.child_container = self.child_container;
        Ok(instance)
    }
}

/// One container and its items, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub settings: ContainerSettings,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl ContainerRecord {
    pub fn from_container(container: &Container) -> Self {
        Self {
            id: container.id(),
            settings: container.settings().clone(),
            items: container.items().iter().map(ItemRecord::from_instance).collect(),
        }
    }

    /// Rebuild the container, placing every item through the occupancy grid
    fn into_container(self, catalog: &ItemCatalog) -> core::result::Result<Container, InventoryError> {
        let mut container = Container::new(self.id, self.settings)?;
        for record in self.items {
            let instance = record.into_instance(&container, catalog)?;
            container.insert(instance)?;
        }
        Ok(container)
    }
}

/// A complete inventory export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryExport {
    pub version: u32,
    pub containers: Vec<ContainerRecord>,
}

impl InventoryExport {
    /// Export every container of an arena, ascending by id
    pub fn from_arena(arena: &ContainerArena) -> Self {
        Self {
            version: EXPORT_VERSION,
            containers: arena.containers().map(ContainerRecord::from_container).collect(),
        }
    }

    /// Export a consistent snapshot of a store
    pub fn from_store(store: &InventoryStore) -> Self {
        Self::from_arena(&store.snapshot_arena())
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn item_count(&self) -> usize {
        self.containers.iter().map(|c| c.items.len()).sum()
    }

    /// Refuse exports written by a newer format
    pub fn check_version(&self) -> Result<()> {
        if self.version > EXPORT_VERSION {
            return Err(PersistError::VersionMismatch {
                found: self.version,
                supported: EXPORT_VERSION,
            });
        }
        Ok(())
    }

    /// Rebuild an arena with a fresh id generator.
    ///
    /// Rejects overlapping placements, unknown definitions, out-of-range
    /// counts and dangling or duplicated container ownership.
    pub fn into_arena(self, catalog: Arc<ItemCatalog>, strategy: PlacementStrategy) -> Result<ContainerArena> {
        self.check_version()?;
        let containers = self
            .containers
            .into_iter()
            .map(|record| {
                let id = record.id;
                record.into_container(&catalog).map_err(|err| {
                    log::warn!("Import rejected container {}: {}", id, err);
                    err
                })
            })
            .collect::<core::result::Result<Vec<_>, _>>()?;
        let arena = ContainerArena::from_parts(catalog, Arc::new(IdGenerator::new()), strategy, containers)?;
        log::debug!("Imported {} container(s)", arena.len());
        Ok(arena)
    }

    /// Rebuild a store
    pub fn into_store(self, catalog: Arc<ItemCatalog>, config: StoreConfig) -> Result<InventoryStore> {
        let arena = self.into_arena(catalog, config.placement)?;
        Ok(InventoryStore::from_arena(arena, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbag_catalog::{ContainerTemplate, ItemDefinition};
    use gridbag_container::PlacementRequest;

    fn catalog() -> Arc<ItemCatalog> {
        let mut catalog = ItemCatalog::new();
        for definition in [
            ItemDefinition::new("rifle", "Rifle")
                .with_size(3, 1)
                .with_rotation(true)
                .with_value("Item.Durability", 100.0),
            ItemDefinition::new("ammo", "Ammo").with_max_stack(30),
            ItemDefinition::new("bag", "Bag").with_container(ContainerTemplate::grid(2, 2)),
        ] {
            catalog.register(definition).unwrap();
        }
        Arc::new(catalog)
    }

    fn sample() -> ContainerArena {
        let mut arena = ContainerArena::new(catalog());
        let c = arena.create_container(ContainerSettings::grid(4, 4)).unwrap();
        arena
            .add_item(c, "rifle", 1, PlacementRequest::At(Placement::new(0, 0, Rotation::Ninety)))
            .unwrap();
        let bag = arena.add_item(c, "bag", 1, PlacementRequest::Auto).unwrap().created[0];
        let inner = arena.item(bag).unwrap().child_container.unwrap();
        arena.add_item(inner, "ammo", 12, PlacementRequest::Auto).unwrap();
        arena
    }

    #[test]
    fn test_import_reproduces_grids() {
        let arena = sample();
        let export = InventoryExport::from_arena(&arena);
        assert_eq!(export.container_count(), 2);
        assert_eq!(export.item_count(), 3);

        let imported = export.clone().into_arena(catalog(), PlacementStrategy::default()).unwrap();
        for original in arena.containers() {
            let copy = imported.container(original.id()).unwrap();
            assert_eq!(copy.items(), original.items());
            assert_eq!(copy.grid(), original.grid());
            assert_eq!(copy.owner(), original.owner());
        }
        assert_eq!(imported.topology(), arena.topology());
        assert_eq!(InventoryExport::from_arena(&imported), export);
    }

    #[test]
    fn test_overlap_is_rejected() {
        let mut export = InventoryExport::from_arena(&sample());
        let outer = &mut export.containers[0];
        let mut clash = outer.items[0].clone();
        clash.id = ItemId::from_raw(900);
        outer.items.push(clash);

        let err = export.into_arena(catalog(), PlacementStrategy::default()).unwrap_err();
        assert!(matches!(err, PersistError::Invalid(InventoryError::NoFreeSlot { .. })));
    }

    #[test]
    fn test_unknown_definition_and_dangling_bag() {
        let mut export = InventoryExport::from_arena(&sample());
        export.containers[1].items[0].definition = DefinitionKey::new("mystery");
        let err = export.into_arena(catalog(), PlacementStrategy::default()).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Invalid(InventoryError::DefinitionNotFound(_))
        ));

        let mut export = InventoryExport::from_arena(&sample());
        export.containers.truncate(1);
        let err = export.into_arena(catalog(), PlacementStrategy::default()).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Invalid(InventoryError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn test_newer_version_is_refused() {
        let mut export = InventoryExport::from_arena(&sample());
        export.version = EXPORT_VERSION + 1;
        let err = export.into_arena(catalog(), PlacementStrategy::default()).unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch { found, supported } if found == EXPORT_VERSION + 1 && supported == EXPORT_VERSION
        ));
    }

    #[test]
    fn test_import_advances_ids() {
        let export = InventoryExport::from_arena(&sample());
        let mut arena = export.into_arena(catalog(), PlacementStrategy::default()).unwrap();
        let fresh = arena.create_container(ContainerSettings::data_only()).unwrap();
        // Highest imported id is the ammo stack, 5
        assert_eq!(fresh.raw(), 6);
    }
}
