//! Container arena
//!
//! Single-threaded registry of containers indexed by id, with an item index and
//! the nesting table. Every operation works on staged copies of the containers
//! it touches and is committed only when it fully succeeds, so a failed
//! operation leaves the arena exactly as it was.
//!
//! The sync layer builds a partial arena over the containers a transaction has
//! locked and commits the result back into the shared store.

use crate::change::Change;
use crate::container::Container;
use crate::instance::ItemInstance;
use crate::operation::{Operation, PlacementRequest};
use crate::settings::ContainerSettings;
use crate::topology::Topology;
use gridbag_catalog::ItemCatalog;
use gridbag_core::{
    ContainerId, DefinitionKey, IdGenerator, InventoryError, ItemId, Result, Rotation, Tag,
};
use gridbag_grid::{Placement, PlacementStrategy};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Result of a committed operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Changes in the order they happened
    pub changes: Vec<Change>,
    /// Instances created by the operation (new stacks, split halves)
    pub created: Vec<ItemId>,
}

impl Outcome {
    /// Append another outcome
    pub fn extend(&mut self, other: Outcome) {
        self.changes.extend(other.changes);
        self.created.extend(other.created);
    }
}

/// Containers, items and nesting, mutated one operation at a time
#[derive(Debug, Clone)]
pub struct ContainerArena {
    catalog: Arc<ItemCatalog>,
    ids: Arc<IdGenerator>,
    strategy: PlacementStrategy,
    containers: BTreeMap<ContainerId, Container>,
    items: HashMap<ItemId, ContainerId>,
    topology: Topology,
}

impl ContainerArena {
    /// Create an empty arena with its own id generator
    pub fn new(catalog: Arc<ItemCatalog>) -> Self {
        Self::with_ids(catalog, Arc::new(IdGenerator::new()))
    }

    /// Create an empty arena drawing ids from `ids`
    pub fn with_ids(catalog: Arc<ItemCatalog>, ids: Arc<IdGenerator>) -> Self {
        Self {
            catalog,
            ids,
            strategy: PlacementStrategy::default(),
            containers: BTreeMap::new(),
            items: HashMap::new(),
            topology: Topology::new(),
        }
    }

    /// Set the free-slot strategy (builder pattern)
    pub fn with_strategy(mut self, strategy: PlacementStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Assemble an arena from complete containers.
    ///
    /// Ownership and nesting are derived from the items' `child_container`
    /// links. Dangling links, duplicate ids and cycles are rejected, and the id
    /// generator is advanced past every id seen.
    pub fn from_parts(
        catalog: Arc<ItemCatalog>,
        ids: Arc<IdGenerator>,
        strategy: PlacementStrategy,
        containers: impl IntoIterator<Item = Container>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for mut container in containers {
            let id = container.id();
            container.set_owner(None);
            if map.insert(id, container).is_some() {
                return Err(InventoryError::Corrupted {
                    container: id,
                    reason: "duplicate container id".into(),
                });
            }
        }

        let mut items = HashMap::new();
        let mut links = Vec::new();
        for container in map.values() {
            for item in container.items() {
                if items.insert(item.id, container.id()).is_some() {
                    return Err(InventoryError::Corrupted {
                        container: container.id(),
                        reason: format!("item {} appears in two containers", item.id),
                    });
                }
                if let Some(child) = item.child_container {
                    links.push((item.id, child, container.id()));
                }
            }
        }

        let mut topology = Topology::new();
        for (owner, child, holder) in links {
            let target = map
                .get_mut(&child)
                .ok_or(InventoryError::ContainerNotFound(child))?;
            if target.owner().is_some() {
                return Err(InventoryError::Corrupted {
                    container: child,
                    reason: "container carried by two items".into(),
                });
            }
            target.set_owner(Some(owner));
            topology.attach(child, holder)?;
        }

        let highest = map
            .keys()
            .map(ContainerId::raw)
            .chain(items.keys().map(ItemId::raw))
            .max()
            .unwrap_or(0);
        ids.reserve_through(highest);

        Ok(Self {
            catalog,
            ids,
            strategy,
            containers: map,
            items,
            topology,
        })
    }

    /// Working arena over a subset of containers.
    ///
    /// The caller guarantees the subset and `topology` are consistent; only
    /// items inside `containers` can be addressed.
    pub fn partial(
        catalog: Arc<ItemCatalog>,
        ids: Arc<IdGenerator>,
        strategy: PlacementStrategy,
        containers: impl IntoIterator<Item = Container>,
        topology: Topology,
    ) -> Self {
        let containers: BTreeMap<_, _> = containers.into_iter().map(|c| (c.id(), c)).collect();
        let items = containers
            .values()
            .flat_map(|c| c.items().iter().map(move |i| (i.id, c.id())))
            .collect();
        Self {
            catalog,
            ids,
            strategy,
            containers,
            items,
            topology,
        }
    }

    /// Split into containers and nesting
    pub fn into_parts(self) -> (BTreeMap<ContainerId, Container>, Topology) {
        (self.containers, self.topology)
    }

    // ---- access ----

    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    pub fn strategy(&self) -> &PlacementStrategy {
        &self.strategy
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn container(&self, id: ContainerId) -> Result<&Container> {
        self.containers
            .get(&id)
            .ok_or(InventoryError::ContainerNotFound(id))
    }

    /// Raw container access for tooling and tests. Bypasses staging.
    pub fn container_mut(&mut self, id: ContainerId) -> Result<&mut Container> {
        self.containers
            .get_mut(&id)
            .ok_or(InventoryError::ContainerNotFound(id))
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Container ids in ascending order
    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.containers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Container holding `item`
    pub fn locate(&self, item: ItemId) -> Option<ContainerId> {
        self.items.get(&item).copied()
    }

    pub fn item(&self, item: ItemId) -> Result<&ItemInstance> {
        self.locate(item)
            .and_then(|c| self.containers.get(&c))
            .and_then(|c| c.get(item))
            .ok_or(InventoryError::ItemNotFound(item))
    }

    // ---- container lifecycle ----

    /// Create an empty root container
    pub fn create_container(&mut self, settings: ContainerSettings) -> Result<ContainerId> {
        let id = self.ids.next_container();
        let container = Container::new(id, settings)?;
        self.containers.insert(id, container);
        log::debug!("Created container {}", id);
        Ok(id)
    }

    /// Dispose of an empty root container
    pub fn dispose_container(&mut self, id: ContainerId) -> Result<Change> {
        let container = self.container(id)?;
        if container.owner().is_some() || !self.topology.is_root(id) {
            return Err(InventoryError::NotRootContainer(id));
        }
        if !container.is_empty() {
            return Err(InventoryError::ContainerNotEmpty(id));
        }
        self.containers.remove(&id);
        log::debug!("Disposed container {}", id);
        Ok(Change::ContainerDisposed { container: id })
    }

    // ---- operations ----

    /// Apply one operation atomically
    pub fn apply(&mut self, op: &Operation) -> Result<Outcome> {
        let mut staging = Staging::new(self);
        staging.apply(op)?;
        let staged = staging.finish();
        Ok(self.commit(staged))
    }

    /// Apply a batch all-or-nothing
    pub fn apply_all(&mut self, ops: &[Operation]) -> Result<Outcome> {
        let mut working = self.clone();
        let mut outcome = Outcome::default();
        for op in ops {
            outcome.extend(working.apply(op)?);
        }
        *self = working;
        Ok(outcome)
    }

    pub fn add_item(
        &mut self,
        container: ContainerId,
        definition: impl Into<DefinitionKey>,
        count: u32,
        placement: PlacementRequest,
    ) -> Result<Outcome> {
        self.apply(&Operation::Add {
            container,
            definition: definition.into(),
            count,
            placement,
        })
    }

    pub fn remove_item(&mut self, item: ItemId) -> Result<Outcome> {
        self.apply(&Operation::remove(item))
    }

    pub fn consume(&mut self, item: ItemId, amount: u32) -> Result<Outcome> {
        self.apply(&Operation::consume(item, amount))
    }

    pub fn move_item(
        &mut self,
        item: ItemId,
        from: ContainerId,
        to: ContainerId,
        placement: Option<Placement>,
    ) -> Result<Outcome> {
        self.apply(&Operation::move_to(item, from, to, placement))
    }

    pub fn rotate_item(&mut self, item: ItemId, rotation: Rotation) -> Result<Outcome> {
        self.apply(&Operation::rotate(item, rotation))
    }

    /// Split `amount` off a stack; the new stack id is in `Outcome::created`
    pub fn split_stack(
        &mut self,
        item: ItemId,
        amount: u32,
        placement: Option<Placement>,
    ) -> Result<Outcome> {
        self.apply(&Operation::split(item, amount, placement))
    }

    pub fn merge_stacks(&mut self, source: ItemId, target: ItemId) -> Result<Outcome> {
        self.apply(&Operation::merge(source, target))
    }

    // ---- diagnostics ----

    /// Verify one container, quarantining it on failure
    pub fn verify(&mut self, id: ContainerId) -> Result<()> {
        let container = self.container_mut(id)?;
        if let Err(err) = container.verify() {
            if !container.is_quarantined() {
                log::error!("Quarantining container {}: {}", id, err);
                container.quarantine(err.to_string());
            }
            return Err(err);
        }
        Ok(())
    }

    /// Verify every container; returns the failures
    pub fn verify_all(&mut self) -> Vec<InventoryError> {
        self.container_ids()
            .into_iter()
            .filter_map(|id| self.verify(id).err())
            .collect()
    }

    /// Rebuild a container's grid from its item list and lift its quarantine
    pub fn recover(&mut self, id: ContainerId) -> Result<()> {
        self.container_mut(id)?.rebuild_grid()?;
        log::info!("Recovered container {}", id);
        Ok(())
    }

    fn commit(&mut self, staged: Staged) -> Outcome {
        for (id, container) in staged.touched {
            self.containers.insert(id, container);
        }
        for container in staged.spawned {
            self.containers.insert(container.id(), container);
        }
        if let Some(topology) = staged.topology {
            self.topology = topology;
        }
        for change in &staged.changes {
            change.apply_to_index(&mut self.items);
        }
        Outcome {
            changes: staged.changes,
            created: staged.created,
        }
    }
}

/// Owned result of a successful staging pass
struct Staged {
    touched: BTreeMap<ContainerId, Container>,
    spawned: Vec<Container>,
    topology: Option<Topology>,
    changes: Vec<Change>,
    created: Vec<ItemId>,
}

/// Copy-on-write view of the arena for one operation
struct Staging<'a> {
    arena: &'a ContainerArena,
    touched: BTreeMap<ContainerId, Container>,
    spawned: Vec<Container>,
    topology: Option<Topology>,
    changes: Vec<Change>,
    created: Vec<ItemId>,
}

impl<'a> Staging<'a> {
    fn new(arena: &'a ContainerArena) -> Self {
        Self {
            arena,
            touched: BTreeMap::new(),
            spawned: Vec::new(),
            topology: None,
            changes: Vec::new(),
            created: Vec::new(),
        }
    }

    fn finish(mut self) -> Staged {
        let changes = std::mem::take(&mut self.changes);
        let changes = self.with_equipment_changes(changes);
        Staged {
            touched: self.touched,
            spawned: self.spawned,
            topology: self.topology,
            changes,
            created: self.created,
        }
    }

    /// Equipment slot of a staged or committed container
    fn equipment_slot(&self, id: ContainerId) -> Option<Tag> {
        self.touched
            .get(&id)
            .or_else(|| self.arena.containers.get(&id))
            .and_then(|c| c.settings().equipment_slot.clone())
    }

    /// Interleave equip changes: unequip before an item leaves an equipment
    /// container, equip after it lands in one.
    fn with_equipment_changes(&self, changes: Vec<Change>) -> Vec<Change> {
        let mut annotated = Vec::with_capacity(changes.len());
        for change in changes {
            let (left, entered) = match &change {
                Change::ItemAdded { container, item } => (None, Some((*container, item.id))),
                Change::ItemRemoved { container, item, .. } => (Some((*container, *item)), None),
                Change::ItemMoved { from, to, item } => {
                    (Some((*from, item.id)), Some((*to, item.id)))
                }
                _ => (None, None),
            };
            if let Some((container, item)) = left {
                if let Some(slot) = self.equipment_slot(container) {
                    annotated.push(Change::ItemUnequipped {
                        container,
                        item,
                        slot,
                    });
                }
            }
            annotated.push(change);
            if let Some((container, item)) = entered {
                if let Some(slot) = self.equipment_slot(container) {
                    annotated.push(Change::ItemEquipped {
                        container,
                        item,
                        slot,
                    });
                }
            }
        }
        annotated
    }

    /// Staged copy of a container, refusing quarantined ones
    fn container(&mut self, id: ContainerId) -> Result<&mut Container> {
        if !self.touched.contains_key(&id) {
            let original = self.arena.container(id)?;
            original.ensure_usable()?;
            self.touched.insert(id, original.clone());
        }
        self.touched
            .get_mut(&id)
            .ok_or(InventoryError::ContainerNotFound(id))
    }

    fn topology(&self) -> &Topology {
        self.topology.as_ref().unwrap_or(&self.arena.topology)
    }

    fn topology_mut(&mut self) -> &mut Topology {
        let arena = self.arena;
        self.topology.get_or_insert_with(|| arena.topology.clone())
    }

    fn locate(&self, item: ItemId) -> Result<ContainerId> {
        self.arena
            .locate(item)
            .ok_or(InventoryError::ItemNotFound(item))
    }

    /// Current (staged) copy of an item
    fn instance(&mut self, item: ItemId) -> Result<(ContainerId, ItemInstance)> {
        let container = self.locate(item)?;
        let instance = self
            .container(container)?
            .get(item)
            .cloned()
            .ok_or(InventoryError::ItemNotFound(item))?;
        Ok((container, instance))
    }

    fn apply(&mut self, op: &Operation) -> Result<()> {
        match op {
            Operation::Add {
                container,
                definition,
                count,
                placement,
            } => self.add(*container, definition, *count, *placement),
            Operation::Remove { item } => self.remove(*item),
            Operation::Consume { item, amount } => self.consume(*item, *amount),
            Operation::Move {
                item,
                from,
                to,
                placement,
            } => self.move_item(*item, *from, *to, *placement),
            Operation::Rotate { item, rotation } => self.rotate(*item, *rotation),
            Operation::Split {
                item,
                amount,
                placement,
            } => self.split(*item, *amount, *placement),
            Operation::Merge { source, target } => self.merge(*source, *target),
        }
    }

    fn add(
        &mut self,
        container: ContainerId,
        key: &DefinitionKey,
        count: u32,
        request: PlacementRequest,
    ) -> Result<()> {
        let definition = Arc::clone(self.arena.catalog.get(key)?);
        if count == 0 {
            return Err(InventoryError::InvalidAmount {
                requested: 0,
                available: definition.max_stack,
            });
        }
        let ids = Arc::clone(&self.arena.ids);
        let strategy = self.arena.strategy;
        let target = self.container(container)?;
        target.accepts(&definition)?;

        let mut first_placement = None;
        let mut order = Vec::new();
        match request {
            PlacementRequest::Auto => {}
            PlacementRequest::At(placement) => first_placement = Some(placement),
            PlacementRequest::Onto(stack) => {
                let existing = target.get(stack).ok_or(InventoryError::ItemNotFound(stack))?;
                if !existing.accepts_fresh(&definition) {
                    return Err(InventoryError::StacksIncompatible {
                        source_item: stack,
                        target_item: stack,
                    });
                }
                order.push(stack);
            }
        }
        let others: Vec<ItemId> = target
            .items()
            .iter()
            .filter(|i| i.accepts_fresh(&definition) && !order.contains(&i.id))
            .map(|i| i.id)
            .collect();
        order.extend(others);

        let mut remaining = count;
        let mut changes = Vec::new();
        for id in order {
            if remaining == 0 {
                break;
            }
            if let Some(stack) = target.get_mut(id) {
                let moved = remaining.min(stack.space_left());
                if moved > 0 {
                    stack.count += moved;
                    remaining -= moved;
                    changes.push(Change::ItemUpdated {
                        container,
                        item: stack.clone(),
                    });
                }
            }
        }

        let mut spawned = Vec::new();
        let mut created = Vec::new();
        while remaining > 0 {
            let amount = remaining.min(definition.max_stack);
            let placement = target.resolve_placement(
                &definition,
                first_placement.take(),
                Rotation::Zero,
                &strategy,
                None,
            )?;
            let mut instance =
                ItemInstance::new(ids.next_item(), Arc::clone(&definition), amount, container, placement);
            if let Some(template) = definition.kind.container_template() {
                let mut child =
                    Container::new(ids.next_container(), ContainerSettings::from_template(template))?;
                child.set_owner(Some(instance.id));
                instance.child_container = Some(child.id());
                changes.push(Change::ContainerCreated {
                    container: child.id(),
                    owner: Some(instance.id),
                    holder: Some(container),
                });
                spawned.push(child);
            }
            let id = instance.id;
            target.insert(instance)?;
            if let Some(placed) = target.get(id) {
                changes.push(Change::ItemAdded {
                    container,
                    item: placed.clone(),
                });
            }
            created.push(id);
            remaining -= amount;
        }

        for child in &spawned {
            self.topology_mut().attach(child.id(), container)?;
        }
        self.spawned.extend(spawned);
        self.created.extend(created);
        self.changes.extend(changes);
        Ok(())
    }

    fn remove(&mut self, item: ItemId) -> Result<()> {
        let container = self.locate(item)?;
        let instance = self.container(container)?.take(item)?;
        self.changes.push(Change::ItemRemoved {
            container,
            item,
            definition: instance.key().clone(),
        });
        self.detach_child(&instance)
    }

    /// A destroyed bag leaves its container behind as a root
    fn detach_child(&mut self, instance: &ItemInstance) -> Result<()> {
        if let Some(child) = instance.child_container {
            self.container(child)?.set_owner(None);
            self.topology_mut().detach(child);
            self.changes.push(Change::ContainerDetached {
                container: child,
                former_owner: instance.id,
            });
        }
        Ok(())
    }

    fn consume(&mut self, item: ItemId, amount: u32) -> Result<()> {
        let (container, instance) = self.instance(item)?;
        if amount == 0 || amount > instance.count {
            return Err(InventoryError::InvalidAmount {
                requested: amount,
                available: instance.count,
            });
        }
        if amount == instance.count {
            return self.remove(item);
        }
        if let Some(stack) = self.container(container)?.get_mut(item) {
            stack.count -= amount;
            let updated = stack.clone();
            self.changes.push(Change::ItemUpdated {
                container,
                item: updated,
            });
        }
        Ok(())
    }

    fn move_item(
        &mut self,
        item: ItemId,
        from: ContainerId,
        to: ContainerId,
        placement: Option<Placement>,
    ) -> Result<()> {
        let (located, instance) = self.instance(item)?;
        if located != from {
            return Err(InventoryError::ItemNotFound(item));
        }
        let strategy = self.arena.strategy;
        let definition = Arc::clone(&instance.definition);
        let preferred = instance.placement.rotation;

        if from == to {
            let target = self.container(to)?;
            let placement =
                target.resolve_placement(&definition, placement, preferred, &strategy, Some(item))?;
            target.relocate(item, placement)?;
            if let Some(moved) = target.get(item) {
                let moved = moved.clone();
                self.changes.push(Change::ItemUpdated {
                    container: to,
                    item: moved,
                });
            }
            return Ok(());
        }

        self.container(to)?.accepts(&definition)?;
        if let Some(child) = instance.child_container {
            self.topology().check_nesting(child, to)?;
        }
        let placement =
            self.container(to)?
                .resolve_placement(&definition, placement, preferred, &strategy, None)?;
        let mut moving = self.container(from)?.take(item)?;
        moving.placement = placement;
        let target = self.container(to)?;
        target.insert(moving)?;
        let moved = target
            .get(item)
            .cloned()
            .ok_or(InventoryError::ItemNotFound(item))?;
        if let Some(child) = instance.child_container {
            self.topology_mut().attach(child, to)?;
        }
        self.changes.push(Change::ItemMoved {
            from,
            to,
            item: moved,
        });
        Ok(())
    }

    fn rotate(&mut self, item: ItemId, rotation: Rotation) -> Result<()> {
        let (container, instance) = self.instance(item)?;
        if !instance.definition.rotatable {
            return Err(InventoryError::RotationNotAllowed(instance.key().clone()));
        }
        let target = self.container(container)?;
        if !target.style().is_spatial() || instance.placement.rotation == rotation {
            return Ok(());
        }
        let placement = Placement::new(instance.placement.x, instance.placement.y, rotation);
        if !target.can_place(&instance.definition, placement, Some(item)) {
            return Err(InventoryError::NoFreeSlot { container });
        }
        target.relocate(item, placement)?;
        if let Some(rotated) = target.get(item) {
            let rotated = rotated.clone();
            self.changes.push(Change::ItemUpdated {
                container,
                item: rotated,
            });
        }
        Ok(())
    }

    fn split(&mut self, item: ItemId, amount: u32, placement: Option<Placement>) -> Result<()> {
        let (container, instance) = self.instance(item)?;
        if amount == 0 || amount >= instance.count {
            return Err(InventoryError::InvalidAmount {
                requested: amount,
                available: instance.count,
            });
        }
        let strategy = self.arena.strategy;
        let new_id = self.arena.ids.next_item();
        let target = self.container(container)?;
        let placement = target.resolve_placement(
            &instance.definition,
            placement,
            instance.placement.rotation,
            &strategy,
            None,
        )?;

        let mut half = instance.clone();
        half.id = new_id;
        half.count = amount;
        half.placement = placement;
        half.child_container = None;
        target.insert(half)?;

        let mut changes = Vec::with_capacity(2);
        if let Some(original) = target.get_mut(item) {
            original.count -= amount;
            changes.push(Change::ItemUpdated {
                container,
                item: original.clone(),
            });
        }
        if let Some(added) = target.get(new_id) {
            changes.push(Change::ItemAdded {
                container,
                item: added.clone(),
            });
        }
        self.changes.extend(changes);
        self.created.push(new_id);
        Ok(())
    }

    fn merge(&mut self, source: ItemId, target: ItemId) -> Result<()> {
        let incompatible = InventoryError::StacksIncompatible {
            source_item: source,
            target_item: target,
        };
        if source == target {
            return Err(incompatible);
        }
        let (source_container, from) = self.instance(source)?;
        let (target_container, into) = self.instance(target)?;
        if !from.can_stack_with(&into) {
            return Err(incompatible);
        }
        let max = into.max_stack();
        if into.count >= max {
            return Err(InventoryError::StackLimitExceeded { item: target, max });
        }

        let sum = from.count as u64 + into.count as u64;
        if sum <= max as u64 {
            self.set_count(target_container, target, sum as u32)?;
            self.container(source_container)?.take(source)?;
            self.changes.push(Change::ItemRemoved {
                container: source_container,
                item: source,
                definition: from.key().clone(),
            });
        } else {
            self.set_count(target_container, target, max)?;
            self.set_count(source_container, source, (sum - max as u64) as u32)?;
        }
        Ok(())
    }

    fn set_count(&mut self, container: ContainerId, item: ItemId, count: u32) -> Result<()> {
        let stack = self
            .container(container)?
            .get_mut(item)
            .ok_or(InventoryError::ItemNotFound(item))?;
        stack.count = count;
        let updated = stack.clone();
        self.changes.push(Change::ItemUpdated {
            container,
            item: updated,
        });
        Ok(())
    }
}
