//! The shared inventory store
//!
//! Every container sits behind its own FIFO gate. A transaction works out
//! which containers it needs (named containers, the holders of referenced
//! items and the containers carried by referenced bags), takes their gates in
//! ascending id order, and validates against working copies. Only a fully
//! valid transaction is written back. Transactions on disjoint containers run
//! in parallel; transactions sharing a container run in arrival order.
//!
//! Nesting changes additionally hold the store-wide topology lock, always
//! taken after the gates.
//!
//! Write-back happens under the exclusive side of the commit lock. Readers
//! that span containers (queries, item lookups) hold its shared side, so they
//! never see one container updated and another not yet.

use crate::config::StoreConfig;
use crate::error::{TransactionError, TransactionOutcome, WithdrawReason};
use crate::gate::FifoGate;
use crate::notify::ChangeNotification;
use crate::transaction::{Transaction, TransactionId, TransactionResult, TransactionState};
use gridbag_catalog::ItemCatalog;
use gridbag_container::{
    Change, Container, ContainerArena, ContainerSettings, ItemInstance, Operation, Outcome,
    Topology,
};
use gridbag_core::{ContainerId, DefinitionKey, IdGenerator, InventoryError, ItemId, Rotation};
use gridbag_event::{EventChannel, ObserverList, Priority, SubscriberId};
use gridbag_grid::Placement;
use gridbag_query::{ItemFilter, ItemQuery, ItemSource, QueryResults};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// What the holder of a container's gate is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerPhase {
    #[default]
    Idle,
    Validating,
    Committing,
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub committed: u64,
    pub rejected: u64,
    pub withdrawn: u64,
    pub containers_created: u64,
    pub containers_disposed: u64,
}

#[derive(Debug)]
struct ContainerSlot {
    gate: FifoGate,
    state: Mutex<Container>,
    phase: Mutex<ContainerPhase>,
}

impl ContainerSlot {
    fn new(container: Container) -> Self {
        Self {
            gate: FifoGate::new(),
            state: Mutex::new(container),
            phase: Mutex::new(ContainerPhase::Idle),
        }
    }
}

/// Containers a transaction must hold, and whether it changes nesting
#[derive(Debug, PartialEq, Eq)]
struct LockPlan {
    containers: BTreeSet<ContainerId>,
    topology: bool,
}

enum PlanError {
    Rejected(InventoryError),
    Missing(ItemId),
}

enum Blocked {
    /// A planned container disappeared before its gate was taken
    Gone,
    /// Non-blocking submission found a busy gate
    Locked(ContainerId),
}

#[derive(Clone, Copy)]
enum Acquire {
    Blocking,
    Try,
}

/// Held gates, released in reverse order on drop
struct Lease {
    slots: Vec<(ContainerId, Arc<ContainerSlot>)>,
}

impl Lease {
    fn slot(&self, id: ContainerId) -> Option<&Arc<ContainerSlot>> {
        self.slots
            .iter()
            .find(|(held, _)| *held == id)
            .map(|(_, slot)| slot)
    }

    fn set_phase(&self, phase: ContainerPhase) {
        for (_, slot) in &self.slots {
            *slot.phase.lock() = phase;
        }
    }

    /// Are the held slots still the registered ones?
    fn is_current(&self, slots: &BTreeMap<ContainerId, Arc<ContainerSlot>>) -> bool {
        self.slots.iter().all(|(id, held)| {
            slots
                .get(id)
                .map(|registered| Arc::ptr_eq(registered, held))
                .unwrap_or(false)
        })
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        for (_, slot) in self.slots.iter().rev() {
            *slot.phase.lock() = ContainerPhase::Idle;
            slot.gate.release();
        }
    }
}

/// Thread-safe inventory shared by any number of callers
pub struct InventoryStore {
    catalog: Arc<ItemCatalog>,
    ids: Arc<IdGenerator>,
    config: StoreConfig,
    slots: RwLock<BTreeMap<ContainerId, Arc<ContainerSlot>>>,
    items: RwLock<HashMap<ItemId, ContainerId>>,
    topology: RwLock<Topology>,
    /// Exclusive while a transaction writes back; shared for multi-container reads
    commit: RwLock<()>,
    observers: ObserverList<ChangeNotification>,
    stats: RwLock<StoreStats>,
}

impl InventoryStore {
    /// Create an empty store with default configuration
    pub fn new(catalog: Arc<ItemCatalog>) -> Self {
        Self::with_config(catalog, StoreConfig::default())
    }

    pub fn with_config(catalog: Arc<ItemCatalog>, config: StoreConfig) -> Self {
        Self::with_ids(catalog, Arc::new(IdGenerator::new()), config)
    }

    /// Create an empty store drawing ids from `ids`
    pub fn with_ids(catalog: Arc<ItemCatalog>, ids: Arc<IdGenerator>, config: StoreConfig) -> Self {
        Self {
            catalog,
            ids,
            config,
            slots: RwLock::new(BTreeMap::new()),
            items: RwLock::new(HashMap::new()),
            topology: RwLock::new(Topology::new()),
            commit: RwLock::new(()),
            observers: ObserverList::new(),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    /// Take over an arena. Every container is verified; failures are
    /// quarantined and logged.
    pub fn from_arena(mut arena: ContainerArena, config: StoreConfig) -> Self {
        let failures = arena.verify_all();
        if !failures.is_empty() {
            log::warn!("{} container(s) quarantined while loading the store", failures.len());
        }
        let catalog = Arc::clone(arena.catalog());
        let ids = Arc::clone(arena.ids());
        let (containers, topology) = arena.into_parts();

        let items = containers
            .values()
            .flat_map(|c| c.items().iter().map(move |i| (i.id, c.id())))
            .collect();
        let slots = containers
            .into_iter()
            .map(|(id, container)| (id, Arc::new(ContainerSlot::new(container))))
            .collect();

        Self {
            catalog,
            ids,
            config,
            slots: RwLock::new(slots),
            items: RwLock::new(items),
            topology: RwLock::new(topology),
            commit: RwLock::new(()),
            observers: ObserverList::new(),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }

    // ---- transactions ----

    /// Run a transaction, waiting in line for every container it touches
    pub fn execute(&self, tx: Transaction) -> TransactionOutcome<TransactionResult> {
        self.run(tx, Acquire::Blocking)
    }

    /// Run a transaction only if none of its containers is busy or queued;
    /// otherwise reject it with [`InventoryError::ContainerLocked`]
    pub fn try_execute(&self, tx: Transaction) -> TransactionOutcome<TransactionResult> {
        self.run(tx, Acquire::Try)
    }

    pub fn add_item(
        &self,
        container: ContainerId,
        definition: impl Into<DefinitionKey>,
        count: u32,
    ) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::add(container, definition, count)))
    }

    pub fn add_item_at(
        &self,
        container: ContainerId,
        definition: impl Into<DefinitionKey>,
        count: u32,
        placement: Placement,
    ) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::add_at(
            container, definition, count, placement,
        )))
    }

    pub fn remove_item(&self, item: ItemId) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::remove(item)))
    }

    pub fn consume(&self, item: ItemId, amount: u32) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::consume(item, amount)))
    }

    pub fn move_item(
        &self,
        item: ItemId,
        from: ContainerId,
        to: ContainerId,
        placement: Option<Placement>,
    ) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::move_to(item, from, to, placement)))
    }

    pub fn rotate_item(&self, item: ItemId, rotation: Rotation) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::rotate(item, rotation)))
    }

    pub fn split_stack(
        &self,
        item: ItemId,
        amount: u32,
        placement: Option<Placement>,
    ) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::split(item, amount, placement)))
    }

    pub fn merge_stacks(&self, source: ItemId, target: ItemId) -> TransactionOutcome<TransactionResult> {
        self.execute(Transaction::single(Operation::merge(source, target)))
    }

    // ---- containers ----

    /// Register a new root container
    pub fn create_container(&self, settings: ContainerSettings) -> Result<ContainerId, InventoryError> {
        let id = self.ids.next_container();
        let container = Container::new(id, settings)?;
        self.slots
            .write()
            .insert(id, Arc::new(ContainerSlot::new(container)));
        self.stats.write().containers_created += 1;
        log::debug!("Created container {}", id);

        self.publish(&ChangeNotification::new(
            TransactionId::new(),
            vec![Change::ContainerCreated {
                container: id,
                owner: None,
                holder: None,
            }],
        ));
        Ok(id)
    }

    /// Dispose an empty root container
    pub fn dispose_container(&self, id: ContainerId) -> Result<(), InventoryError> {
        let lease = self.lease(id)?;
        {
            let container = self.state_of(&lease, id)?;
            if container.owner().is_some() {
                return Err(InventoryError::NotRootContainer(id));
            }
            if !container.is_empty() {
                return Err(InventoryError::ContainerNotEmpty(id));
            }
        }
        self.slots.write().remove(&id);
        self.stats.write().containers_disposed += 1;
        log::debug!("Disposed container {}", id);

        self.publish(&ChangeNotification::new(
            TransactionId::new(),
            vec![Change::ContainerDisposed { container: id }],
        ));
        drop(lease);
        Ok(())
    }

    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.slots.read().keys().copied().collect()
    }

    pub fn contains_container(&self, id: ContainerId) -> bool {
        self.slots.read().contains_key(&id)
    }

    pub fn container_count(&self) -> usize {
        self.slots.read().len()
    }

    /// Copy of a container's last committed state
    pub fn snapshot(&self, id: ContainerId) -> Result<Container, InventoryError> {
        Ok(self.slot(id)?.state.lock().clone())
    }

    /// Copy of an item's last committed state
    pub fn item(&self, item: ItemId) -> Result<ItemInstance, InventoryError> {
        let _commit = self.commit.read_recursive();
        let container = self.locate(item).ok_or(InventoryError::ItemNotFound(item))?;
        let slot = self.slot(container)?;
        let state = slot.state.lock();
        state.get(item).cloned().ok_or(InventoryError::ItemNotFound(item))
    }

    /// Container currently holding `item`
    pub fn locate(&self, item: ItemId) -> Option<ContainerId> {
        let _commit = self.commit.read_recursive();
        self.items.read().get(&item).copied()
    }

    /// Container holding the bag that carries `container`
    pub fn holder_of(&self, container: ContainerId) -> Option<ContainerId> {
        self.topology.read().holder(container)
    }

    /// Copy of the nesting table
    pub fn topology(&self) -> Topology {
        self.topology.read().clone()
    }

    pub fn phase(&self, id: ContainerId) -> Option<ContainerPhase> {
        let slot = self.slot(id).ok()?;
        let phase = *slot.phase.lock();
        Some(phase)
    }

    /// Transactions holding or waiting for a container
    pub fn queue_depth(&self, id: ContainerId) -> Option<u64> {
        self.slot(id).ok().map(|slot| slot.gate.depth())
    }

    pub fn is_quarantined(&self, id: ContainerId) -> bool {
        self.slot(id)
            .map(|slot| slot.state.lock().is_quarantined())
            .unwrap_or(false)
    }

    // ---- queries ----

    /// Run a query against committed state
    pub fn query(&self, query: &ItemQuery) -> QueryResults {
        query.run(self)
    }

    /// Items held by equipment containers
    pub fn equipped_items(&self) -> QueryResults {
        self.query(&ItemQuery::everywhere().filter(ItemFilter::equipped()))
    }

    pub fn is_equipped(&self, item: ItemId) -> bool {
        self.item(item).map(|i| i.is_equipped()).unwrap_or(false)
    }

    // ---- observers ----

    /// Called synchronously after every commit, while the committing
    /// transaction still holds its gates. An observer must not submit a
    /// transaction touching the same containers from inside the callback.
    pub fn subscribe<F>(&self, observer: F) -> SubscriberId
    where
        F: Fn(&ChangeNotification) + Send + Sync + 'static,
    {
        self.observers.subscribe(observer)
    }

    pub fn subscribe_with_priority<F>(&self, observer: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&ChangeNotification) + Send + Sync + 'static,
    {
        self.observers.subscribe_with_priority(observer, priority)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Channel receiving a copy of every notification, for consumers that
    /// drain on their own schedule. Delivery stops when the id is
    /// unsubscribed or the channel and every receiver cloned from it are
    /// dropped.
    pub fn notification_channel(&self) -> (SubscriberId, EventChannel<ChangeNotification>) {
        let channel = EventChannel::new();
        let id = self
            .observers
            .subscribe_channel(channel.sender(), Priority::Low);
        (id, channel)
    }

    /// Registered observers and channels
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ---- diagnostics ----

    /// Check a container's grid against its item list, quarantining it on failure
    pub fn verify(&self, id: ContainerId) -> Result<(), InventoryError> {
        let lease = self.lease(id)?;
        let mut container = self.state_of(&lease, id)?;
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
    pub fn verify_all(&self) -> Vec<InventoryError> {
        self.container_ids()
            .into_iter()
            .filter_map(|id| self.verify(id).err())
            .collect()
    }

    /// Rebuild a container's grid from its item list and lift its quarantine
    pub fn recover(&self, id: ContainerId) -> Result<(), InventoryError> {
        let lease = self.lease(id)?;
        self.state_of(&lease, id)?.rebuild_grid()?;
        log::info!("Recovered container {}", id);
        Ok(())
    }

    /// Consistent copy of the whole store.
    ///
    /// Waits for every container's gate, so it sees no half-applied
    /// transaction.
    pub fn snapshot_arena(&self) -> ContainerArena {
        loop {
            let wanted: Vec<_> = self
                .slots
                .read()
                .iter()
                .map(|(id, slot)| (*id, Arc::clone(slot)))
                .collect();
            let mut lease = Lease { slots: Vec::new() };
            for (id, slot) in wanted {
                slot.gate.acquire();
                lease.slots.push((id, slot));
            }

            let slots = self.slots.read();
            if slots.len() != lease.slots.len() || !lease.is_current(&slots) {
                drop(slots);
                log::trace!("Container set changed while snapshotting; retrying");
                continue;
            }
            drop(slots);

            let topology = self.topology.read().clone();
            let containers: Vec<Container> = lease
                .slots
                .iter()
                .map(|(_, slot)| slot.state.lock().clone())
                .collect();
            return ContainerArena::partial(
                Arc::clone(&self.catalog),
                Arc::clone(&self.ids),
                self.config.placement,
                containers,
                topology,
            );
        }
    }

    // ---- internals ----

    fn slot(&self, id: ContainerId) -> Result<Arc<ContainerSlot>, InventoryError> {
        self.slots
            .read()
            .get(&id)
            .cloned()
            .ok_or(InventoryError::ContainerNotFound(id))
    }

    /// Wait for one container's gate
    fn lease(&self, id: ContainerId) -> Result<Lease, InventoryError> {
        let slot = self.slot(id)?;
        slot.gate.acquire();
        let lease = Lease {
            slots: vec![(id, slot)],
        };
        if !lease.is_current(&self.slots.read()) {
            return Err(InventoryError::ContainerNotFound(id));
        }
        Ok(lease)
    }

    fn state_of<'a>(
        &self,
        lease: &'a Lease,
        id: ContainerId,
    ) -> Result<parking_lot::MutexGuard<'a, Container>, InventoryError> {
        lease
            .slot(id)
            .map(|slot| slot.state.lock())
            .ok_or(InventoryError::ContainerNotFound(id))
    }

    /// Work out the lock set from the current index
    fn plan(&self, ops: &[Operation]) -> Result<LockPlan, PlanError> {
        let slots = self.slots.read();
        let index = self.items.read();
        let mut containers = BTreeSet::new();
        let mut topology = false;

        for op in ops {
            for id in op.containers() {
                if !slots.contains_key(&id) {
                    return Err(PlanError::Rejected(InventoryError::ContainerNotFound(id)));
                }
                containers.insert(id);
            }
            if let Operation::Add { definition, .. } = op {
                if let Ok(definition) = self.catalog.get(definition) {
                    topology |= definition.is_container();
                }
            }
            for item in op.items() {
                let holder = *index.get(&item).ok_or(PlanError::Missing(item))?;
                containers.insert(holder);
                let child = slots
                    .get(&holder)
                    .and_then(|slot| slot.state.lock().get(item).and_then(|i| i.child_container));
                if let Some(child) = child {
                    containers.insert(child);
                    topology = true;
                }
            }
        }
        Ok(LockPlan {
            containers,
            topology,
        })
    }

    /// Take the gates of `plan` in ascending order
    fn acquire(&self, plan: &LockPlan, mode: Acquire) -> Result<Lease, Blocked> {
        let wanted = {
            let slots = self.slots.read();
            let mut wanted = Vec::with_capacity(plan.containers.len());
            for id in &plan.containers {
                match slots.get(id) {
                    Some(slot) => wanted.push((*id, Arc::clone(slot))),
                    None => return Err(Blocked::Gone),
                }
            }
            wanted
        };

        let mut lease = Lease {
            slots: Vec::with_capacity(wanted.len()),
        };
        for (id, slot) in wanted {
            match mode {
                Acquire::Blocking => slot.gate.acquire(),
                Acquire::Try => {
                    if !slot.gate.try_acquire() {
                        return Err(Blocked::Locked(id));
                    }
                }
            }
            lease.slots.push((id, slot));
        }
        Ok(lease)
    }

    fn run(&self, mut tx: Transaction, mode: Acquire) -> TransactionOutcome<TransactionResult> {
        let id = tx.id;
        if tx.is_empty() {
            tx.state = TransactionState::Committed;
            return Ok(TransactionResult::empty(id));
        }
        tx.state = TransactionState::Queued;

        let mut attempt = 0u32;
        let (lease, plan) = loop {
            if tx.is_cancelled() {
                return Err(self.withdraw(&mut tx, WithdrawReason::Cancelled));
            }
            let plan = match self.plan(&tx.ops) {
                Ok(plan) => plan,
                Err(PlanError::Rejected(error)) => return Err(self.reject(&mut tx, error)),
                Err(PlanError::Missing(item)) if attempt == 0 => {
                    return Err(self.reject(&mut tx, InventoryError::ItemNotFound(item)))
                }
                Err(PlanError::Missing(item)) => {
                    return Err(self.withdraw(&mut tx, WithdrawReason::ItemVanished(item)))
                }
            };

            match self.acquire(&plan, mode) {
                Ok(lease) => {
                    // At the head of every queue: last chance to withdraw
                    if tx.is_cancelled() {
                        return Err(self.withdraw(&mut tx, WithdrawReason::Cancelled));
                    }
                    match self.plan(&tx.ops) {
                        Ok(current) if current == plan && lease.is_current(&self.slots.read()) => {
                            break (lease, plan)
                        }
                        Ok(_) => {}
                        Err(PlanError::Missing(item)) => {
                            return Err(self.withdraw(&mut tx, WithdrawReason::ItemVanished(item)))
                        }
                        Err(PlanError::Rejected(error)) => return Err(self.reject(&mut tx, error)),
                    }
                }
                Err(Blocked::Locked(container)) => {
                    return Err(self.reject(&mut tx, InventoryError::ContainerLocked(container)))
                }
                Err(Blocked::Gone) => {}
            }

            attempt += 1;
            log::debug!("Transaction {} re-planning its lock set (attempt {})", id, attempt);
            if attempt > self.config.lock_retry_limit {
                return Err(self.withdraw(&mut tx, WithdrawReason::Contention));
            }
        };

        self.commit(tx, lease, plan)
    }

    /// Validate against working copies and write back on success
    fn commit(&self, mut tx: Transaction, lease: Lease, plan: LockPlan) -> TransactionOutcome<TransactionResult> {
        let id = tx.id;
        tx.state = TransactionState::Validating;
        lease.set_phase(ContainerPhase::Validating);

        let mut topology_guard = plan.topology.then(|| self.topology.write());
        let topology = topology_guard.as_deref().cloned().unwrap_or_default();
        let containers: Vec<Container> = lease
            .slots
            .iter()
            .map(|(_, slot)| slot.state.lock().clone())
            .collect();
        let mut working = ContainerArena::partial(
            Arc::clone(&self.catalog),
            Arc::clone(&self.ids),
            self.config.placement,
            containers,
            topology,
        );

        let mut outcome = Outcome::default();
        for op in &tx.ops {
            match working.apply(op) {
                Ok(step) => outcome.extend(step),
                Err(error) => return Err(self.reject(&mut tx, error)),
            }
        }

        let notification = ChangeNotification::new(id, outcome.changes);
        if self.config.verify_after_commit {
            for container in &notification.containers {
                let Ok(staged) = working.container(*container) else {
                    continue;
                };
                if let Err(error) = staged.verify() {
                    log::error!("Transaction {} left container {} inconsistent: {}", id, container, error);
                    if let Some(slot) = lease.slot(*container) {
                        slot.state.lock().quarantine(error.to_string());
                    }
                    return Err(self.reject(&mut tx, error));
                }
            }
        }

        tx.state = TransactionState::Committing;
        lease.set_phase(ContainerPhase::Committing);

        let (containers, topology) = working.into_parts();
        let commit_guard = self.commit.write();
        let mut spawned = Vec::new();
        for (container_id, container) in containers {
            match lease.slot(container_id) {
                Some(slot) => *slot.state.lock() = container,
                None => spawned.push(container),
            }
        }
        if !spawned.is_empty() {
            let mut slots = self.slots.write();
            for container in spawned {
                slots.insert(container.id(), Arc::new(ContainerSlot::new(container)));
            }
        }
        if let Some(guard) = topology_guard.as_mut() {
            **guard = topology;
        }
        drop(topology_guard);
        {
            let mut index = self.items.write();
            for change in &notification.changes {
                change.apply_to_index(&mut index);
            }
        }
        drop(commit_guard);

        tx.state = TransactionState::Committed;
        self.stats.write().committed += 1;
        log::debug!(
            "Committed transaction {} ({} change(s) across {} container(s))",
            id,
            notification.changes.len(),
            notification.containers.len()
        );

        if !notification.changes.is_empty() {
            self.publish(&notification);
        }
        drop(lease);

        Ok(TransactionResult {
            id,
            containers: notification.containers,
            changes: notification.changes,
            created: outcome.created,
        })
    }

    fn publish(&self, notification: &ChangeNotification) {
        let delivered = self.observers.notify(notification);
        log::trace!("Notified {} observer(s) of {}", delivered, notification.transaction);
    }

    fn reject(&self, tx: &mut Transaction, error: InventoryError) -> TransactionError {
        tx.state = TransactionState::Rejected;
        self.stats.write().rejected += 1;
        log::warn!("Transaction {} rejected: {}", tx.id, error);
        TransactionError::Rejected { id: tx.id, error }
    }

    fn withdraw(&self, tx: &mut Transaction, reason: WithdrawReason) -> TransactionError {
        tx.state = TransactionState::Withdrawn;
        self.stats.write().withdrawn += 1;
        log::warn!("Transaction {} withdrawn: {}", tx.id, reason);
        TransactionError::Withdrawn { id: tx.id, reason }
    }
}

impl ItemSource for InventoryStore {
    fn container_ids(&self) -> Vec<ContainerId> {
        InventoryStore::container_ids(self)
    }

    fn visit_items(&self, container: ContainerId, visit: &mut dyn FnMut(&ItemInstance)) -> bool {
        let Ok(slot) = self.slot(container) else {
            return false;
        };
        // Copy out so the visitor runs without holding the container
        let items = slot.state.lock().items().to_vec();
        items.iter().for_each(visit);
        true
    }

    fn read_consistent(&self, read: &mut dyn FnMut()) {
        let _commit = self.commit.read_recursive();
        read()
    }
}

impl core::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("containers", &self.container_count())
            .field("observers", &self.observers.len())
            .field("stats", &self.stats())
            .finish()
    }
}
