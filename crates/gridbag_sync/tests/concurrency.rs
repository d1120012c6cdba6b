//! Multi-threaded behavior of the inventory store

use crossbeam_channel::{unbounded, Sender};
use gridbag_catalog::{ContainerTemplate, ItemCatalog, ItemDefinition};
use gridbag_container::{Change, ContainerSettings, Operation};
use gridbag_core::{ContainerId, InventoryError};
use gridbag_event::SubscriberId;
use gridbag_query::{ItemFilter, ItemQuery, QueryManager};
use gridbag_sync::prelude::*;
use gridbag_sync::TransactionOutcome;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> Arc<ItemCatalog> {
    let mut catalog = ItemCatalog::new();
    for definition in [
        ItemDefinition::new("ammo", "Ammo")
            .with_max_stack(30)
            .with_tag("Item.Type.Ammo"),
        ItemDefinition::new("knife", "Knife").with_tag("Item.Type.Weapon"),
        ItemDefinition::new("medkit", "Medkit").with_tag("Item.Type.Medical"),
        ItemDefinition::new("crate", "Crate"),
        ItemDefinition::new("pouch", "Pouch").with_container(ContainerTemplate::grid(3, 3)),
    ] {
        catalog.register(definition).unwrap();
    }
    Arc::new(catalog)
}

fn new_store() -> Arc<InventoryStore> {
    init_logging();
    Arc::new(InventoryStore::new(catalog()))
}

fn wait_for_depth(store: &InventoryStore, container: ContainerId, depth: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while store.queue_depth(container) != Some(depth) {
        assert!(
            Instant::now() < deadline,
            "queue for {} never reached {}",
            container,
            depth
        );
        thread::sleep(Duration::from_millis(1));
    }
}

/// A transaction parked inside its observer callback, still holding the gate
struct Hold {
    store: Arc<InventoryStore>,
    subscriber: SubscriberId,
    release: Sender<()>,
    handle: JoinHandle<TransactionOutcome<TransactionResult>>,
}

impl Hold {
    fn on(store: &Arc<InventoryStore>, container: ContainerId) -> Self {
        let (entered_tx, entered_rx) = unbounded();
        let (release_tx, release_rx) = unbounded::<()>();
        let armed = AtomicBool::new(true);
        let subscriber = store.subscribe(move |n| {
            if n.touches(container) && armed.swap(false, Ordering::SeqCst) {
                entered_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            }
        });
        let handle = {
            let store = Arc::clone(store);
            thread::spawn(move || store.add_item(container, "ammo", 1))
        };
        entered_rx.recv().unwrap();
        Self {
            store: Arc::clone(store),
            subscriber,
            release: release_tx,
            handle,
        }
    }

    fn release(self) -> TransactionResult {
        self.release.send(()).unwrap();
        let result = self.handle.join().unwrap().unwrap();
        self.store.unsubscribe(self.subscriber);
        result
    }
}

#[test]
fn racing_moves_into_one_cell_commit_exactly_once() {
    let store = new_store();
    let left = store.create_container(ContainerSettings::grid(2, 2)).unwrap();
    let right = store.create_container(ContainerSettings::grid(2, 2)).unwrap();
    let slot = store.create_container(ContainerSettings::grid(1, 1)).unwrap();
    let a = store.add_item(left, "crate", 1).unwrap().created[0];
    let b = store.add_item(right, "crate", 1).unwrap().created[0];

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [(a, left), (b, right)]
        .into_iter()
        .map(|(item, from)| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.move_item(item, from, slot, None)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(
        failure.inventory_error(),
        Some(&InventoryError::NoFreeSlot { container: slot })
    );
    assert_eq!(store.snapshot(slot).unwrap().len(), 1);
    assert_eq!(
        store.snapshot(left).unwrap().len() + store.snapshot(right).unwrap().len(),
        1
    );
}

#[test]
fn disjoint_containers_do_not_wait_for_each_other() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let b = store.create_container(ContainerSettings::grid(4, 4)).unwrap();

    let hold = Hold::on(&store, a);
    assert_eq!(store.phase(a), Some(ContainerPhase::Committing));

    store.add_item(b, "knife", 1).unwrap();
    assert_eq!(store.phase(b), Some(ContainerPhase::Idle));
    assert_eq!(store.queue_depth(a), Some(1));

    hold.release();
    assert_eq!(store.phase(a), Some(ContainerPhase::Idle));
}

#[test]
fn transactions_on_one_container_run_in_arrival_order() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let (_, channel) = store.notification_channel();

    let hold = Hold::on(&store, a);
    let mut handles = Vec::new();
    for (i, key) in ["knife", "medkit", "crate"].into_iter().enumerate() {
        let store_ref = Arc::clone(&store);
        handles.push(thread::spawn(move || store_ref.add_item(a, key, 1)));
        wait_for_depth(&store, a, i as u64 + 2);
    }
    hold.release();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let added: Vec<String> = channel
        .drain()
        .iter()
        .flat_map(|n| n.changes.clone())
        .filter_map(|change| match change {
            Change::ItemAdded { item, .. } => Some(item.key().as_str().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(added, vec!["ammo", "knife", "medkit", "crate"]);
}

#[test]
fn cancelled_while_queued_is_withdrawn() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(4, 4)).unwrap();

    let hold = Hold::on(&store, a);
    let tx = Transaction::single(Operation::add(a, "medkit", 1));
    let token = tx.cancel_token();
    let waiting = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.execute(tx))
    };
    wait_for_depth(&store, a, 2);
    token.cancel();
    hold.release();

    let err = waiting.join().unwrap().unwrap_err();
    assert_eq!(
        err,
        TransactionError::Withdrawn {
            id: err.id(),
            reason: WithdrawReason::Cancelled
        }
    );
    let keys: Vec<_> = store
        .snapshot(a)
        .unwrap()
        .items()
        .iter()
        .map(|i| i.key().as_str().to_string())
        .collect();
    assert_eq!(keys, vec!["ammo"]);
}

#[test]
fn item_removed_while_queued_withdraws_the_transaction() {
    let store = new_store();
    // `target` has the lower id, so the move queues on it before touching `source`
    let target = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let source = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let knife = store.add_item(source, "knife", 1).unwrap().created[0];

    let hold = Hold::on(&store, target);
    let mover = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.move_item(knife, source, target, None))
    };
    wait_for_depth(&store, target, 2);
    assert_eq!(store.queue_depth(source), Some(0));

    store.remove_item(knife).unwrap();
    hold.release();

    let err = mover.join().unwrap().unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Withdrawn {
            reason: WithdrawReason::ItemVanished(item),
            ..
        } if item == knife
    ));
    assert_eq!(store.stats().withdrawn, 1);
}

#[test]
fn try_execute_reports_a_busy_container() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let b = store.create_container(ContainerSettings::grid(4, 4)).unwrap();

    let hold = Hold::on(&store, a);
    let err = store
        .try_execute(Transaction::single(Operation::add(a, "knife", 1)))
        .unwrap_err();
    assert_eq!(err.inventory_error(), Some(&InventoryError::ContainerLocked(a)));
    assert!(store
        .try_execute(Transaction::single(Operation::add(b, "knife", 1)))
        .is_ok());
    hold.release();

    assert!(store
        .try_execute(Transaction::single(Operation::add(a, "knife", 1)))
        .is_ok());
}

#[test]
fn concurrent_consumes_never_oversell_a_stack() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(2, 2)).unwrap();
    let stack = store.add_item(a, "ammo", 30).unwrap().created[0];

    let consumed = Arc::new(AtomicU32::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                for _ in 0..10 {
                    if store.consume(stack, 1).is_ok() {
                        consumed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(consumed.load(Ordering::SeqCst), 30);
    assert!(store.snapshot(a).unwrap().is_empty());
    assert_eq!(store.locate(stack), None);
}

#[test]
fn shuffling_between_shared_containers_keeps_everything_consistent() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(8, 8)).unwrap();
    let b = store.create_container(ContainerSettings::grid(8, 8)).unwrap();
    let mut owned = Vec::new();
    for _ in 0..8 {
        let first = store.add_item(a, "crate", 1).unwrap().created[0];
        let second = store.add_item(b, "crate", 1).unwrap().created[0];
        owned.push(vec![(first, a), (second, b)]);
    }

    let handles: Vec<_> = owned
        .into_iter()
        .map(|mut items| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..25 {
                    let (item, from) = items[round % 2];
                    let to = if from == a { b } else { a };
                    store.move_item(item, from, to, None).unwrap();
                    items[round % 2] = (item, to);
                }
                items
            })
        })
        .collect();

    for handle in handles {
        for (item, container) in handle.join().unwrap() {
            assert_eq!(store.locate(item), Some(container));
            assert!(store.snapshot(container).unwrap().contains(item));
        }
    }
    assert!(store.verify_all().is_empty());
    let total = store.snapshot(a).unwrap().len() + store.snapshot(b).unwrap().len();
    assert_eq!(total, 16);
}

#[test]
fn readers_never_see_a_half_committed_move() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(2, 2)).unwrap();
    let b = store.create_container(ContainerSettings::grid(2, 2)).unwrap();
    let knife = store.add_item(a, "knife", 1).unwrap().created[0];

    let done = Arc::new(AtomicBool::new(false));
    let mover = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut from = a;
            for _ in 0..2_000 {
                let to = if from == a { b } else { a };
                store.move_item(knife, from, to, None).unwrap();
                from = to;
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let everywhere = ItemQuery::everywhere();
    let mut reads = 0u64;
    while !done.load(Ordering::SeqCst) || reads < 1_000 {
        let seen = everywhere.run(store.as_ref());
        assert_eq!(seen.len(), 1, "knife seen {} times", seen.len());
        assert_eq!(everywhere.count(store.as_ref()), 1);
        let located = store.item(knife).unwrap();
        assert!(located.container == a || located.container == b);
        reads += 1;
    }
    mover.join().unwrap();
}

#[test]
fn crossing_bag_moves_cannot_build_a_cycle() {
    let store = new_store();
    let left = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let right = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let p1 = store.add_item(left, "pouch", 1).unwrap().created[0];
    let p2 = store.add_item(right, "pouch", 1).unwrap().created[0];
    let inner1 = store.item(p1).unwrap().child_container.unwrap();
    let inner2 = store.item(p2).unwrap().child_container.unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [(p1, left, inner2), (p2, right, inner1)]
        .into_iter()
        .map(|(bag, from, to)| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.move_item(bag, from, to, None)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        failure.inventory_error(),
        Some(InventoryError::CyclicContainment { .. })
    ));

    let topology = store.topology();
    assert!(!topology.ancestors(inner1).contains(&inner1));
    assert!(!topology.ancestors(inner2).contains(&inner2));
    assert!(topology.is_within(inner1, inner2) ^ topology.is_within(inner2, inner1));
}

#[test]
fn registered_queries_follow_notifications() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let b = store.create_container(ContainerSettings::grid(4, 4)).unwrap();
    let (subscriber, channel) = store.notification_channel();

    let query = ItemQuery::everywhere().filter(ItemFilter::tag("Item.Type.Ammo"));
    let mut manager = QueryManager::new();
    manager.register("ammo", query.clone(), store.as_ref());

    let stack = store.add_item(a, "ammo", 40).unwrap().created[0];
    store.add_item(b, "knife", 1).unwrap();
    store.move_item(stack, a, b, None).unwrap();
    store.consume(stack, 5).unwrap();

    for notification in channel.drain() {
        manager.apply(&notification.changes);
    }
    let cached = manager.results("ammo", store.as_ref()).unwrap();
    assert_eq!(cached.ids(), store.query(&query).ids());
    assert_eq!(cached.total_count(), 35);

    assert!(store.unsubscribe(subscriber));
    store.add_item(a, "ammo", 1).unwrap();
    assert!(channel.is_empty());
}

#[test]
fn quarantined_container_refuses_work_until_recovered() {
    init_logging();
    let seed = InventoryStore::new(catalog());
    let a = seed.create_container(ContainerSettings::grid(3, 3)).unwrap();
    seed.add_item(a, "knife", 1).unwrap();

    let mut arena = seed.snapshot_arena();
    arena
        .container_mut(a)
        .unwrap()
        .grid_mut()
        .unwrap()
        .clear();
    let store = InventoryStore::from_arena(arena, StoreConfig::default());
    assert!(store.is_quarantined(a));

    let err = store.add_item(a, "medkit", 1).unwrap_err();
    assert!(err.inventory_error().map(InventoryError::is_fatal).unwrap_or(false));
    assert!(store.verify(a).is_err());

    store.recover(a).unwrap();
    assert!(!store.is_quarantined(a));
    store.verify(a).unwrap();
    store.add_item(a, "medkit", 1).unwrap();
    assert_eq!(store.snapshot(a).unwrap().len(), 2);
}

#[test]
fn repeated_rejection_changes_nothing() {
    let store = new_store();
    let a = store.create_container(ContainerSettings::grid(1, 1)).unwrap();
    store.add_item(a, "crate", 1).unwrap();
    let before = store.snapshot(a).unwrap();

    let tx = TransactionBuilder::new()
        .description("does not fit")
        .op(Operation::add(a, "knife", 1))
        .build();
    for _ in 0..3 {
        let err = store.execute(tx.clone()).unwrap_err();
        assert_eq!(
            err.inventory_error(),
            Some(&InventoryError::NoFreeSlot { container: a })
        );
        assert_eq!(store.snapshot(a).unwrap(), before);
    }
    assert_eq!(store.stats().rejected, 3);
}
