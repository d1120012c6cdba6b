//! # gridbag_event - Observers and Event Channels
//!
//! Delivery primitives for change notifications:
//! - Synchronous observer lists with priority-ordered delivery
//! - Unbounded channels for consumers that drain events on their own schedule
//!
//! Observers are called on the publishing thread. The list is snapshotted
//! before delivery, so observers may subscribe or unsubscribe while being
//! notified. Channel subscriptions are dropped on the first delivery after
//! their last receiver goes away.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Delivery priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Observer callback type. Returning false ends the subscription.
pub type Observer<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

struct Subscription<E> {
    id: SubscriberId,
    priority: Priority,
    observer: Observer<E>,
}

impl<E> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            priority: self.priority,
            observer: Arc::clone(&self.observer),
        }
    }
}

/// Ordered list of observers for one event type
pub struct ObserverList<E: Event> {
    subscriptions: RwLock<Vec<Subscription<E>>>,
    next_id: AtomicU64,
}

impl<E: Event> ObserverList<E> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe at normal priority
    pub fn subscribe<F>(&self, observer: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority(observer, Priority::Normal)
    }

    /// Subscribe with priority. Higher priorities are notified first; equal
    /// priorities keep subscription order.
    pub fn subscribe_with_priority<F>(&self, observer: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.insert(
            Arc::new(move |event: &E| {
                observer(event);
                true
            }),
            priority,
        )
    }

    /// Forward a clone of every event into `sender`. The subscription ends
    /// by itself once every receiver of the channel has been dropped.
    pub fn subscribe_channel(&self, sender: Sender<E>, priority: Priority) -> SubscriberId
    where
        E: Clone,
    {
        self.insert(
            Arc::new(move |event: &E| sender.send(event.clone()).is_ok()),
            priority,
        )
    }

    fn insert(&self, observer: Observer<E>, priority: Priority) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscriptions = self.subscriptions.write();
        subscriptions.push(Subscription {
            id,
            priority,
            observer,
        });
        // Stable sort keeps subscription order within a priority
        subscriptions.sort_by(|a, b| b.priority.cmp(&a.priority));
        id
    }

    /// Unsubscribe; returns false if the id was unknown
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Deliver an event to every observer; returns the number notified.
    ///
    /// Observers that report themselves finished are unsubscribed afterwards.
    pub fn notify(&self, event: &E) -> usize {
        let snapshot: Vec<Subscription<E>> = self.subscriptions.read().clone();
        let mut finished = Vec::new();
        for subscription in &snapshot {
            if !(subscription.observer)(event) {
                finished.push(subscription.id);
            }
        }
        if !finished.is_empty() {
            self.subscriptions
                .write()
                .retain(|s| !finished.contains(&s.id));
        }
        snapshot.len()
    }

    /// Remove every observer
    pub fn clear(&self) {
        self.subscriptions.write().clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }
}

impl<E: Event> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> core::fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.len())
            .finish()
    }
}

/// Channel for single-type events
#[derive(Debug, Clone)]
pub struct EventChannel<E: Event> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E: Event> EventChannel<E> {
    /// Create a new unbounded channel
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Send an event without blocking. Always succeeds while this handle is
    /// alive, since it holds a receiver itself.
    pub fn send(&self, event: E) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Receive an event
    pub fn receive(&self) -> Option<E> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain all events
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    /// Another handle to the receiving side
    pub fn receiver(&self) -> Receiver<E> {
        self.receiver.clone()
    }

    /// Another handle to the sending side
    pub fn sender(&self) -> Sender<E> {
        self.sender.clone()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get pending count
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventChannel, Observer, ObserverList, Priority, SubscriberId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct TestEvent(i32);

    #[test]
    fn test_observer_list() {
        let observers = ObserverList::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = observers.subscribe(move |e: &TestEvent| {
            counter_clone.fetch_add(e.0 as u32, Ordering::SeqCst);
        });

        assert_eq!(observers.notify(&TestEvent(2)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        assert_eq!(observers.notify(&TestEvent(5)), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_event_channel() {
        let channel: EventChannel<TestEvent> = EventChannel::new();

        channel.send(TestEvent(1));
        channel.send(TestEvent(2));
        channel.send(TestEvent(3));
        assert_eq!(channel.len(), 3);

        let events = channel.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].0, 1);
        assert_eq!(events[1].0, 2);
        assert_eq!(events[2].0, 3);
        assert!(channel.receive().is_none());
    }

    #[test]
    fn test_priority() {
        let observers = ObserverList::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let order1 = order.clone();
        let order2 = order.clone();
        let order3 = order.clone();

        observers.subscribe_with_priority(
            move |e: &TestEvent| {
                order1.lock().push(("low", e.0));
            },
            Priority::Low,
        );
        observers.subscribe_with_priority(
            move |e: &TestEvent| {
                order2.lock().push(("high", e.0));
            },
            Priority::High,
        );
        observers.subscribe(move |e: &TestEvent| {
            order3.lock().push(("normal", e.0));
        });

        observers.notify(&TestEvent(42));

        let received = order.lock();
        assert_eq!(received[0].0, "high");
        assert_eq!(received[1].0, "normal");
        assert_eq!(received[2].0, "low");
    }

    #[derive(Clone)]
    struct Tick;

    #[test]
    fn test_channel_subscription_ends_with_its_receivers() {
        let observers: ObserverList<Tick> = ObserverList::new();
        let channel = EventChannel::new();
        observers.subscribe_channel(channel.sender(), Priority::Low);
        observers.subscribe(|_: &Tick| {});

        observers.notify(&Tick);
        assert_eq!(channel.len(), 1);
        assert_eq!(observers.len(), 2);

        let receiver = channel.receiver();
        drop(channel);
        observers.notify(&Tick);
        assert_eq!(observers.len(), 2);
        assert_eq!(receiver.len(), 2);

        drop(receiver);
        assert_eq!(observers.notify(&Tick), 2);
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn test_subscribe_during_delivery() {
        let observers: Arc<ObserverList<TestEvent>> = Arc::new(ObserverList::new());
        let inner = Arc::clone(&observers);
        observers.subscribe(move |_: &TestEvent| {
            inner.subscribe(|_: &TestEvent| {});
        });

        observers.notify(&TestEvent(0));
        assert_eq!(observers.len(), 2);
    }
}
