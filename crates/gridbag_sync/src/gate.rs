//! FIFO ticket gates
//!
//! Each container has one gate. Callers draw a ticket and are served strictly
//! in ticket order, so transactions on the same container run in arrival
//! order and nobody starves.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Tickets {
    next: u64,
    serving: u64,
}

/// A fair exclusive gate
#[derive(Debug, Default)]
pub struct FifoGate {
    tickets: Mutex<Tickets>,
    turn: Condvar,
}

impl FifoGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue up and block until it is our turn
    pub fn acquire(&self) {
        let mut tickets = self.tickets.lock();
        let ticket = tickets.next;
        tickets.next += 1;
        if tickets.serving != ticket {
            log::trace!("Waiting for gate (ticket {}, serving {})", ticket, tickets.serving);
        }
        while tickets.serving != ticket {
            self.turn.wait(&mut tickets);
        }
    }

    /// Take the gate only if nobody holds it or waits for it
    pub fn try_acquire(&self) -> bool {
        let mut tickets = self.tickets.lock();
        if tickets.next == tickets.serving {
            tickets.next += 1;
            true
        } else {
            false
        }
    }

    /// Hand the gate to the next ticket
    pub fn release(&self) {
        let mut tickets = self.tickets.lock();
        debug_assert!(tickets.serving < tickets.next, "release without acquire");
        tickets.serving += 1;
        self.turn.notify_all();
    }

    /// Holder plus waiters
    pub fn depth(&self) -> u64 {
        let tickets = self.tickets.lock();
        tickets.next - tickets.serving
    }

    pub fn is_free(&self) -> bool {
        self.depth() == 0
    }
}
