//! # Search Tickets
//!
//! Product searches run in the background while the operator keeps typing.
//! Each search takes a ticket from a monotonically increasing generation;
//! only the newest ticket may deliver results.
//!
//! ```text
//! issue() ─► #1 "para"      ┐
//! issue() ─► #2 "parac"     ├─ in flight
//! issue() ─► #3 "paracet"   ┘
//!
//! #3 arrives ─► accepted, shown
//! #1 arrives ─► stale, dropped        (last requested wins)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Shared generation counter. Clones observe the same generation.
#[derive(Debug, Clone, Default)]
pub struct SearchTickets {
    generation: Arc<AtomicU64>,
}

impl SearchTickets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new search, making every earlier ticket stale.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Makes every outstanding ticket stale without starting a search.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_requested_wins() {
        let tickets = SearchTickets::new();
        let first = tickets.issue();
        let second = tickets.issue();

        assert!(!tickets.is_current(first));
        assert!(tickets.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn test_invalidate_drops_outstanding() {
        let tickets = SearchTickets::new();
        let ticket = tickets.issue();
        tickets.clone().invalidate();
        assert!(!tickets.is_current(ticket));
    }
}
