//! Observable link events.
//!
//! Every queue decision — a packet admitted, dropped, or released
//! downstream — is recorded with its timestamp and the queue occupancy at
//! that instant. Test suites assert on the sequence of kinds and the
//! approximate timestamps; the harness aggregates counts and byte totals
//! from the same record.

use linksim_types::SimTime;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// What happened at a bottleneck queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEventKind {
    /// A packet was admitted to the queue.
    Enqueue,

    /// A packet was dropped because it would overflow the queue capacity.
    Drop,

    /// The head packet was released to the downstream node.
    Shift,
}

/// One recorded link event.
///
/// `queued_bytes` is the queue occupancy at the moment the event was
/// recorded: before insertion for enqueues, after removal for shifts, and
/// unchanged for drops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkEvent {
    pub kind: LinkEventKind,
    pub at: SimTime,
    /// Size of the packet the event is about.
    pub packet_bytes: usize,
    pub queued_bytes: usize,
}

/// Shared recorder for link events.
///
/// Cloned into each queue at construction; the harness and tests keep a
/// handle to read the record back. Single-threaded, like everything else in
/// the simulation.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    inner: Rc<RefCell<Vec<LinkEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: LinkEventKind, at: SimTime, packet_bytes: usize, queued_bytes: usize) {
        trace!(?kind, %at, packet_bytes, queued_bytes, "link event");
        self.inner.borrow_mut().push(LinkEvent {
            kind,
            at,
            packet_bytes,
            queued_bytes,
        });
    }

    /// Snapshot of the events recorded so far, in order.
    pub fn events(&self) -> Vec<LinkEvent> {
        self.inner.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Number of recorded events of one kind.
    pub fn count(&self, kind: LinkEventKind) -> usize {
        self.inner.borrow().iter().filter(|e| e.kind == kind).count()
    }

    /// Total packet bytes across recorded events of one kind.
    pub fn bytes(&self, kind: LinkEventKind) -> u64 {
        self.inner
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.packet_bytes as u64)
            .sum()
    }
}
