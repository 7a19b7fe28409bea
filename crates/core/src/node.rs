//! The node abstraction scheduled by the simulator.

use linksim_types::{Packet, SimTime};
use std::fmt;

/// Index of a node in the scheduler's registration order.
///
/// Registration order doubles as the fixed iteration order when several
/// nodes are due at the same instant, so ids are stable for the lifetime
/// of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// A packet produced by a node's [`Node::run`], to be delivered to another
/// node by the scheduler.
///
/// Nodes never hold references to each other; handing emissions back to the
/// scheduler keeps every packet transfer a by-value move with a single
/// owner.
#[derive(Debug)]
pub struct Emission {
    pub target: NodeId,
    pub packet: Packet,
}

/// A simulation participant.
///
/// All participants — relays and protocol endpoints alike — expose the same
/// three operations, and all behavior is deterministic: the same inputs in
/// the same order always produce the same packets at the same times.
pub trait Node {
    /// Accept an incoming packet for forwarding. Ownership of the packet
    /// transfers to the node; it either keeps it queued or consumes it.
    fn forward(&mut self, packet: Packet);

    /// The next simulated time at which this node has work to do, or
    /// [`SimTime::NEVER`] when idle. Must never be earlier than the current
    /// clock value; the scheduler treats a past-due report as a fatal bug.
    fn next_run_at(&self) -> SimTime;

    /// Perform whatever work is due. Packets to hand off to other nodes are
    /// returned for the scheduler to route. Must be a no-op when nothing is
    /// due.
    fn run(&mut self) -> Vec<Emission>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId(2).to_string(), "Node(2)");
    }
}
