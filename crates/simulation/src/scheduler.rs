//! Next-event time-advance scheduler.

use crate::EventLog;
use linksim_core::{Emission, Node, NodeId};
use linksim_types::{Packet, SimClock, SimTime};
use tracing::trace;

/// Outcome of one scheduling step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// The clock advanced to this time and every due node ran.
    Advanced(SimTime),

    /// No node has pending work; the clock did not move.
    Idle,
}

/// Drives a fixed set of nodes with next-event time advancement.
///
/// Each step jumps the clock directly to the minimum of all nodes'
/// reported next-run times and runs every node that is due, in
/// registration order. That fixed order is part of the determinism
/// contract: two runs with the same nodes and inputs produce the same
/// event sequence, bit for bit.
pub struct Scheduler {
    nodes: Vec<Box<dyn Node>>,
    clock: SimClock,
    events: EventLog,
}

impl Scheduler {
    /// A scheduler with a fresh clock and event log.
    pub fn new() -> Self {
        Self::with_parts(SimClock::new(), EventLog::new())
    }

    /// A scheduler over externally created clock and event-log handles,
    /// for harnesses that share them with nodes and engines.
    pub fn with_parts(clock: SimClock, events: EventLog) -> Self {
        Scheduler {
            nodes: Vec::new(),
            clock,
            events,
        }
    }

    /// Register a node. Ids are handed out in registration order.
    pub fn add_node(&mut self, node: Box<dyn Node>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Execute one scheduling step.
    ///
    /// # Panics
    ///
    /// Panics if any node reports a next-run time earlier than the current
    /// clock — that is a bug in the node or the scheduler, not a
    /// recoverable condition.
    pub fn step(&mut self) -> Step {
        let now = self.clock.now();
        let mut next = SimTime::NEVER;
        for (id, node) in self.nodes.iter().enumerate() {
            let at = node.next_run_at();
            assert!(
                at >= now,
                "node {id} reported next_run_at {at} earlier than the clock {now}"
            );
            next = next.min(at);
        }

        if next.is_never() {
            return Step::Idle;
        }

        self.clock.advance(next);
        trace!(%next, "clock advanced");

        for index in 0..self.nodes.len() {
            // Re-query: a delivery from an earlier node in this pass may
            // have made this node due at the new clock value.
            if self.nodes[index].next_run_at() <= next {
                let emissions = self.nodes[index].run();
                for Emission { target, packet } in emissions {
                    self.deliver(target, packet);
                }
            }
        }

        Step::Advanced(next)
    }

    fn deliver(&mut self, target: NodeId, packet: Packet) {
        let node = self
            .nodes
            .get_mut(target.0)
            .unwrap_or_else(|| panic!("emission targets unknown node {target}"));
        node.forward(packet);
    }

    /// Step until the clock reaches `horizon` or every node goes idle.
    /// Returns the final clock value.
    pub fn run_until(&mut self, horizon: SimTime) -> SimTime {
        while self.clock.now() < horizon {
            if self.step() == Step::Idle {
                break;
            }
        }
        self.clock.now()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linksim_types::AddressAllocator;
    use std::cell::RefCell;
    use std::net::SocketAddr;
    use std::rc::Rc;

    /// A node that runs at scripted times and records each run, optionally
    /// emitting one packet per run to a target.
    struct ScriptedNode {
        name: &'static str,
        clock: SimClock,
        due_times: Vec<SimTime>, // ascending; consumed front to back
        runs: Rc<RefCell<Vec<(&'static str, SimTime)>>>,
        emit_to: Option<NodeId>,
        addr: SocketAddr,
        /// When set, becomes due at the current time on every forward.
        wake_on_forward: bool,
    }

    impl ScriptedNode {
        fn new(
            name: &'static str,
            clock: &SimClock,
            due_times: Vec<f64>,
            runs: &Rc<RefCell<Vec<(&'static str, SimTime)>>>,
        ) -> Self {
            let mut alloc = AddressAllocator::new();
            ScriptedNode {
                name,
                clock: clock.clone(),
                due_times: due_times.into_iter().map(SimTime::from_secs).collect(),
                runs: runs.clone(),
                emit_to: None,
                addr: alloc.next(),
                wake_on_forward: false,
            }
        }
    }

    impl Node for ScriptedNode {
        fn forward(&mut self, _packet: Packet) {
            // Consumed on delivery; scripted nodes only observe timing.
            if self.wake_on_forward {
                self.due_times.insert(0, self.clock.now());
            }
        }

        fn next_run_at(&self) -> SimTime {
            self.due_times.first().copied().unwrap_or(SimTime::NEVER)
        }

        fn run(&mut self) -> Vec<Emission> {
            let now = self.clock.now();
            if self.next_run_at() > now {
                return Vec::new();
            }
            self.due_times.remove(0);
            self.runs.borrow_mut().push((self.name, now));
            match self.emit_to {
                Some(target) => vec![Emission {
                    target,
                    packet: Packet::new(self.addr, self.addr, vec![0u8; 8], now),
                }],
                None => Vec::new(),
            }
        }
    }

    #[test]
    fn advances_to_minimum_and_runs_only_due_nodes() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();

        sched.add_node(Box::new(ScriptedNode::new("a", &clock, vec![2.0], &runs)));
        sched.add_node(Box::new(ScriptedNode::new("b", &clock, vec![1.0, 3.0], &runs)));

        assert_eq!(sched.step(), Step::Advanced(SimTime::from_secs(1.0)));
        assert_eq!(sched.now(), SimTime::from_secs(1.0));
        assert_eq!(*runs.borrow(), vec![("b", SimTime::from_secs(1.0))]);

        assert_eq!(sched.step(), Step::Advanced(SimTime::from_secs(2.0)));
        assert_eq!(sched.step(), Step::Advanced(SimTime::from_secs(3.0)));
        assert_eq!(
            *runs.borrow(),
            vec![
                ("b", SimTime::from_secs(1.0)),
                ("a", SimTime::from_secs(2.0)),
                ("b", SimTime::from_secs(3.0)),
            ]
        );
    }

    #[test]
    fn same_instant_nodes_run_in_registration_order() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();

        sched.add_node(Box::new(ScriptedNode::new("first", &clock, vec![1.0], &runs)));
        sched.add_node(Box::new(ScriptedNode::new("second", &clock, vec![1.0], &runs)));
        sched.add_node(Box::new(ScriptedNode::new("third", &clock, vec![1.0], &runs)));

        sched.step();
        let names: Vec<&str> = runs.borrow().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn idle_when_no_node_has_work() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();
        sched.add_node(Box::new(ScriptedNode::new("a", &clock, vec![], &runs)));

        assert_eq!(sched.step(), Step::Idle);
        assert_eq!(sched.now(), SimTime::ZERO);
        assert!(runs.borrow().is_empty());
    }

    #[test]
    fn run_until_stops_at_idle_without_advancing_further() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();
        sched.add_node(Box::new(ScriptedNode::new("a", &clock, vec![1.0, 2.0], &runs)));

        let end = sched.run_until(SimTime::from_secs(100.0));
        assert_eq!(end, SimTime::from_secs(2.0));
        assert_eq!(runs.borrow().len(), 2);
    }

    #[test]
    fn a_delivery_can_make_a_later_node_due_in_the_same_step() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();

        let mut producer = ScriptedNode::new("producer", &clock, vec![1.0], &runs);
        producer.emit_to = Some(NodeId(1));
        let mut consumer = ScriptedNode::new("consumer", &clock, vec![], &runs);
        consumer.wake_on_forward = true;

        sched.add_node(Box::new(producer));
        sched.add_node(Box::new(consumer));

        sched.step();
        // The consumer received the packet at t=1 and ran within the same
        // step, exactly like a queue delivery waking an endpoint.
        let names: Vec<&str> = runs.borrow().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["producer", "consumer"]);
        assert_eq!(sched.now(), SimTime::from_secs(1.0));
    }

    #[test]
    #[should_panic(expected = "earlier than the clock")]
    fn past_due_report_is_fatal() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();
        sched.add_node(Box::new(ScriptedNode::new("a", &clock, vec![1.0], &runs)));
        sched.add_node(Box::new(ScriptedNode::new("late", &clock, vec![0.5, 5.0], &runs)));

        // Advance the clock to 1.0, then register a node scripted to be due
        // in the past. The next step must treat that report as fatal.
        sched.step();
        sched.step();
        sched.add_node(Box::new(ScriptedNode::new("stale", &clock, vec![0.1], &runs)));
        sched.step();
    }

    #[test]
    fn every_delivery_reaches_its_target() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let clock = sched.clock().clone();

        let mut producer = ScriptedNode::new("producer", &clock, vec![1.0, 2.0], &runs);
        producer.emit_to = Some(NodeId(1));
        let mut consumer = ScriptedNode::new("consumer", &clock, vec![], &runs);
        consumer.wake_on_forward = true;

        sched.add_node(Box::new(producer));
        sched.add_node(Box::new(consumer));

        sched.run_until(SimTime::from_secs(10.0));
        assert_eq!(
            *runs.borrow(),
            vec![
                ("producer", SimTime::from_secs(1.0)),
                ("consumer", SimTime::from_secs(1.0)),
                ("producer", SimTime::from_secs(2.0)),
                ("consumer", SimTime::from_secs(2.0)),
            ]
        );
    }
}
