//! The bottleneck queue node.

use crate::{ConfigError, EventLog, LinkConfig, LinkEventKind};
use linksim_core::{Emission, Node, NodeId};
use linksim_types::{Packet, SimClock, SimTime};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, trace};

/// A capacity-bounded, rate-limited, delay-inducing relay.
///
/// Packets are admitted in FIFO order up to the byte capacity; a packet
/// that would overflow is dropped with no signal to the sender, matching a
/// best-effort link. The head packet becomes eligible to leave at
/// `max(enter_at + prop_delay, next_emit_at)` — one formula covering both
/// fixed propagation latency and serialization delay under finite
/// bandwidth, with `next_emit_at` the link-free cursor advanced by
/// `size / bandwidth` on every emission.
pub struct BottleneckQueue {
    downstream: NodeId,
    clock: SimClock,
    events: EventLog,
    queue: VecDeque<Packet>,
    queued_bytes: usize,
    capacity_bytes: usize,
    prop_delay: Duration,
    bytes_per_sec: f64,
    /// Earliest time the outbound link is free for the next departure.
    next_emit_at: SimTime,
}

impl BottleneckQueue {
    /// Build a queue relaying to `downstream`.
    pub fn new(
        config: &LinkConfig,
        downstream: NodeId,
        clock: SimClock,
        events: EventLog,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(BottleneckQueue {
            downstream,
            clock,
            events,
            queue: VecDeque::new(),
            queued_bytes: 0,
            capacity_bytes: config.capacity_bytes(),
            prop_delay: config.prop_delay,
            bytes_per_sec: config.bandwidth_bytes_per_sec,
            next_emit_at: SimTime::ZERO,
        })
    }

    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Node for BottleneckQueue {
    fn forward(&mut self, mut packet: Packet) {
        let now = self.clock.now();
        if self.queued_bytes + packet.size() > self.capacity_bytes {
            debug!(%now, size = packet.size(), queued = self.queued_bytes, "queue full, packet dropped");
            self.events
                .record(LinkEventKind::Drop, now, packet.size(), self.queued_bytes);
            return;
        }

        self.events
            .record(LinkEventKind::Enqueue, now, packet.size(), self.queued_bytes);
        packet.set_enter_at(now);
        self.queued_bytes += packet.size();
        self.queue.push_back(packet);
    }

    fn next_run_at(&self) -> SimTime {
        match self.queue.front() {
            None => SimTime::NEVER,
            Some(head) => (head.enter_at() + self.prop_delay).max(self.next_emit_at),
        }
    }

    fn run(&mut self) -> Vec<Emission> {
        let now = self.clock.now();
        if self.next_run_at() > now {
            return Vec::new();
        }
        let Some(packet) = self.queue.pop_front() else {
            return Vec::new();
        };

        self.queued_bytes -= packet.size();
        self.next_emit_at = now.plus_secs(packet.size() as f64 / self.bytes_per_sec);
        self.events
            .record(LinkEventKind::Shift, now, packet.size(), self.queued_bytes);
        trace!(%now, size = packet.size(), queued = self.queued_bytes, "packet released downstream");

        vec![Emission {
            target: self.downstream,
            packet,
        }]
    }
}
