//! Harness wiring and run loop.

use crate::{HarnessConfig, SetupError, SimulationReport};
use linksim_core::NodeId;
use linksim_simulation::{BottleneckQueue, Endpoint, EventLog, Scheduler};
use linksim_test_helpers::{ClientStatsHandle, ServerStatsHandle, TestEngine};
use linksim_types::{AddressAllocator, SimClock, SimTime};
use std::time::Duration;
use tracing::{debug, info};

// Node ids follow registration order.
const QUEUE: NodeId = NodeId(0);
const SERVER: NodeId = NodeId(1);
const CLIENT: NodeId = NodeId(2);

/// A fixed three-node topology: the client uploads to the server through
/// the bottleneck queue, and the server's acknowledgments return directly
/// to the client.
///
/// ```text
/// client ──▶ bottleneck ──▶ server
///    ▲                         │
///    └─────────────────────────┘
/// ```
pub struct Harness {
    horizon: SimTime,
    scheduler: Scheduler,
    events: EventLog,
    client_stats: ClientStatsHandle,
    server_stats: ServerStatsHandle,
}

impl Harness {
    /// Build the topology and establish the client connection.
    pub fn new(config: HarnessConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let clock = SimClock::new();
        let events = EventLog::new();
        let mut addrs = AddressAllocator::new();
        let server_addr = addrs.next();
        let client_addr = addrs.next();

        let (server_engine, server_stats) =
            TestEngine::server(clock.clone(), config.traffic.clone());
        let client_engine = TestEngine::client(clock.clone(), config.traffic.clone());
        let (conn, client_stats) = client_engine.connect(client_addr, server_addr, config.seed);

        let queue = BottleneckQueue::new(&config.link, SERVER, clock.clone(), events.clone())?;
        let server = Endpoint::listener(server_addr, CLIENT, server_engine, clock.clone());
        let client = Endpoint::client(client_addr, QUEUE, client_engine, conn, clock.clone());

        let mut scheduler = Scheduler::with_parts(clock, events.clone());
        let queue_id = scheduler.add_node(Box::new(queue));
        let server_id = scheduler.add_node(Box::new(server));
        let client_id = scheduler.add_node(Box::new(client));
        debug_assert_eq!((queue_id, server_id, client_id), (QUEUE, SERVER, CLIENT));
        debug!(%server_addr, %client_addr, "topology wired");

        Ok(Harness {
            horizon: SimTime::from_duration(config.horizon),
            scheduler,
            events,
            client_stats,
            server_stats,
        })
    }

    /// The shared event log, for callers that want raw events.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drive the simulation to the horizon (or to idle) and report.
    pub fn run(mut self) -> SimulationReport {
        let end = self.scheduler.run_until(self.horizon);
        info!(%end, "simulation finished");

        SimulationReport::collect(
            Duration::from_secs_f64(end.as_secs()),
            &self.client_stats.borrow(),
            &self.server_stats.borrow(),
            &self.events,
        )
    }
}
