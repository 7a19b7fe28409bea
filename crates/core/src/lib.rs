//! Core abstractions for linksim.
//!
//! Two seams live here:
//!
//! - The [`Node`] trait — the polymorphic forward / next-run-at / run
//!   surface every simulation participant implements, scheduled by the
//!   runner in `linksim-simulation`.
//! - The [`TransportEngine`] / [`TransportConnection`] traits — the narrow
//!   interface the simulator consumes from an external transport-protocol
//!   engine. The engine itself (connection state machine, congestion
//!   control, crypto) is out of scope by design.

mod batch;
mod node;
mod transport;

pub use batch::{BatchError, DatagramBatch, MAX_BATCH_DATAGRAMS, MAX_DATAGRAM_SIZE};
pub use node::{Emission, Node, NodeId};
pub use transport::{SendOutcome, TransportConnection, TransportEngine, TIMER_EPSILON};
