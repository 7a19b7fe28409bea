//! Interface consumed from the transport-protocol engine.
//!
//! The simulator never looks inside a protocol datagram. It drives the
//! engine through this narrow surface: decode framed datagrams out of a
//! packet, accept a connection on a listening endpoint, feed datagrams into
//! an established connection, ask for the next wake-up time, and ask the
//! connection to produce outbound datagrams. Releasing a connection is
//! dropping it.

use crate::DatagramBatch;
use linksim_types::ConnectionId;
use std::net::SocketAddr;
use std::time::Duration;

/// Added to engine wake times after conversion into simulated seconds, so a
/// timer never fires one tick earlier than the engine intended due to
/// rounding between time units.
pub const TIMER_EPSILON: Duration = Duration::from_micros(100);

/// Outcome of asking a connection to produce outbound datagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The connection stays alive; any produced datagrams are in the batch.
    Continue,

    /// The connection has terminated and may be released. The endpoint
    /// drops it and reverts to the connectionless state.
    Release,
}

/// One side of a transport-protocol engine (the per-endpoint context).
pub trait TransportEngine {
    /// The engine's decoded datagram representation.
    type Datagram;

    /// An established connection.
    type Connection: TransportConnection<Datagram = Self::Datagram>;

    /// Parse one framed datagram from `buf` starting at `*offset`.
    ///
    /// On success, advances `*offset` past the consumed bytes and returns
    /// the datagram. Returns `None` when no further valid datagram remains;
    /// the caller then stops processing the rest of the buffer. `*offset`
    /// must be left unchanged on failure.
    fn decode(&mut self, buf: &[u8], offset: &mut usize) -> Option<Self::Datagram>;

    /// Attempt to accept a new connection from a decoded datagram.
    ///
    /// `dest` and `src` are the addresses of the packet the datagram
    /// arrived in; `id` is the identifier the new connection will carry.
    /// Returns `None` when the datagram is not a valid connection attempt —
    /// a non-fatal condition, the endpoint simply stays connectionless.
    fn accept(
        &mut self,
        datagram: Self::Datagram,
        dest: SocketAddr,
        src: SocketAddr,
        id: ConnectionId,
    ) -> Option<Self::Connection>;
}

/// An established transport connection.
pub trait TransportConnection {
    type Datagram;

    /// Feed one decoded datagram into the connection.
    fn receive(&mut self, dest: SocketAddr, src: SocketAddr, datagram: Self::Datagram);

    /// The engine's next required wake-up, in its native unit (whole
    /// milliseconds since the simulation epoch). `None` when no timer is
    /// pending.
    fn next_timeout_millis(&self) -> Option<u64>;

    /// Produce zero or more outbound datagrams into `batch`, setting the
    /// batch path to the (dest, src) the datagrams travel on.
    fn send(&mut self, batch: &mut DatagramBatch) -> SendOutcome;
}
