//! Protocol-engine-backed endpoint node.

use linksim_core::{
    DatagramBatch, Emission, Node, NodeId, SendOutcome, TransportConnection, TransportEngine,
    TIMER_EPSILON,
};
use linksim_types::{ConnectionId, Packet, SimClock, SimTime};
use std::net::SocketAddr;
use tracing::{debug, trace};

/// One side of the simulated path: wraps a transport-protocol engine and
/// converts between packets and engine datagrams.
///
/// Inbound packets are decoded datagram by datagram and fed to the
/// connection (or, on a listening endpoint with no connection yet, offered
/// for acceptance); they are always fully consumed, never queued. Outbound
/// datagrams produced by the engine are wrapped as fresh packets and handed
/// to the configured egress node.
///
/// An endpoint holds at most one connection. With no connection and no
/// listening role it reports no work forever and discards whatever arrives.
pub struct Endpoint<E: TransportEngine> {
    addr: SocketAddr,
    egress: NodeId,
    engine: E,
    conn: Option<E::Connection>,
    listening: bool,
    next_conn_id: ConnectionId,
    batch: DatagramBatch,
    clock: SimClock,
}

impl<E: TransportEngine> Endpoint<E> {
    /// An endpoint with an established connection (the client side; the
    /// harness performs the engine-level connect and installs the result).
    pub fn client(
        addr: SocketAddr,
        egress: NodeId,
        engine: E,
        conn: E::Connection,
        clock: SimClock,
    ) -> Self {
        Endpoint {
            addr,
            egress,
            engine,
            conn: Some(conn),
            listening: false,
            next_conn_id: ConnectionId::FIRST,
            batch: DatagramBatch::new(),
            clock,
        }
    }

    /// A connectionless endpoint that accepts the first valid connection
    /// attempt it decodes.
    pub fn listener(addr: SocketAddr, egress: NodeId, engine: E, clock: SimClock) -> Self {
        Endpoint {
            addr,
            egress,
            engine,
            conn: None,
            listening: true,
            next_conn_id: ConnectionId::FIRST,
            batch: DatagramBatch::new(),
            clock,
        }
    }

    /// A connectionless, non-listening endpoint. It never reports work and
    /// never emits, regardless of inbound traffic.
    pub fn unconnected(addr: SocketAddr, egress: NodeId, engine: E, clock: SimClock) -> Self {
        Endpoint {
            listening: false,
            ..Self::listener(addr, egress, engine, clock)
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connection(&self) -> Option<&E::Connection> {
        self.conn.as_ref()
    }
}

impl<E: TransportEngine> Node for Endpoint<E> {
    fn forward(&mut self, packet: Packet) {
        let mut offset = 0;
        let payload = packet.payload();
        while offset < payload.len() {
            // A decode failure silently truncates the rest of the packet.
            let Some(datagram) = self.engine.decode(payload, &mut offset) else {
                trace!(addr = %self.addr, offset, "undecodable remainder, packet truncated");
                break;
            };

            if let Some(conn) = self.conn.as_mut() {
                conn.receive(packet.dest(), packet.src(), datagram);
            } else if self.listening {
                match self
                    .engine
                    .accept(datagram, packet.dest(), packet.src(), self.next_conn_id)
                {
                    Some(conn) => {
                        debug!(addr = %self.addr, id = %self.next_conn_id, "accepted connection");
                        self.conn = Some(conn);
                        self.next_conn_id = self.next_conn_id.next();
                    }
                    None => {
                        trace!(addr = %self.addr, "connection attempt rejected");
                    }
                }
            }
            // No connection and not listening: the datagram is discarded.
        }
        // The packet is consumed here regardless of how far decoding got.
    }

    fn next_run_at(&self) -> SimTime {
        let Some(conn) = &self.conn else {
            return SimTime::NEVER;
        };
        let Some(millis) = conn.next_timeout_millis() else {
            return SimTime::NEVER;
        };
        let at = SimTime::from_engine_millis(millis) + TIMER_EPSILON;
        at.max(self.clock.now())
    }

    fn run(&mut self) -> Vec<Emission> {
        let Some(conn) = self.conn.as_mut() else {
            return Vec::new();
        };

        self.batch.clear();
        match conn.send(&mut self.batch) {
            SendOutcome::Release => {
                debug!(addr = %self.addr, "connection released");
                self.conn = None;
                Vec::new()
            }
            SendOutcome::Continue => {
                let Some((dest, src)) = self.batch.path() else {
                    debug_assert!(self.batch.is_empty());
                    return Vec::new();
                };
                let now = self.clock.now();
                let egress = self.egress;
                self.batch
                    .drain()
                    .map(|payload| Emission {
                        target: egress,
                        packet: Packet::new(dest, src, payload, now),
                    })
                    .collect()
            }
        }
    }
}
