//! Deterministic transport engine for exercising the simulator.
//!
//! This is not a real transport protocol — no retransmission of data, no
//! congestion control — just enough deterministic behavior to drive the
//! simulator end to end: a client that retransmits a hello until it is
//! acknowledged and then streams fixed-size data frames in paced batches,
//! and a server that accepts the hello, checks ordering, measures one-way
//! latency, and acknowledges every few frames.
//!
//! All timing derives from the shared simulated clock in whole
//! milliseconds, and payload bytes come from a seeded RNG, so a run is a
//! pure function of its configuration.

use crate::wire::{Frame, FrameKind, FRAME_OVERHEAD};
use linksim_core::{
    DatagramBatch, SendOutcome, TransportConnection, TransportEngine, MAX_BATCH_DATAGRAMS,
    MAX_DATAGRAM_SIZE,
};
use linksim_types::{ConnectionId, SimClock};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors validating a traffic configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrafficError {
    #[error("frame payload of {0} bytes does not fit a {MAX_DATAGRAM_SIZE}-byte datagram")]
    FramePayloadTooLarge(usize),

    #[error("batch of {0} frames exceeds the {MAX_BATCH_DATAGRAMS}-datagram send limit")]
    BatchTooLarge(usize),

    #[error("{0} must be at least one millisecond")]
    IntervalTooShort(&'static str),

    #[error("ack stride must be at least 1")]
    ZeroAckStride,
}

/// Shape of the traffic the client generates.
#[derive(Debug, Clone)]
pub struct TrafficConfig {
    /// Payload bytes per data frame.
    pub frame_payload_len: usize,

    /// Data frames per paced batch.
    pub batch_frames: usize,

    /// Interval between batches.
    pub pace: Duration,

    /// Hello retransmit interval while the handshake is unacknowledged.
    pub hello_retry: Duration,

    /// The server acknowledges every this-many data frames.
    pub ack_stride: u64,

    /// Stop after this many data frames; `None` streams until the horizon.
    pub total_frames: Option<u64>,

    /// Release the connection once every frame has been sent.
    pub close_when_done: bool,
}

impl TrafficConfig {
    pub fn with_frame_payload_len(mut self, len: usize) -> Self {
        self.frame_payload_len = len;
        self
    }

    pub fn with_batch_frames(mut self, frames: usize) -> Self {
        self.batch_frames = frames;
        self
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn with_total_frames(mut self, total: u64) -> Self {
        self.total_frames = Some(total);
        self
    }

    pub fn with_close_when_done(mut self) -> Self {
        self.close_when_done = true;
        self
    }

    pub fn validate(&self) -> Result<(), TrafficError> {
        if self.frame_payload_len + FRAME_OVERHEAD > MAX_DATAGRAM_SIZE {
            return Err(TrafficError::FramePayloadTooLarge(self.frame_payload_len));
        }
        if self.batch_frames == 0 || self.batch_frames > MAX_BATCH_DATAGRAMS {
            return Err(TrafficError::BatchTooLarge(self.batch_frames));
        }
        if self.pace < Duration::from_millis(1) {
            return Err(TrafficError::IntervalTooShort("pace"));
        }
        if self.hello_retry < Duration::from_millis(1) {
            return Err(TrafficError::IntervalTooShort("hello_retry"));
        }
        if self.ack_stride == 0 {
            return Err(TrafficError::ZeroAckStride);
        }
        Ok(())
    }

    /// Bytes one data frame occupies on the wire.
    pub fn frame_wire_len(&self) -> usize {
        self.frame_payload_len + FRAME_OVERHEAD
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        TrafficConfig {
            frame_payload_len: 1200,
            batch_frames: 10,
            pace: Duration::from_millis(10),
            hello_retry: Duration::from_millis(200),
            ack_stride: 16,
            total_frames: None,
            close_when_done: false,
        }
    }
}

/// Client-side counters, shared with the harness and tests.
#[derive(Debug, Default)]
pub struct ClientStats {
    pub frames_sent: u64,
    pub hello_retransmits: u64,
    /// Highest data sequence the server has acknowledged.
    pub highest_ack: Option<u64>,
    pub released: bool,
}

pub type ClientStatsHandle = Rc<RefCell<ClientStats>>;

/// Server-side counters and latency samples, shared with the harness and
/// tests.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connection_id: Option<ConnectionId>,
    pub frames_received: u64,
    pub out_of_order: u64,
    pub acks_sent: u64,
    /// One-way delivery latency of each data frame, in engine milliseconds.
    pub latencies_millis: Vec<u64>,
}

pub type ServerStatsHandle = Rc<RefCell<ServerStats>>;

/// One side of the test protocol: decodes frames and, on the listening
/// side, accepts a connection from a hello frame.
pub struct TestEngine {
    clock: SimClock,
    config: TrafficConfig,
    /// Present on the listening side; accepted connections report here.
    server_stats: Option<ServerStatsHandle>,
}

impl TestEngine {
    /// An engine for the connecting side. Its `accept` always declines.
    pub fn client(clock: SimClock, config: TrafficConfig) -> Self {
        TestEngine {
            clock,
            config,
            server_stats: None,
        }
    }

    /// An engine for the listening side, plus the stats handle its
    /// accepted connection reports into.
    pub fn server(clock: SimClock, config: TrafficConfig) -> (Self, ServerStatsHandle) {
        let stats = ServerStatsHandle::default();
        (
            TestEngine {
                clock,
                config,
                server_stats: Some(stats.clone()),
            },
            stats,
        )
    }

    /// Establish a client connection to `peer`, in the role a real engine's
    /// connect call plays. The returned stats handle stays valid after the
    /// connection moves into an endpoint.
    pub fn connect(
        &self,
        local: SocketAddr,
        peer: SocketAddr,
        seed: u64,
    ) -> (TestConnection, ClientStatsHandle) {
        let stats = ClientStatsHandle::default();
        let now_millis = self.clock.now().as_engine_millis();
        let half = ClientHalf {
            clock: self.clock.clone(),
            config: self.config.clone(),
            peer,
            local,
            state: ClientState::Handshaking {
                next_retry_millis: now_millis,
            },
            next_seq: 1,
            next_send_millis: now_millis,
            hello_sent: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats: stats.clone(),
        };
        (TestConnection::Client(half), stats)
    }
}

impl TransportEngine for TestEngine {
    type Datagram = Frame;
    type Connection = TestConnection;

    fn decode(&mut self, buf: &[u8], offset: &mut usize) -> Option<Frame> {
        Frame::decode(buf, offset)
    }

    fn accept(
        &mut self,
        datagram: Frame,
        dest: SocketAddr,
        src: SocketAddr,
        id: ConnectionId,
    ) -> Option<TestConnection> {
        let stats = self.server_stats.as_ref()?;
        if datagram.kind != FrameKind::Hello {
            return None;
        }

        stats.borrow_mut().connection_id = Some(id);
        let now_millis = self.clock.now().as_engine_millis();
        Some(TestConnection::Server(ServerHalf {
            clock: self.clock.clone(),
            config: self.config.clone(),
            peer: src,
            local: dest,
            stats: stats.clone(),
            pending_acks: vec![0], // acknowledge the hello
            ack_due_millis: Some(now_millis),
            last_seq: 0,
        }))
    }
}

#[derive(Clone, Copy)]
enum ClientState {
    /// Retransmitting the hello until the server acknowledges it.
    Handshaking { next_retry_millis: u64 },

    /// Emitting paced data batches.
    Streaming,

    /// Every frame sent. `release_at_millis` is set when the connection
    /// should additionally be released.
    Drained { release_at_millis: Option<u64> },
}

/// Client side: handshake, then paced data batches.
pub struct ClientHalf {
    clock: SimClock,
    config: TrafficConfig,
    peer: SocketAddr,
    local: SocketAddr,
    state: ClientState,
    /// Next data sequence number; the hello is seq 0.
    next_seq: u64,
    next_send_millis: u64,
    hello_sent: bool,
    rng: ChaCha8Rng,
    stats: ClientStatsHandle,
}

impl ClientHalf {
    fn frames_left(&self) -> u64 {
        match self.config.total_frames {
            Some(total) => total.saturating_sub(self.next_seq - 1),
            None => u64::MAX,
        }
    }

    fn data_frame(&mut self, now_millis: u64) -> Frame {
        let mut payload = vec![0u8; self.config.frame_payload_len];
        self.rng.fill_bytes(&mut payload);
        let frame = Frame::new(FrameKind::Data, self.next_seq, now_millis, payload);
        self.next_seq += 1;
        frame
    }
}

/// Server side: ordering checks, latency samples, strided acks.
pub struct ServerHalf {
    clock: SimClock,
    config: TrafficConfig,
    peer: SocketAddr,
    local: SocketAddr,
    stats: ServerStatsHandle,
    /// Sequence numbers awaiting acknowledgment frames.
    pending_acks: Vec<u64>,
    /// Set while `pending_acks` is non-empty.
    ack_due_millis: Option<u64>,
    last_seq: u64,
}

/// A connection of the test protocol, client or server side.
pub enum TestConnection {
    Client(ClientHalf),
    Server(ServerHalf),
}

impl TestConnection {
    /// Data frames sent so far (client side).
    pub fn frames_sent(&self) -> u64 {
        match self {
            TestConnection::Client(half) => half.next_seq - 1,
            TestConnection::Server(_) => 0,
        }
    }

    pub fn is_established(&self) -> bool {
        match self {
            TestConnection::Client(half) => !matches!(half.state, ClientState::Handshaking { .. }),
            TestConnection::Server(_) => true,
        }
    }
}

impl TransportConnection for TestConnection {
    type Datagram = Frame;

    fn receive(&mut self, _dest: SocketAddr, _src: SocketAddr, datagram: Frame) {
        match self {
            TestConnection::Client(half) => half.receive(datagram),
            TestConnection::Server(half) => half.receive(datagram),
        }
    }

    fn next_timeout_millis(&self) -> Option<u64> {
        match self {
            TestConnection::Client(half) => match &half.state {
                ClientState::Handshaking { next_retry_millis } => Some(*next_retry_millis),
                ClientState::Streaming => Some(half.next_send_millis),
                ClientState::Drained { release_at_millis } => *release_at_millis,
            },
            TestConnection::Server(half) => half.ack_due_millis,
        }
    }

    fn send(&mut self, batch: &mut DatagramBatch) -> SendOutcome {
        match self {
            TestConnection::Client(half) => half.send(batch),
            TestConnection::Server(half) => half.send(batch),
        }
    }
}

impl ClientHalf {
    fn receive(&mut self, datagram: Frame) {
        if datagram.kind != FrameKind::Ack {
            return;
        }
        if datagram.seq == 0 {
            if let ClientState::Handshaking { .. } = self.state {
                debug!(peer = %self.peer, "handshake acknowledged, streaming");
                self.state = ClientState::Streaming;
                self.next_send_millis = self.clock.now().as_engine_millis();
            }
        } else {
            let mut stats = self.stats.borrow_mut();
            stats.highest_ack = Some(stats.highest_ack.map_or(datagram.seq, |a| a.max(datagram.seq)));
        }
    }

    fn send(&mut self, batch: &mut DatagramBatch) -> SendOutcome {
        let now_millis = self.clock.now().as_engine_millis();
        match self.state {
            ClientState::Handshaking { next_retry_millis } => {
                if now_millis < next_retry_millis {
                    return SendOutcome::Continue;
                }
                batch.set_path(self.peer, self.local);
                let hello = Frame::new(FrameKind::Hello, 0, now_millis, Vec::new());
                batch.push(hello.encode()).expect("within batch limits");
                if self.hello_sent {
                    self.stats.borrow_mut().hello_retransmits += 1;
                }
                self.hello_sent = true;
                self.state = ClientState::Handshaking {
                    next_retry_millis: now_millis + self.config.hello_retry.as_millis() as u64,
                };
                SendOutcome::Continue
            }
            ClientState::Streaming => {
                if now_millis < self.next_send_millis {
                    return SendOutcome::Continue;
                }
                batch.set_path(self.peer, self.local);
                let count = (self.config.batch_frames.min(batch.remaining()) as u64)
                    .min(self.frames_left());
                for _ in 0..count {
                    let frame = self.data_frame(now_millis);
                    batch.push(frame.encode()).expect("within batch limits");
                }
                self.stats.borrow_mut().frames_sent += count;

                if self.frames_left() == 0 {
                    let release_at_millis = self.config.close_when_done.then_some(now_millis);
                    self.state = ClientState::Drained { release_at_millis };
                } else {
                    self.next_send_millis = now_millis + self.config.pace.as_millis() as u64;
                }
                SendOutcome::Continue
            }
            ClientState::Drained { release_at_millis } => {
                if release_at_millis.is_some() {
                    self.stats.borrow_mut().released = true;
                    return SendOutcome::Release;
                }
                SendOutcome::Continue
            }
        }
    }
}

impl ServerHalf {
    fn receive(&mut self, datagram: Frame) {
        match datagram.kind {
            FrameKind::Hello => {
                // The hello ack was lost or is still in flight; answer again.
                if !self.pending_acks.contains(&0) {
                    self.pending_acks.push(0);
                    self.ack_due_millis
                        .get_or_insert(self.clock.now().as_engine_millis());
                }
            }
            FrameKind::Data => {
                let now_millis = self.clock.now().as_engine_millis();
                let mut stats = self.stats.borrow_mut();
                stats.frames_received += 1;
                stats
                    .latencies_millis
                    .push(now_millis.saturating_sub(datagram.sent_at_millis));
                if datagram.seq != self.last_seq + 1 {
                    stats.out_of_order += 1;
                }
                self.last_seq = self.last_seq.max(datagram.seq);

                if stats.frames_received % self.config.ack_stride == 0 {
                    self.pending_acks.push(datagram.seq);
                    self.ack_due_millis.get_or_insert(now_millis);
                }
            }
            FrameKind::Ack => {}
        }
    }

    fn send(&mut self, batch: &mut DatagramBatch) -> SendOutcome {
        if self.pending_acks.is_empty() {
            return SendOutcome::Continue;
        }
        let now_millis = self.clock.now().as_engine_millis();
        batch.set_path(self.peer, self.local);

        let count = self.pending_acks.len().min(batch.remaining());
        for seq in self.pending_acks.drain(..count) {
            let ack = Frame::new(FrameKind::Ack, seq, now_millis, Vec::new());
            batch.push(ack.encode()).expect("within batch limits");
        }
        self.stats.borrow_mut().acks_sent += count as u64;

        self.ack_due_millis = if self.pending_acks.is_empty() {
            None
        } else {
            Some(now_millis)
        };
        SendOutcome::Continue
    }
}
