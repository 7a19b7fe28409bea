//! Length-prefixed wire format for the test transport engine.
//!
//! Several frames may share one packet. Each frame is a `u16` big-endian
//! body length followed by the body:
//!
//! ```text
//! | len: u16 | kind: u8 | seq: u64 | sent_at_millis: u64 | payload ... |
//! ```
//!
//! Decoding stops (returning `None`, offset untouched) at the first
//! truncated or malformed frame, which is exactly the silent-truncation
//! behavior the endpoint expects from an engine decoder.

/// Bytes in a frame body before the payload: kind + seq + timestamp.
pub const FRAME_HEADER_LEN: usize = 1 + 8 + 8;

/// Bytes a frame adds on the wire beyond its payload.
pub const FRAME_OVERHEAD: usize = 2 + FRAME_HEADER_LEN;

/// Frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Connection attempt; retransmitted until acknowledged.
    Hello,

    /// Acknowledgment of a hello (seq 0) or of data received so far.
    Ack,

    /// One stream segment.
    Data,
}

impl FrameKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FrameKind::Hello),
            2 => Some(FrameKind::Ack),
            3 => Some(FrameKind::Data),
            _ => None,
        }
    }

    fn as_byte(self) -> u8 {
        match self {
            FrameKind::Hello => 1,
            FrameKind::Ack => 2,
            FrameKind::Data => 3,
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub seq: u64,
    /// Engine-millisecond timestamp stamped by the sender; the receiver
    /// derives one-way latency from it.
    pub sent_at_millis: u64,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(kind: FrameKind, seq: u64, sent_at_millis: u64, payload: Vec<u8>) -> Self {
        debug_assert!(payload.len() <= u16::MAX as usize - FRAME_HEADER_LEN);
        Frame {
            kind,
            seq,
            sent_at_millis,
            payload,
        }
    }

    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Append the encoded frame to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let body_len = (FRAME_HEADER_LEN + self.payload.len()) as u16;
        out.extend_from_slice(&body_len.to_be_bytes());
        out.push(self.kind.as_byte());
        out.extend_from_slice(&self.seq.to_be_bytes());
        out.extend_from_slice(&self.sent_at_millis.to_be_bytes());
        out.extend_from_slice(&self.payload);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Decode one frame from `buf` starting at `*offset`, advancing the
    /// offset past it on success. Returns `None` — with the offset
    /// untouched — when the remainder is truncated or malformed.
    pub fn decode(buf: &[u8], offset: &mut usize) -> Option<Frame> {
        let remaining = &buf[*offset..];
        if remaining.len() < 2 {
            return None;
        }
        let body_len = u16::from_be_bytes([remaining[0], remaining[1]]) as usize;
        if body_len < FRAME_HEADER_LEN || remaining.len() < 2 + body_len {
            return None;
        }

        let body = &remaining[2..2 + body_len];
        let kind = FrameKind::from_byte(body[0])?;
        let seq = u64::from_be_bytes(body[1..9].try_into().ok()?);
        let sent_at_millis = u64::from_be_bytes(body[9..17].try_into().ok()?);
        let payload = body[FRAME_HEADER_LEN..].to_vec();

        *offset += 2 + body_len;
        Some(Frame {
            kind,
            seq,
            sent_at_millis,
            payload,
        })
    }
}
