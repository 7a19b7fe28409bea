//! Test helpers for linksim.
//!
//! A deterministic, minimal transport engine implementing the
//! `linksim-core` transport traits, used by the harness binary and by
//! integration tests as a stand-in for a real protocol engine. The wire
//! format is a simple length-prefixed framing; behavior is a pure function
//! of the configuration, the seed, and the simulated clock.

mod engine;
mod wire;

pub use engine::{
    ClientStats, ClientStatsHandle, ServerStats, ServerStatsHandle, TestConnection, TestEngine,
    TrafficConfig, TrafficError,
};
pub use wire::{Frame, FrameKind, FRAME_HEADER_LEN, FRAME_OVERHEAD};
