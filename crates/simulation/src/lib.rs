//! Deterministic bottleneck-link simulation.
//!
//! This crate models one rate- and capacity-bounded network hop between two
//! transport-protocol endpoints, driven by a next-event scheduler. Given
//! the same configuration and the same engine behavior, two runs produce
//! identical event sequences.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Scheduler                        │
//! │                                                      │
//! │   advance clock to min(next_run_at) over all nodes   │
//! │   run every due node, route its emitted packets      │
//! │                                                      │
//! │  ┌──────────┐    ┌─────────────────┐   ┌──────────┐  │
//! │  │ Endpoint │───▶│ BottleneckQueue │──▶│ Endpoint │  │
//! │  │ (client) │    │ delay/rate/cap  │   │ (server) │  │
//! │  └──────────┘    └─────────────────┘   └──────────┘  │
//! │       ▲                                     │        │
//! │       └─────────────────────────────────────┘        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Nodes never reference each other; packets move as owned values through
//! the scheduler, so every packet has exactly one holder at any instant.

mod config;
mod endpoint;
mod error;
mod events;
mod queue;
mod scheduler;

pub use config::LinkConfig;
pub use endpoint::Endpoint;
pub use error::ConfigError;
pub use events::{EventLog, LinkEvent, LinkEventKind};
pub use queue::BottleneckQueue;
pub use scheduler::{Scheduler, Step};
