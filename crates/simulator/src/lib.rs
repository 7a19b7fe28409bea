//! Linksim harness.
//!
//! Wires two transport endpoints and one bottleneck queue into the fixed
//! client → queue → server → client topology, drives the handshake and one
//! data stream, and loops the scheduler to a simulated-time horizon.
//!
//! # Example
//!
//! ```ignore
//! use linksim_simulator::{Harness, HarnessConfig};
//! use std::time::Duration;
//!
//! let config = HarnessConfig::default().with_horizon(Duration::from_secs(5));
//! let report = Harness::new(config)?.run();
//! println!("{}", report.summary());
//! ```

mod config;
mod error;
mod metrics;
mod runner;

pub use config::HarnessConfig;
pub use error::SetupError;
pub use metrics::SimulationReport;
pub use runner::Harness;
