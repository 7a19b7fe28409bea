//! Error types for harness setup.

use linksim_simulation::ConfigError;
use linksim_test_helpers::TrafficError;
use thiserror::Error;

/// Errors building a harness.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The link configuration is invalid.
    #[error(transparent)]
    Link(#[from] ConfigError),

    /// The traffic configuration is invalid.
    #[error(transparent)]
    Traffic(#[from] TrafficError),

    /// A run needs a positive simulated-time horizon.
    #[error("simulated-time horizon must be positive")]
    ZeroHorizon,
}
