//! Configuration types for the harness.

use crate::SetupError;
use linksim_simulation::LinkConfig;
use linksim_test_helpers::TrafficConfig;
use std::time::Duration;

/// Configuration for a harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// The bottleneck link between client and server.
    pub link: LinkConfig,

    /// Traffic the client generates.
    pub traffic: TrafficConfig,

    /// Simulated-time horizon; the run loop stops once the clock reaches it.
    pub horizon: Duration,

    /// Seed for deterministic payload generation.
    pub seed: u64,
}

impl HarnessConfig {
    pub fn with_link(mut self, link: LinkConfig) -> Self {
        self.link = link;
        self
    }

    pub fn with_traffic(mut self, traffic: TrafficConfig) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        self.link.validate()?;
        self.traffic.validate()?;
        if self.horizon.is_zero() {
            return Err(SetupError::ZeroHorizon);
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            link: LinkConfig::default(),
            traffic: TrafficConfig::default(),
            horizon: Duration::from_secs(50),
            seed: 12345,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        HarnessConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_horizon() {
        let config = HarnessConfig::default().with_horizon(Duration::ZERO);
        assert!(matches!(config.validate(), Err(SetupError::ZeroHorizon)));
    }

    #[test]
    fn propagates_link_validation() {
        let config =
            HarnessConfig::default().with_link(LinkConfig::default().with_bandwidth(0.0));
        assert!(matches!(config.validate(), Err(SetupError::Link(_))));
    }
}
