//! Link configuration.

use crate::ConfigError;
use std::time::Duration;

/// Configuration for a bottleneck link.
///
/// Capacity is expressed as a time depth — how many seconds of traffic at
/// full bandwidth the queue may hold — and converted to bytes at
/// construction.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Fixed propagation delay each packet incurs before it may leave.
    pub prop_delay: Duration,

    /// Link bandwidth in bytes per second. Must be positive and finite.
    pub bandwidth_bytes_per_sec: f64,

    /// Queue capacity in seconds of bandwidth.
    pub queue_depth: Duration,
}

impl LinkConfig {
    pub fn with_prop_delay(mut self, delay: Duration) -> Self {
        self.prop_delay = delay;
        self
    }

    pub fn with_bandwidth(mut self, bytes_per_sec: f64) -> Self {
        self.bandwidth_bytes_per_sec = bytes_per_sec;
        self
    }

    pub fn with_queue_depth(mut self, depth: Duration) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Validate the configuration. A zero bandwidth would divide by zero in
    /// the emission-time formula, so it is rejected here rather than
    /// surfacing as NaN timestamps mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bandwidth_bytes_per_sec.is_finite() || self.bandwidth_bytes_per_sec <= 0.0 {
            return Err(ConfigError::InvalidBandwidth(self.bandwidth_bytes_per_sec));
        }
        Ok(())
    }

    /// Byte capacity of the queue: bandwidth times depth, truncated.
    pub fn capacity_bytes(&self) -> usize {
        (self.bandwidth_bytes_per_sec * self.queue_depth.as_secs_f64()) as usize
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            prop_delay: Duration::from_millis(100),
            bandwidth_bytes_per_sec: 1e6,
            queue_depth: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity() {
        let config = LinkConfig::default();
        config.validate().unwrap();
        assert_eq!(config.capacity_bytes(), 100_000);
    }

    #[test]
    fn rejects_bad_bandwidth() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = LinkConfig::default().with_bandwidth(bad);
            assert!(config.validate().is_err(), "bandwidth {bad} accepted");
        }
    }

    #[test]
    fn zero_depth_means_zero_capacity() {
        let config = LinkConfig::default().with_queue_depth(Duration::ZERO);
        config.validate().unwrap();
        assert_eq!(config.capacity_bytes(), 0);
    }
}
