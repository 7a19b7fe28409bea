//! Error types for simulation setup.

use thiserror::Error;

/// Errors validating a link configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Link bandwidth must be positive and finite; the emission formula
    /// divides by it.
    #[error("invalid link bandwidth: {0} bytes/sec")]
    InvalidBandwidth(f64),
}
