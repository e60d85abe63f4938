//! Error types for the busline simulation.

use std::time::Duration;

use thiserror::Error;

/// Invalid simulation parameters.
///
/// Raised by [`SimulationConfig::validate`](crate::SimulationConfig::validate)
/// before any device is spawned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `device_count` was zero.
    #[error("device count must be at least 1")]
    NoDevices,

    /// `attempts_per_device` was zero.
    #[error("attempts per device must be at least 1")]
    NoAttempts,

    /// A seconds value was negative, NaN or too large for a duration.
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidSeconds {
        /// Name of the offending parameter.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// `hold_max` was smaller than `hold_min`.
    #[error("hold_max ({max:?}) must not be smaller than hold_min ({min:?})")]
    HoldRangeInverted {
        /// Configured minimum hold.
        min: Duration,
        /// Configured maximum hold.
        max: Duration,
    },
}

/// Arbiter misuse.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterError {
    /// `release` was called with no outstanding acquisition.
    #[error("release without a matching successful try_acquire")]
    NotHeld,
}

/// Failures of a simulation run.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// The configuration was rejected before any device started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A device task did not run to completion.
    #[error("device task failed: {0}")]
    DeviceTask(#[from] tokio::task::JoinError),
}
