//! Simulation parameters.

use std::time::Duration;

use crate::error::ConfigError;

/// Default number of devices.
pub const DEFAULT_DEVICE_COUNT: u32 = 5;

/// Default attempts per device.
pub const DEFAULT_ATTEMPTS_PER_DEVICE: u32 = 3;

/// Default minimum bus hold.
pub const DEFAULT_HOLD_MIN: Duration = Duration::from_millis(500);

/// Default maximum bus hold.
pub const DEFAULT_HOLD_MAX: Duration = Duration::from_millis(1500);

/// Default upper bound of the pre-attempt jitter.
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(300);

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of concurrent devices
    pub device_count: u32,
    /// Attempts each device makes
    pub attempts_per_device: u32,
    /// Minimum simulated bus hold
    pub hold_min: Duration,
    /// Maximum simulated bus hold
    pub hold_max: Duration,
    /// Upper bound of the random delay before each attempt
    pub jitter_max: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_count: DEFAULT_DEVICE_COUNT,
            attempts_per_device: DEFAULT_ATTEMPTS_PER_DEVICE,
            hold_min: DEFAULT_HOLD_MIN,
            hold_max: DEFAULT_HOLD_MAX,
            jitter_max: DEFAULT_JITTER_MAX,
        }
    }
}

impl SimulationConfig {
    /// Build a validated configuration from float-second hold bounds.
    ///
    /// Jitter keeps its default.
    pub fn from_secs(
        device_count: u32,
        attempts_per_device: u32,
        hold_min: f64,
        hold_max: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            device_count,
            attempts_per_device,
            hold_min: seconds("hold_min", hold_min)?,
            hold_max: seconds("hold_max", hold_max)?,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the jitter bound with a float-second value.
    pub fn with_jitter_secs(mut self, jitter_max: f64) -> Result<Self, ConfigError> {
        self.jitter_max = seconds("jitter_max", jitter_max)?;
        Ok(self)
    }

    /// Check the invariants the orchestrator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_count == 0 {
            return Err(ConfigError::NoDevices);
        }
        if self.attempts_per_device == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if self.hold_max < self.hold_min {
            return Err(ConfigError::HoldRangeInverted { min: self.hold_min, max: self.hold_max });
        }
        Ok(())
    }

    /// Total attempts across all devices.
    pub fn total_attempts(&self) -> u64 {
        u64::from(self.device_count) * u64::from(self.attempts_per_device)
    }

    /// Longest simulated time a single device can take.
    pub fn worst_case_runtime(&self) -> Duration {
        self.jitter_max.saturating_add(self.hold_max).saturating_mul(self.attempts_per_device)
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidSeconds { field, value })
}
