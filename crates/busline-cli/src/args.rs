//! Command-line arguments.

use busline_core::{
    ConfigError, SimulationConfig,
    config::{DEFAULT_ATTEMPTS_PER_DEVICE, DEFAULT_DEVICE_COUNT},
};
use clap::Parser;

/// Simulate devices contending for a single shared bus.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "busline", version, about)]
pub struct Args {
    /// Number of concurrent devices
    #[arg(short, long, default_value_t = DEFAULT_DEVICE_COUNT)]
    pub devices: u32,

    /// Bus access attempts per device
    #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS_PER_DEVICE)]
    pub attempts: u32,

    /// Minimum bus hold, in seconds
    #[arg(long, default_value_t = 0.5)]
    pub hold_min: f64,

    /// Maximum bus hold, in seconds
    #[arg(long, default_value_t = 1.5)]
    pub hold_max: f64,

    /// Upper bound of the random delay before each attempt, in seconds
    #[arg(long, default_value_t = 0.3)]
    pub jitter_max: f64,

    /// RNG seed; a random one is chosen and logged when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter, overridden by `RUST_LOG`
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validated simulation configuration.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] the arguments produce.
    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        SimulationConfig::from_secs(self.devices, self.attempts, self.hold_min, self.hold_max)?
            .with_jitter_secs(self.jitter_max)
    }
}
