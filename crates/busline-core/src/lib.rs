//! Busline simulation core
//!
//! Simulates contention for a single shared bus among concurrent devices.
//! Each device repeatedly tries to take the bus through a non-blocking
//! binary lock. When the lock is busy the device enters the bus anyway
//! ("forced entry"), which makes the cost of skipping arbitration visible as
//! overlapping bus usage.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  Simulation  │  validates config, spawns, joins
//!                 └──────┬───────┘
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!     ┌─────────┐   ┌─────────┐   ┌─────────┐
//!     │device-1 │   │device-2 │   │device-N │   one tokio task each
//!     └────┬────┘   └────┬────┘   └────┬────┘
//!          │ try_acquire / release     │
//!          ▼             ▼             ▼
//!     ┌────────────────────────────────────┐
//!     │       BusArbiter (capacity 1)      │
//!     └────────────────────────────────────┘
//!          │ phase events
//!          ▼
//!     Logger ──► EventSink (tracing, memory, tee)
//! ```
//!
//! Time and randomness come from an [`Environment`] so the same code runs
//! against the wall clock in the binary and against virtual time in the
//! simulation harness.
//!
//! # Components
//!
//! - [`arbiter`]: the binary lock guarding the bus
//! - [`bus`]: observation-only occupancy and collision tracking
//! - [`device`]: the per-device attempt loop
//! - [`simulation`]: orchestration of all devices
//! - [`event`]: phase events and sinks
//! - [`mod@env`]: environment abstraction (time, sleep, RNG)
//! - [`config`]: simulation parameters and validation
//! - [`error`]: error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod arbiter;
pub mod bus;
pub mod config;
pub mod device;
pub mod env;
pub mod error;
pub mod event;
pub mod log;
pub mod simulation;

#[cfg(test)]
mod testing;

pub use arbiter::{ArbiterStats, BusArbiter};
pub use bus::{Bus, BusStats};
pub use config::SimulationConfig;
pub use device::{Attempt, AttemptOutcome, Device, DeviceId, DeviceSummary};
pub use env::{EnvRng, Environment, uniform_duration};
pub use error::{ArbiterError, ConfigError, SimulationError};
pub use event::{Event, EventSink, MemorySink, Phase, Tee, TracingSink};
pub use log::Logger;
pub use simulation::{Simulation, SimulationReport};
