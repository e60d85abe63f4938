//! Command-line runner for busline.
//!
//! A thin shell over [`busline_core::Simulation`]: parses arguments, builds
//! a seeded [`SystemEnv`] and routes every phase event to `tracing`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod system_env;

use std::sync::Arc;

use busline_core::{
    EventSink, Simulation, SimulationConfig, SimulationError, SimulationReport, TracingSink,
};

pub use args::Args;
pub use system_env::SystemEnv;

/// Run one simulation to completion, logging through `sink`.
///
/// The run summary is logged before the completion marker, so the marker is
/// the last line a run produces.
///
/// # Errors
///
/// Propagates [`SimulationError`] from validation or a failed device task.
pub async fn run(
    config: SimulationConfig,
    seed: u64,
    sink: Arc<dyn EventSink>,
) -> Result<SimulationReport, SimulationError> {
    let simulation = Simulation::new(config, SystemEnv::with_seed(seed), sink)?;
    simulation.run().await
}

/// [`run`] with the default `tracing` sink.
///
/// # Errors
///
/// See [`run`].
pub async fn run_traced(
    config: SimulationConfig,
    seed: u64,
) -> Result<SimulationReport, SimulationError> {
    run(config, seed, Arc::new(TracingSink)).await
}
