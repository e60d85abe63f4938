//! Everything observed during one scenario run.

use busline_core::{DeviceId, Event, Phase, SimulationConfig, SimulationReport};

/// Observations collected while a scenario ran.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Scenario name, for error messages
    pub name: String,
    /// Configuration the scenario asked for
    pub config: SimulationConfig,
    /// Events in the order the sink received them
    pub events: Vec<Event>,
    /// Report, or the rendered error if the run did not complete
    pub result: Result<SimulationReport, String>,
    /// Arbiter `available()` values sampled during the run
    pub arbiter_samples: Vec<usize>,
    /// Bus `occupancy()` values sampled alongside `arbiter_samples`
    pub bus_samples: Vec<usize>,
}

impl Outcome {
    /// Number of events with `phase`.
    pub fn count(&self, phase: Phase) -> usize {
        self.events.iter().filter(|e| e.phase == phase).count()
    }

    /// Events emitted by `device`, in order.
    pub fn device_events(&self, device: DeviceId) -> Vec<&Event> {
        self.events.iter().filter(|e| e.device == Some(device)).collect()
    }

    /// Phases of one attempt, in order.
    pub fn attempt_phases(&self, device: DeviceId, attempt: u32) -> Vec<Phase> {
        self.events
            .iter()
            .filter(|e| e.device == Some(device) && e.attempt == Some(attempt))
            .map(|e| e.phase)
            .collect()
    }

    /// The report, or an error naming the scenario.
    pub fn report(&self) -> Result<&SimulationReport, String> {
        self.result
            .as_ref()
            .map_err(|e| format!("Scenario '{}': run did not complete: {e}", self.name))
    }
}
