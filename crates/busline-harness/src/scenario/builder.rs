//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use busline_core::{MemorySink, Simulation, SimulationConfig, SimulationReport};

use crate::{
    SimEnv,
    scenario::{OracleFn, Outcome},
};

/// How often the arbiter's counter is sampled while devices run.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Virtual time granted on top of the slowest possible device.
const SIMULATION_SLACK: Duration = Duration::from_secs(10);

/// Scenario builder.
///
/// Starts from [`SimulationConfig::default`] with seed 0. Must call
/// `.oracle()` to get a [`RunnableScenario`] that can be executed.
#[must_use = "a scenario does nothing until it has an oracle and is run"]
pub struct Scenario {
    name: String,
    config: SimulationConfig,
    seed: u64,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), config: SimulationConfig::default(), seed: 0 }
    }

    /// Number of devices.
    pub fn devices(mut self, count: u32) -> Self {
        self.config.device_count = count;
        self
    }

    /// Attempts per device.
    pub fn attempts(mut self, count: u32) -> Self {
        self.config.attempts_per_device = count;
        self
    }

    /// Hold duration bounds. Not validated until the scenario runs.
    pub fn hold(mut self, min: Duration, max: Duration) -> Self {
        self.config.hold_min = min;
        self.config.hold_max = max;
        self
    }

    /// Upper bound of the pre-attempt jitter.
    pub fn jitter(mut self, max: Duration) -> Self {
        self.config.jitter_max = max;
        self
    }

    /// RNG seed for both the environment and turmoil.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario, then run the oracle on what was observed.
    ///
    /// An invalid configuration is not an error here: the oracle sees an
    /// outcome whose `result` holds the rejection and decides whether that
    /// was expected.
    pub fn run(self) -> Result<(), String> {
        let outcome = self.scenario.execute()?;
        (self.oracle)(&outcome)
    }
}

/// What the orchestrator client hands back: the run's result plus
/// arbiter and bus samples.
type Observed = (Result<SimulationReport, String>, Vec<usize>, Vec<usize>);

impl Scenario {
    fn execute(self) -> Result<Outcome, String> {
        let Self { name, config, seed } = self;
        let sink = Arc::new(MemorySink::new());

        let simulation = match Simulation::new(config.clone(), SimEnv::with_seed(seed), sink.clone())
        {
            Ok(simulation) => simulation,
            Err(err) => {
                tracing::debug!(scenario = %name, %err, "configuration rejected");
                return Ok(Outcome {
                    name,
                    config,
                    events: sink.events(),
                    result: Err(err.to_string()),
                    arbiter_samples: Vec::new(),
                    bus_samples: Vec::new(),
                });
            },
        };

        let budget = simulation
            .config()
            .worst_case_runtime()
            .saturating_mul(2)
            .saturating_add(SIMULATION_SLACK);
        let mut sim = turmoil::Builder::new().simulation_duration(budget).rng_seed(seed).build();

        let observed: Arc<Mutex<Option<Observed>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&observed);

        sim.client("orchestrator", async move {
            let arbiter = simulation.arbiter();
            let bus = simulation.bus();
            let finished = Arc::new(AtomicBool::new(false));

            let sampler = {
                let finished = Arc::clone(&finished);
                tokio::spawn(async move {
                    let mut permits = Vec::new();
                    let mut occupancy = Vec::new();
                    while !finished.load(Ordering::Acquire) {
                        permits.push(arbiter.available());
                        occupancy.push(bus.occupancy());
                        tokio::time::sleep(SAMPLE_INTERVAL).await;
                    }
                    (permits, occupancy)
                })
            };

            let result = simulation.run().await.map_err(|err| err.to_string());
            finished.store(true, Ordering::Release);
            let (permits, occupancy) = sampler.await?;

            *slot.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((result, permits, occupancy));
            Ok(())
        });

        sim.run().map_err(|e| format!("Scenario '{name}': simulation failed: {e}"))?;

        let (result, arbiter_samples, bus_samples) = observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| format!("Scenario '{name}': orchestrator produced no outcome"))?;

        Ok(Outcome { name, config, events: sink.events(), result, arbiter_samples, bus_samples })
    }
}
