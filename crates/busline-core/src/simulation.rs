//! Orchestration of a full run.
//!
//! [`Simulation`] validates the configuration, builds the one arbiter every
//! device shares, spawns a tokio task per device and waits for all of them
//! before logging the completion marker.
//!
//! ```text
//! Simulation::new(config) ── validate ──► Err(ConfigError)   (nothing spawned)
//!        │
//!        ▼
//! Simulation::run()
//!   ├─► spawn device-1 .. device-N   (JoinSet, one task each)
//!   ├─► join all                      (a failed join aborts the rest)
//!   ├─► log the run summary
//!   ├─► log SimulationDone            (always the last line)
//!   └─► SimulationReport
//! ```

use std::{fmt, sync::Arc, time::Duration};

use tokio::task::JoinSet;
use tracing::Instrument;

use crate::{
    arbiter::{ArbiterStats, BusArbiter},
    bus::{Bus, BusStats},
    config::SimulationConfig,
    device::{Device, DeviceId, DeviceSummary},
    env::Environment,
    error::{ConfigError, SimulationError},
    event::EventSink,
    log::Logger,
};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Per-device tallies, ordered by id
    pub devices: Vec<DeviceSummary>,
    /// Arbiter usage counters
    pub arbiter: ArbiterStats,
    /// Bus occupancy figures
    pub bus: BusStats,
    /// Simulated time from start to completion marker
    pub elapsed: Duration,
}

impl SimulationReport {
    /// Attempts made across all devices.
    pub fn attempts(&self) -> u64 {
        self.granted() + self.forced()
    }

    /// Attempts that held the permit.
    pub fn granted(&self) -> u64 {
        self.devices.iter().map(|d| u64::from(d.granted)).sum()
    }

    /// Attempts that entered without the permit.
    pub fn forced(&self) -> u64 {
        self.devices.iter().map(|d| u64::from(d.forced)).sum()
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} devices, {} attempts: {} granted, {} forced, {} collisions, peak occupancy {} in {:.3}s",
            self.devices.len(),
            self.attempts(),
            self.granted(),
            self.forced(),
            self.bus.collisions,
            self.bus.peak_occupancy,
            self.elapsed.as_secs_f64(),
        )
    }
}

/// A configured, not yet started, simulation.
pub struct Simulation<E: Environment> {
    config: SimulationConfig,
    env: E,
    sink: Arc<dyn EventSink>,
    arbiter: Arc<BusArbiter>,
    bus: Arc<Bus>,
}

impl<E: Environment> Simulation<E> {
    /// Validate `config` and build the shared arbiter.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; no device has been created.
    pub fn new(
        config: SimulationConfig,
        env: E,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            env,
            sink,
            arbiter: Arc::new(BusArbiter::new()),
            bus: Arc::new(Bus::new()),
        })
    }

    /// Validated configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Handle to the shared arbiter, for sampling while the run is live.
    pub fn arbiter(&self) -> Arc<BusArbiter> {
        Arc::clone(&self.arbiter)
    }

    /// Handle to the bus occupancy monitor.
    pub fn bus(&self) -> Arc<Bus> {
        Arc::clone(&self.bus)
    }

    /// Run every device to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::DeviceTask`] if a device task panicked or
    /// was cancelled by the runtime. Remaining devices are aborted.
    pub async fn run(self) -> Result<SimulationReport, SimulationError> {
        let log = Logger::new(self.env.clone(), self.sink);
        let mut devices = JoinSet::new();

        tracing::debug!(
            devices = self.config.device_count,
            attempts = self.config.attempts_per_device,
            "starting simulation"
        );

        for id in 1..=self.config.device_count {
            let device = Device::new(DeviceId::new(id), &self.config);
            let span = tracing::info_span!("device", id);
            let task = device.run(
                self.env.clone(),
                Arc::clone(&self.arbiter),
                Arc::clone(&self.bus),
                log.clone(),
            );
            devices.spawn(task.instrument(span));
        }

        let mut summaries = Vec::with_capacity(self.config.device_count as usize);
        while let Some(joined) = devices.join_next().await {
            summaries.push(joined?);
        }
        summaries.sort_by_key(|s| s.id);

        let report = SimulationReport {
            devices: summaries,
            arbiter: self.arbiter.stats(),
            bus: self.bus.stats(),
            elapsed: log.elapsed(),
        };

        // Summaries go out before the completion marker, which stays the
        // last line of the run.
        for device in &report.devices {
            tracing::debug!(
                device = device.id.get(),
                granted = device.granted,
                forced = device.forced,
                "device summary"
            );
        }
        tracing::info!(
            granted = report.granted(),
            forced = report.forced(),
            collisions = report.bus.collisions,
            "{report}"
        );

        log.simulation_done();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{MemorySink, Phase},
        testing::TestEnv,
    };

    fn fast(device_count: u32, attempts_per_device: u32) -> SimulationConfig {
        SimulationConfig {
            device_count,
            attempts_per_device,
            hold_min: Duration::from_millis(10),
            hold_max: Duration::from_millis(10),
            jitter_max: Duration::from_millis(5),
        }
    }

    fn count(sink: &MemorySink, phase: Phase) -> usize {
        sink.events().iter().filter(|e| e.phase == phase).count()
    }

    #[tokio::test(start_paused = true)]
    async fn single_device_single_attempt() {
        let sink = Arc::new(MemorySink::new());
        let sim = Simulation::new(fast(1, 1), TestEnv::with_seed(1), sink.clone()).unwrap();

        let report = sim.run().await.unwrap();

        let phases: Vec<_> = sink.events().iter().map(|e| e.phase).collect();
        assert_eq!(
            phases,
            [
                Phase::Requesting,
                Phase::Granted,
                Phase::Releasing,
                Phase::DeviceDone,
                Phase::SimulationDone
            ]
        );
        assert_eq!(report.granted(), 1);
        assert_eq!(report.forced(), 0);
        assert_eq!(report.arbiter.releases, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn two_devices_five_attempts() {
        let sink = Arc::new(MemorySink::new());
        let sim = Simulation::new(fast(2, 5), TestEnv::with_seed(9), sink.clone()).unwrap();
        let arbiter = sim.arbiter();

        let report = sim.run().await.unwrap();

        assert_eq!(count(&sink, Phase::Requesting), 10);
        assert_eq!(count(&sink, Phase::Granted) + count(&sink, Phase::Forced), 10);
        assert_eq!(report.attempts(), 10);
        assert_eq!(report.arbiter.grants, report.granted());
        assert_eq!(report.arbiter.denials, report.forced());
        assert_eq!(report.arbiter.releases, report.arbiter.grants);
        assert_eq!(report.arbiter.peak_outstanding, 1);
        assert_eq!(arbiter.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn handles_outlive_the_run() {
        let config = fast(3, 2);
        let sim = Simulation::new(config.clone(), TestEnv::with_seed(4), Arc::new(MemorySink::new()))
            .unwrap();
        assert_eq!(sim.config(), &config);

        let bus = sim.bus();
        let report = sim.run().await.unwrap();

        assert_eq!(bus.occupancy(), 0);
        assert_eq!(bus.stats(), report.bus);
        assert_eq!(bus.stats().entries, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_marker_follows_every_device() {
        let sink = Arc::new(MemorySink::new());
        let sim = Simulation::new(fast(4, 2), TestEnv::with_seed(5), sink.clone()).unwrap();

        let report = sim.run().await.unwrap();

        let events = sink.events();
        let last = events.last().unwrap();
        assert_eq!(last.phase, Phase::SimulationDone);
        assert_eq!(count(&sink, Phase::SimulationDone), 1);
        assert_eq!(count(&sink, Phase::DeviceDone), 4);

        let ids: Vec<_> = report.devices.iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
        assert_eq!(report.elapsed, last.at);
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_devices_collide() {
        // No jitter and equal holds: every device requests at t=0, so all but
        // one are forced onto a busy bus.
        let config = SimulationConfig { jitter_max: Duration::ZERO, ..fast(3, 1) };
        let sink = Arc::new(MemorySink::new());
        let sim = Simulation::new(config, TestEnv::with_seed(0), sink).unwrap();

        let report = sim.run().await.unwrap();

        assert_eq!(report.granted(), 1);
        assert_eq!(report.forced(), 2);
        assert_eq!(report.bus.collisions, 2);
        assert_eq!(report.bus.peak_occupancy, 3);
    }

    #[test]
    fn invalid_config_is_rejected_before_spawn() {
        let config = SimulationConfig {
            hold_min: Duration::from_millis(500),
            hold_max: Duration::from_millis(100),
            ..SimulationConfig::default()
        };
        let sink = Arc::new(MemorySink::new());

        let result = Simulation::new(config, TestEnv::with_seed(0), sink.clone());

        assert!(matches!(result, Err(ConfigError::HoldRangeInverted { .. })));
        assert!(sink.is_empty());
    }

    #[test]
    fn report_summary_line() {
        let report = SimulationReport {
            devices: vec![
                DeviceSummary { id: DeviceId::new(1), granted: 2, forced: 1 },
                DeviceSummary { id: DeviceId::new(2), granted: 1, forced: 2 },
            ],
            arbiter: ArbiterStats::default(),
            bus: BusStats { entries: 6, collisions: 3, peak_occupancy: 2 },
            elapsed: Duration::from_millis(4200),
        };

        assert_eq!(
            report.to_string(),
            "2 devices, 6 attempts: 3 granted, 3 forced, 3 collisions, peak occupancy 2 in 4.200s"
        );
    }
}
