//! Device actor.
//!
//! A device makes a fixed number of attempts to use the bus, one after the
//! other. Each attempt:
//!
//! ```text
//! Idle ─► Requesting ─┬─► Granted ─► Using ─► Releasing ─► AcquiredAndReleased
//!                     └─► Forced  ─► Using ─► Releasing ─► NothingToRelease
//! ```
//!
//! A refused acquisition does not stop the device. It goes onto the bus
//! without the permit and may overlap whoever holds it. That overlap is the
//! behaviour being demonstrated, so there is no retry or backoff.

use std::{fmt, sync::Arc, time::Duration};

use crate::{
    arbiter::BusArbiter,
    bus::Bus,
    config::SimulationConfig,
    env::{Environment, uniform_duration},
    event::Phase,
    log::Logger,
};

/// Device identifier, assigned from 1 in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wrap a raw id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device-{}", self.0)
    }
}

/// How an attempt got onto the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The arbiter handed out the permit.
    Granted,
    /// The permit was taken; the device went ahead without it.
    Forced,
}

impl AttemptOutcome {
    fn phase(self) -> Phase {
        match self {
            Self::Granted => Phase::Granted,
            Self::Forced => Phase::Forced,
        }
    }
}

/// Result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// Device that made the attempt
    pub device: DeviceId,
    /// Sequence number within the device, starting at 1
    pub sequence: u32,
    /// Granted or forced
    pub outcome: AttemptOutcome,
    /// How long the device stayed on the bus
    pub hold: Duration,
}

/// Per-device tally returned when the device finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Device
    pub id: DeviceId,
    /// Attempts that held the permit
    pub granted: u32,
    /// Attempts that went ahead without it
    pub forced: u32,
}

/// One simulated device.
#[derive(Debug, Clone)]
pub struct Device {
    id: DeviceId,
    attempts: u32,
    hold_min: Duration,
    hold_max: Duration,
    jitter_max: Duration,
}

impl Device {
    /// Create device `id` with the timing from `config`.
    pub fn new(id: DeviceId, config: &SimulationConfig) -> Self {
        Self {
            id,
            attempts: config.attempts_per_device,
            hold_min: config.hold_min,
            hold_max: config.hold_max,
            jitter_max: config.jitter_max,
        }
    }

    /// Device id.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Display name, derived from the id.
    pub fn name(&self) -> String {
        self.id.to_string()
    }

    /// Run every attempt in order, then log [`Phase::DeviceDone`].
    pub async fn run<E: Environment>(
        self,
        env: E,
        arbiter: Arc<BusArbiter>,
        bus: Arc<Bus>,
        log: Logger<E>,
    ) -> DeviceSummary {
        let mut summary = DeviceSummary { id: self.id, granted: 0, forced: 0 };

        for sequence in 1..=self.attempts {
            let attempt = self.attempt(sequence, &env, &arbiter, &bus, &log).await;
            match attempt.outcome {
                AttemptOutcome::Granted => summary.granted += 1,
                AttemptOutcome::Forced => summary.forced += 1,
            }
        }

        log.device_done(self.id);
        summary
    }

    /// Make one attempt: jitter, request, use the bus, release if held.
    pub async fn attempt<E: Environment>(
        &self,
        sequence: u32,
        env: &E,
        arbiter: &BusArbiter,
        bus: &Bus,
        log: &Logger<E>,
    ) -> Attempt {
        let jitter = uniform_duration(env, Duration::ZERO, self.jitter_max);
        if !jitter.is_zero() {
            env.sleep(jitter).await;
        }
        let hold = uniform_duration(env, self.hold_min, self.hold_max);

        log.attempt(self.id, sequence, Phase::Requesting);
        let outcome =
            if arbiter.try_acquire() { AttemptOutcome::Granted } else { AttemptOutcome::Forced };
        log.attempt(self.id, sequence, outcome.phase());

        bus.occupy();
        env.sleep(hold).await;
        bus.vacate();

        log.attempt(self.id, sequence, Phase::Releasing);
        let released = match outcome {
            AttemptOutcome::Granted => arbiter.release(),
            AttemptOutcome::Forced => Ok(()),
        };
        if let Err(err) = released {
            tracing::error!(device = self.id.get(), attempt = sequence, %err, "release failed");
        }

        Attempt { device: self.id, sequence, outcome, hold }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{Event, MemorySink},
        testing::TestEnv,
    };

    fn config(attempts: u32) -> SimulationConfig {
        SimulationConfig {
            device_count: 1,
            attempts_per_device: attempts,
            hold_min: Duration::from_millis(10),
            hold_max: Duration::from_millis(20),
            jitter_max: Duration::from_millis(5),
        }
    }

    fn phases(events: &[Event]) -> Vec<Phase> {
        events.iter().map(|e| e.phase).collect()
    }

    #[test]
    fn name_derives_from_id() {
        let device = Device::new(DeviceId::new(3), &config(1));
        assert_eq!(device.name(), "device-3");
        assert_eq!(device.id().get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn lone_device_is_always_granted() {
        let env = TestEnv::with_seed(1);
        let sink = Arc::new(MemorySink::new());
        let log = Logger::new(env.clone(), sink.clone());
        let arbiter = Arc::new(BusArbiter::new());
        let bus = Arc::new(Bus::new());

        let device = Device::new(DeviceId::new(1), &config(3));
        let summary = device.run(env, arbiter.clone(), bus.clone(), log).await;

        assert_eq!(summary, DeviceSummary { id: DeviceId::new(1), granted: 3, forced: 0 });
        assert_eq!(arbiter.available(), 1);
        assert_eq!(arbiter.stats().releases, 3);
        assert_eq!(bus.stats().collisions, 0);
        assert_eq!(
            phases(&sink.events()),
            [
                [Phase::Requesting, Phase::Granted, Phase::Releasing].repeat(3),
                vec![Phase::DeviceDone]
            ]
            .concat()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn held_bus_forces_every_attempt_without_release() {
        let env = TestEnv::with_seed(2);
        let sink = Arc::new(MemorySink::new());
        let log = Logger::new(env.clone(), sink.clone());
        let arbiter = Arc::new(BusArbiter::new());
        let bus = Arc::new(Bus::new());

        // Someone else holds the permit for the whole run.
        assert!(arbiter.try_acquire());

        let device = Device::new(DeviceId::new(7), &config(4));
        let summary = device.run(env, arbiter.clone(), bus, log).await;

        assert_eq!(summary.forced, 4);
        assert_eq!(summary.granted, 0);
        assert_eq!(arbiter.available(), 0);
        assert_eq!(arbiter.stats().releases, 0);
        assert_eq!(arbiter.stats().denials, 4);
        assert!(sink.events().iter().filter(|e| e.phase == Phase::Forced).count() == 4);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_holds_for_sampled_duration() {
        let env = TestEnv::with_seed(3);
        let sink = Arc::new(MemorySink::new());
        let log = Logger::new(env.clone(), sink.clone());
        let arbiter = BusArbiter::new();
        let bus = Bus::new();

        let device = Device::new(DeviceId::new(1), &config(1));
        let attempt = device.attempt(1, &env, &arbiter, &bus, &log).await;

        assert_eq!(attempt.outcome, AttemptOutcome::Granted);
        assert!(attempt.hold >= Duration::from_millis(10));
        assert!(attempt.hold <= Duration::from_millis(20));

        // The timer wheel rounds deadlines up to the next millisecond.
        let events = sink.events();
        let on_bus = events[2].at - events[1].at;
        assert!(on_bus >= attempt.hold, "{on_bus:?} < {:?}", attempt.hold);
        assert!(on_bus <= attempt.hold + Duration::from_millis(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_jitter_requests_immediately() {
        let env = TestEnv::with_seed(4);
        let sink = Arc::new(MemorySink::new());
        let log = Logger::new(env.clone(), sink.clone());
        let arbiter = BusArbiter::new();
        let bus = Bus::new();

        let synchronized = SimulationConfig { jitter_max: Duration::ZERO, ..config(1) };
        let device = Device::new(DeviceId::new(1), &synchronized);
        device.attempt(1, &env, &arbiter, &bus, &log).await;

        let events = sink.events();
        assert_eq!(events[0].phase, Phase::Requesting);
        assert_eq!(events[0].at, Duration::ZERO);
        assert_eq!(events[1].at, Duration::ZERO);
    }
}
