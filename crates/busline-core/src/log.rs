//! Timestamping front end for event sinks.

use std::sync::Arc;

use crate::{
    device::DeviceId,
    env::Environment,
    event::{Event, EventSink, Phase},
};

/// Stamps events with the time since the simulation started and passes
/// them to the sink.
///
/// Cloned into every device task. The sink is the only shared part.
pub struct Logger<E: Environment> {
    env: E,
    start: E::Instant,
    sink: Arc<dyn EventSink>,
}

impl<E: Environment> Clone for Logger<E> {
    fn clone(&self) -> Self {
        Self { env: self.env.clone(), start: self.start, sink: Arc::clone(&self.sink) }
    }
}

impl<E: Environment> Logger<E> {
    /// Start the clock now.
    pub fn new(env: E, sink: Arc<dyn EventSink>) -> Self {
        let start = env.now();
        Self { env, start, sink }
    }

    /// Log a phase of one attempt.
    pub fn attempt(&self, device: DeviceId, attempt: u32, phase: Phase) -> Event {
        self.emit(Some(device), Some(attempt), phase)
    }

    /// Log that `device` finished all of its attempts.
    pub fn device_done(&self, device: DeviceId) -> Event {
        self.emit(Some(device), None, Phase::DeviceDone)
    }

    /// Log the final completion marker.
    pub fn simulation_done(&self) -> Event {
        self.emit(None, None, Phase::SimulationDone)
    }

    /// Time since the logger was created.
    pub fn elapsed(&self) -> std::time::Duration {
        self.env.now() - self.start
    }

    fn emit(&self, device: Option<DeviceId>, attempt: Option<u32>, phase: Phase) -> Event {
        let event = Event { at: self.elapsed(), device, attempt, phase };
        self.sink.record(&event);
        event
    }
}
