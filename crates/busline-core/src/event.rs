//! Observable phase events and the sinks that receive them.
//!
//! Every phase transition of a device produces one [`Event`]. Events are
//! handed to an [`EventSink`] as they happen. Sinks only need to be safe for
//! concurrent appends; the relative order of lines from different devices is
//! whatever the scheduler produced.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::device::DeviceId;

/// Phase of a device's attempt, or a completion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Device is about to try the arbiter
    Requesting,
    /// Arbiter handed out the permit
    Granted,
    /// Arbiter refused; device enters the bus anyway
    Forced,
    /// Device is leaving the bus
    Releasing,
    /// Device finished all its attempts
    DeviceDone,
    /// Every device finished
    SimulationDone,
}

impl Phase {
    /// Short stable label (`snake_case`) for structured logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Requesting => "requesting",
            Self::Granted => "granted",
            Self::Forced => "forced",
            Self::Releasing => "releasing",
            Self::DeviceDone => "device_done",
            Self::SimulationDone => "simulation_done",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Requesting => "requesting bus",
            Self::Granted => "bus granted",
            Self::Forced => "bus busy, forcing entry",
            Self::Releasing => "releasing bus",
            Self::DeviceDone => "finished all attempts",
            Self::SimulationDone => "all devices finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One observable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Offset from the start of the simulation
    pub at: Duration,
    /// Emitting device (`None` for [`Phase::SimulationDone`])
    pub device: Option<DeviceId>,
    /// Attempt sequence number, starting at 1 (`None` outside attempts)
    pub attempt: Option<u32>,
    /// What happened
    pub phase: Phase,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8.3}s] ", self.at.as_secs_f64())?;
        match (self.device, self.attempt) {
            (Some(device), Some(attempt)) => write!(f, "{device} attempt {attempt}: ")?,
            (Some(device), None) => write!(f, "{device}: ")?,
            (None, _) => f.write_str("simulation: ")?,
        }
        f.write_str(self.phase.describe())
    }
}

/// Receiver of phase events.
pub trait EventSink: Send + Sync {
    /// Record one event. Called concurrently from every device task.
    fn record(&self, event: &Event);
}

/// Emits every event as a `tracing` event.
///
/// Forced entries are logged at `WARN`, everything else at `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &Event) {
        let device = event.device.map(DeviceId::get);
        let elapsed_ms = u64::try_from(event.at.as_millis()).unwrap_or(u64::MAX);
        let phase = event.phase.as_label();

        if event.phase == Phase::Forced {
            tracing::warn!(device, attempt = event.attempt, phase, elapsed_ms, "{event}");
        } else {
            tracing::info!(device, attempt = event.attempt, phase, elapsed_ms, "{event}");
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &Event) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(*event);
    }
}

/// Fans each event out to several sinks.
#[derive(Default, Clone)]
pub struct Tee {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Tee {
    /// Create a fan-out over `sinks`.
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for Tee {
    fn record(&self, event: &Event) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
