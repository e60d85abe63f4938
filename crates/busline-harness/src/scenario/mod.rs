//! Scenario testing with mandatory oracles.
//!
//! A scenario describes a simulation run (devices, attempts, timing, seed)
//! and must be given an oracle before it can run. The oracle receives the
//! full [`Outcome`]: every event in arrival order, the report, and periodic
//! samples of the arbiter's counter.
//!
//! ```text
//! Scenario::new(..).devices(..).attempts(..)
//!        │
//!        ▼ .oracle(..)
//! RunnableScenario ── run() ──► turmoil sim ──► Outcome ──► oracle
//! ```

mod builder;
pub mod oracle;
mod outcome;

pub use builder::{RunnableScenario, Scenario};
pub use outcome::Outcome;

/// Verification run against a finished scenario.
pub type OracleFn = Box<dyn Fn(&Outcome) -> Result<(), String>>;
