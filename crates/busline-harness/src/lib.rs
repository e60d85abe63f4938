//! Deterministic simulation harness for busline.
//!
//! Runs whole simulations under turmoil's virtual clock with a seeded RNG, so
//! a scenario that takes seconds of simulated bus time finishes instantly
//! and replays identically for the same seed.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod scenario;
pub mod sim_env;

pub use scenario::{Outcome, RunnableScenario, Scenario, oracle};
pub use sim_env::SimEnv;
