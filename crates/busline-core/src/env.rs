//! Environment abstraction for time and randomness.
//!
//! Device timing depends on two external effects: a clock to sleep on and a
//! source of entropy for jitter and hold durations. Both are supplied by an
//! [`Environment`] so production runs use the wall clock while the harness
//! substitutes virtual time and a seeded RNG.

use std::{future::Future, ops::Sub, time::Duration};

use rand::{Rng, RngCore};

/// Source of time, sleeping and randomness for the simulation.
///
/// Implementations must be cheap to clone; every device task holds its own
/// copy.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Suspend the calling task for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// [`RngCore`] view over an [`Environment`]'s entropy.
///
/// Lets the `rand` distributions draw from whatever source the environment
/// was built with.
pub struct EnvRng<'a, E: Environment>(pub &'a E);

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.0.random_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.0.random_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.random_bytes(dest);
        Ok(())
    }
}

/// Sample a duration uniformly from `[min, max]` at nanosecond resolution.
///
/// Returns `min` when the range is empty or inverted. Durations longer than
/// `u64::MAX` nanoseconds are clamped.
pub fn uniform_duration<E: Environment>(env: &E, min: Duration, max: Duration) -> Duration {
    let lo = u64::try_from(min.as_nanos()).unwrap_or(u64::MAX);
    let hi = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if hi <= lo {
        return Duration::from_nanos(lo);
    }

    Duration::from_nanos(EnvRng(env).gen_range(lo..=hi))
}
