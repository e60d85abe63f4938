//! Production environment: tokio's clock and a seeded `ChaCha8Rng`.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use busline_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock environment with a reproducible random stream.
///
/// Uses `tokio::time` rather than `std::time` so a paused test runtime
/// drives it the same way it drives the simulation harness.
#[derive(Clone)]
pub struct SystemEnv {
    seed: u64,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SystemEnv {
    /// Environment drawing from the stream for `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }

    /// Seed this environment was built with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
