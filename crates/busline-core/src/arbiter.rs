//! Bus arbitration.
//!
//! The arbiter is a counting lock with a capacity of one. Acquisition never
//! waits: a device either takes the single permit immediately or learns the
//! bus is busy and decides for itself what to do next.
//!
//! # Invariants
//!
//! - `available` is always 0 or 1.
//! - Every successful [`BusArbiter::try_acquire`] is paired with exactly one
//!   [`BusArbiter::release`]. A failed acquisition owes no release.
//! - A release with no outstanding permit is refused and leaves the counter
//!   untouched.
//!
//! There is no fairness: when two devices race for a free bus, whichever
//! compare-and-swap lands first wins.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::ArbiterError;

/// Number of permits. The bus admits a single holder.
pub const CAPACITY: usize = 1;

/// Counters describing how the arbiter was used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbiterStats {
    /// Successful acquisitions.
    pub grants: u64,
    /// Acquisitions refused because the bus was held.
    pub denials: u64,
    /// Permits returned.
    pub releases: u64,
    /// Largest number of permits outstanding at once.
    pub peak_outstanding: usize,
}

/// Binary lock guarding the bus.
#[derive(Debug)]
pub struct BusArbiter {
    available: AtomicUsize,
    peak_outstanding: AtomicUsize,
    grants: AtomicU64,
    denials: AtomicU64,
    releases: AtomicU64,
}

impl BusArbiter {
    /// Create an arbiter with its single permit available.
    pub fn new() -> Self {
        Self {
            available: AtomicUsize::new(CAPACITY),
            peak_outstanding: AtomicUsize::new(0),
            grants: AtomicU64::new(0),
            denials: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    /// Take the permit if it is free. Never waits.
    pub fn try_acquire(&self) -> bool {
        match self.available.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(prev) => {
                self.grants.fetch_add(1, Ordering::Relaxed);
                self.peak_outstanding.fetch_max(CAPACITY - (prev - 1), Ordering::Relaxed);
                true
            },
            Err(_) => {
                self.denials.fetch_add(1, Ordering::Relaxed);
                false
            },
        }
    }

    /// Return the permit taken by a successful [`try_acquire`](Self::try_acquire).
    ///
    /// # Errors
    ///
    /// Returns [`ArbiterError::NotHeld`] if no permit is outstanding. The
    /// counter is never raised above [`CAPACITY`].
    pub fn release(&self) -> Result<(), ArbiterError> {
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < CAPACITY).then_some(n + 1)
            })
            .map_err(|_| ArbiterError::NotHeld)?;

        self.releases.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Permits currently available (0 or 1).
    pub fn available(&self) -> usize {
        self.available.load(Ordering::Acquire)
    }

    /// Total permits.
    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> ArbiterStats {
        ArbiterStats {
            grants: self.grants.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            peak_outstanding: self.peak_outstanding.load(Ordering::Relaxed),
        }
    }
}

impl Default for BusArbiter {
    fn default() -> Self {
        Self::new()
    }
}
