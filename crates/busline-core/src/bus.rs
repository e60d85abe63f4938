//! The simulated bus itself.
//!
//! [`Bus`] does not gate anything. It counts who is on the bus right now so a
//! run can report how often forced entries overlapped another device's use.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Occupancy figures for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Entries onto the bus, granted or forced.
    pub entries: u64,
    /// Entries that found another device already on the bus.
    pub collisions: u64,
    /// Most devices on the bus at the same time.
    pub peak_occupancy: usize,
}

/// Occupancy tracker for the shared bus.
#[derive(Debug, Default)]
pub struct Bus {
    occupancy: AtomicUsize,
    peak_occupancy: AtomicUsize,
    entries: AtomicU64,
    collisions: AtomicU64,
}

impl Bus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a device getting on the bus.
    ///
    /// Returns the number of devices on the bus including the caller.
    pub fn occupy(&self) -> usize {
        let occupancy = self.occupancy.fetch_add(1, Ordering::AcqRel) + 1;
        self.entries.fetch_add(1, Ordering::Relaxed);
        if occupancy > 1 {
            self.collisions.fetch_add(1, Ordering::Relaxed);
        }
        self.peak_occupancy.fetch_max(occupancy, Ordering::Relaxed);
        occupancy
    }

    /// Record a device getting off the bus.
    pub fn vacate(&self) {
        // Saturate so an unmatched vacate cannot wrap the counter.
        let _ = self.occupancy.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            n.checked_sub(1)
        });
    }

    /// Devices on the bus right now.
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    /// Snapshot of the occupancy figures.
    pub fn stats(&self) -> BusStats {
        BusStats {
            entries: self.entries.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            peak_occupancy: self.peak_occupancy.load(Ordering::Relaxed),
        }
    }
}
