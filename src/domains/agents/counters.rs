use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActiveCounts {
    pub travelers: usize,
    pub wild_tenants: usize,
}

/// Run-scoped counts of agents still working, behind one exclusive lock.
#[derive(Debug, Default)]
pub struct ActivityCounters {
    counts: Mutex<ActiveCounts>,
}

impl ActivityCounters {
    pub fn new(travelers: usize, wild_tenants: usize) -> Self {
        Self {
            counts: Mutex::new(ActiveCounts {
                travelers,
                wild_tenants,
            }),
        }
    }

    pub fn traveler_finished(&self) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.travelers = counts.travelers.saturating_sub(1);
    }

    pub fn tenant_finished(&self) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.wild_tenants = counts.wild_tenants.saturating_sub(1);
    }

    pub fn active_travelers(&self) -> usize {
        self.snapshot().travelers
    }

    pub fn snapshot(&self) -> ActiveCounts {
        *self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
