//! Device Statistics Snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of the device's monotonic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Samples successfully admitted to the buffer
    pub updates: u64,
    /// Alert latch false-to-true transitions
    pub alerts: u64,
    /// Samples discarded by eviction or failed admission
    pub drops: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updates={} alerts={} drops={}",
            self.updates, self.alerts, self.drops
        )
    }
}
