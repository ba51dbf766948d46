//! Bounded Sample Buffer with Alert Latch
//!
//! FIFO of samples with a drop-oldest overflow policy. The queue and the
//! alert latch share one short-lived mutex so admission, popping, and latch
//! transitions stay atomic with respect to each other; the statistics
//! counters are independent atomics bumped inside that critical section.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use simtemp_protocol::{Sample, Stats};

/// Default buffer capacity in samples
pub const DEFAULT_CAPACITY: usize = 128;

/// Outcome of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Sample stored; `evicted` is true when the oldest entry was discarded
    /// to make room
    Stored { evicted: bool },
    /// No room could be made; the sample was counted as a drop and consumers
    /// must not be notified
    Rejected,
}

/// Non-blocking snapshot of the two consumer-visible wait conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// At least one sample is buffered
    pub readable: bool,
    /// An unconsumed threshold-crossing sample was admitted
    pub alert: bool,
}

struct Inner {
    queue: VecDeque<Sample>,
    alert_pending: bool,
}

/// Bounded FIFO of samples shared between the sampler and consumers
pub struct SampleBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
    updates: AtomicU64,
    alerts: AtomicU64,
    drops: AtomicU64,
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                alert_pending: false,
            }),
            capacity,
            updates: AtomicU64::new(0),
            alerts: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        }
    }

    /// Create a buffer with the default capacity (128 samples)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit one sample, evicting the oldest entry first when full
    ///
    /// On success the alert latch is edge-set for threshold-crossing samples
    /// (only the false-to-true transition counts an alert) and `updates` is
    /// bumped. The caller decides whether to notify waiting consumers: only
    /// a `Stored` outcome warrants a wakeup.
    pub fn admit(&self, sample: Sample) -> Admission {
        let mut inner = self.locked();

        let mut evicted = false;
        if inner.queue.len() >= self.capacity {
            match inner.queue.pop_front() {
                Some(_) => {
                    self.drops.fetch_add(1, Ordering::Relaxed);
                    evicted = true;
                }
                // Nothing to evict means a zero-capacity buffer; count the
                // incoming sample as dropped
                None => {
                    self.drops.fetch_add(1, Ordering::Relaxed);
                    return Admission::Rejected;
                }
            }
        }
        if inner.queue.len() >= self.capacity {
            self.drops.fetch_add(1, Ordering::Relaxed);
            return Admission::Rejected;
        }

        inner.queue.push_back(sample);
        if sample.crossed_threshold() && !inner.alert_pending {
            inner.alert_pending = true;
            self.alerts.fetch_add(1, Ordering::Relaxed);
        }
        self.updates.fetch_add(1, Ordering::Relaxed);

        Admission::Stored { evicted }
    }

    /// Remove and return the oldest sample
    ///
    /// Popping any threshold-crossing sample clears the alert latch, even if
    /// further crossing samples remain queued.
    pub fn pop(&self) -> Option<Sample> {
        let mut inner = self.locked();
        let sample = inner.queue.pop_front()?;
        if sample.crossed_threshold() {
            inner.alert_pending = false;
        }
        Some(sample)
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.locked().queue.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the data-available and alert-pending conditions
    pub fn readiness(&self) -> Readiness {
        let inner = self.locked();
        Readiness {
            readable: !inner.queue.is_empty(),
            alert: inner.alert_pending,
        }
    }

    /// Snapshot of the monotonic counters
    ///
    /// Counters are read independently, so cross-counter consistency under
    /// concurrent admissions is not guaranteed; per-counter monotonicity is.
    pub fn stats(&self) -> Stats {
        Stats {
            updates: self.updates.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}
