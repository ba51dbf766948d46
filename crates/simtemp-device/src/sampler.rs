//! Periodic Sampler Task
//!
//! One tokio task per device drives the tick loop: sleep for the configured
//! interval, synthesize a sample, admit it, repeat. The armed sleep is
//! interrupted when a writer changes the interval (so the new period applies
//! immediately, not after the old one elapses) or when shutdown begins. The
//! interval is re-read at the top of every iteration, which keeps at most one
//! pending timer per device.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use simtemp_protocol::{flags, Sample};

use crate::buffer::Admission;
use crate::device::Shared;
use crate::waveform::WaveformGenerator;

pub(crate) struct Sampler {
    shared: Arc<Shared>,
    wave: WaveformGenerator,
    stop: watch::Receiver<bool>,
    retime: watch::Receiver<()>,
}

impl Sampler {
    pub(crate) fn new(
        shared: Arc<Shared>,
        stop: watch::Receiver<bool>,
        retime: watch::Receiver<()>,
    ) -> Self {
        Self {
            shared,
            wave: WaveformGenerator::new(),
            stop,
            retime,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("sampler task started");
        loop {
            // Interval read fresh each iteration: a change that lands during
            // a tick applies to the very next period
            let interval = self.shared.locked_config().interval();
            let fire = tokio::time::sleep(interval);
            tokio::pin!(fire);

            tokio::select! {
                _ = &mut fire => {
                    if !self.tick() {
                        break;
                    }
                }
                changed = self.retime.changed() => {
                    // Drop the armed timer and re-arm with the new interval
                    if changed.is_err() {
                        break;
                    }
                }
                changed = self.stop.changed() => {
                    if changed.is_err() || *self.stop.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("sampler task exited");
    }

    /// One tick: generate, flag, admit, notify. Returns false once shutdown
    /// is observed, in which case nothing was admitted and the loop must not
    /// re-arm.
    fn tick(&mut self) -> bool {
        if *self.stop.borrow() {
            return false;
        }

        // Mode and threshold are read under the config lock so a tick never
        // sees a half-updated configuration
        let (mode, threshold_mc, verbose) = {
            let config = self.shared.locked_config();
            (config.mode, config.threshold_mc, config.debug)
        };

        let temp_mc = self.wave.next_sample(mode);
        let mut sample_flags = flags::NEW_SAMPLE;
        if temp_mc >= threshold_mc {
            sample_flags |= flags::THRESHOLD_CROSSED;
        }
        let sample = Sample::new(self.shared.now_ns(), temp_mc, sample_flags);

        match self.shared.buffer.admit(sample) {
            Admission::Stored { evicted } => {
                if verbose {
                    debug!(
                        "tick: mode={} temp={}mC flags={:#x} evicted={}",
                        mode, temp_mc, sample_flags, evicted
                    );
                }
                // One sample, one consumer: a stored permit also covers the
                // check-then-wait race in pop_blocking
                self.shared.data_ready.notify_one();
            }
            Admission::Rejected => {
                warn!("tick: sample rejected, buffer cannot make room");
            }
        }
        true
    }
}
