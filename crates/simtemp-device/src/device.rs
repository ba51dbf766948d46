//! Device Handle and Control Surface
//!
//! [`SimTempDevice`] owns the shared state, spawns the sampler task, and
//! exposes the two concurrent surfaces: synchronized configuration get/set
//! for writers, and non-blocking/blocking sample consumption for readers.
//! The config lock and the data-plane lock are independent and never held
//! together, keeping the producer's critical section short.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use simtemp_protocol::{ProtocolError, Sample, Stats, WaveformMode, RECORD_SIZE};

use crate::buffer::{Readiness, SampleBuffer, DEFAULT_CAPACITY};
use crate::config::DeviceConfig;
use crate::error::DeviceError;
use crate::sampler::Sampler;

/// State shared between the device handle and its sampler task
pub(crate) struct Shared {
    config: Mutex<DeviceConfig>,
    pub(crate) buffer: SampleBuffer,
    pub(crate) data_ready: Notify,
    epoch: Instant,
}

impl Shared {
    pub(crate) fn locked_config(&self) -> MutexGuard<'_, DeviceConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Monotonic nanoseconds since device activation
    pub(crate) fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Handle to one simulated temperature sensor
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`. Dropping the
/// handle without calling [`SimTempDevice::shutdown`] stops the sampler task
/// on its next wakeup, but only `shutdown` guarantees the task has exited
/// before returning.
pub struct SimTempDevice {
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    retime_tx: watch::Sender<()>,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl SimTempDevice {
    /// Create a device with the default buffer capacity and start sampling
    ///
    /// Must be called within a tokio runtime; the sampler task is spawned
    /// immediately and the first tick fires after one sampling interval.
    pub fn new(config: DeviceConfig) -> Result<Self, DeviceError> {
        Self::with_capacity(config, DEFAULT_CAPACITY)
    }

    /// Create a device with an explicit buffer capacity
    pub fn with_capacity(config: DeviceConfig, capacity: usize) -> Result<Self, DeviceError> {
        config.validate()?;

        info!(
            "simtemp device created: sampling={}ms threshold={}mC mode={} capacity={}",
            config.sampling_ms, config.threshold_mc, config.mode, capacity
        );

        let shared = Arc::new(Shared {
            config: Mutex::new(config),
            buffer: SampleBuffer::new(capacity),
            data_ready: Notify::new(),
            epoch: Instant::now(),
        });
        let (stop_tx, stop_rx) = watch::channel(false);
        let (retime_tx, retime_rx) = watch::channel(());

        let sampler = Sampler::new(Arc::clone(&shared), stop_rx.clone(), retime_rx);
        let handle = tokio::spawn(sampler.run());

        Ok(Self {
            shared,
            stop_tx,
            stop_rx,
            retime_tx,
            sampler: Mutex::new(Some(handle)),
        })
    }

    // --- control surface ---

    /// Current sampling period in milliseconds
    pub fn sampling_ms(&self) -> u64 {
        self.shared.locked_config().sampling_ms
    }

    /// Replace the sampling period and re-arm the pending timer
    ///
    /// The new period applies immediately: the armed fire is cancelled and a
    /// fresh one is scheduled, so shortening the interval never waits out the
    /// old period.
    pub fn set_sampling_ms(&self, sampling_ms: u64) -> Result<(), DeviceError> {
        if sampling_ms == 0 {
            return Err(DeviceError::InvalidArgument(
                "sampling_ms",
                "must be greater than zero".to_string(),
            ));
        }
        self.shared.locked_config().sampling_ms = sampling_ms;
        // Interrupt the armed sleep so the sampler re-arms with the new period
        let _ = self.retime_tx.send(());
        debug!("sampling interval set to {}ms", sampling_ms);
        Ok(())
    }

    /// Current alert threshold in milli-degrees Celsius
    pub fn threshold_mc(&self) -> i32 {
        self.shared.locked_config().threshold_mc
    }

    /// Replace the alert threshold; the next tick compares against it
    pub fn set_threshold_mc(&self, threshold_mc: i32) {
        self.shared.locked_config().threshold_mc = threshold_mc;
        debug!("threshold set to {}mC", threshold_mc);
    }

    /// Current waveform mode
    pub fn mode(&self) -> WaveformMode {
        self.shared.locked_config().mode
    }

    /// Switch waveform mode; takes effect on the next tick and never resets
    /// the waveform counter
    pub fn set_mode(&self, mode: WaveformMode) {
        self.shared.locked_config().mode = mode;
        debug!("waveform mode set to {}", mode);
    }

    /// Whether per-tick diagnostics are enabled
    pub fn debug(&self) -> bool {
        self.shared.locked_config().debug
    }

    /// Toggle per-tick diagnostics; sampling values and timing are unaffected
    pub fn set_debug(&self, debug: bool) {
        self.shared.locked_config().debug = debug;
        let debug_state = if debug { "enabled" } else { "disabled" };
        debug!("debug diagnostics {}", debug_state);
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> DeviceConfig {
        self.shared.locked_config().clone()
    }

    /// Snapshot of the monotonic statistics counters
    pub fn stats(&self) -> Stats {
        self.shared.buffer.stats()
    }

    // --- consumer interface ---

    /// Non-blocking pop of the oldest buffered sample
    pub fn try_pop(&self) -> Option<Sample> {
        self.shared.buffer.pop()
    }

    /// Wait for a sample, shutdown, or the optional timeout
    ///
    /// Returns [`DeviceError::WouldBlock`] when the timeout elapses first and
    /// [`DeviceError::Stopped`] when the device shuts down while the buffer
    /// is still empty; samples already buffered at shutdown can still be
    /// drained. The wait condition is re-checked after every wakeup.
    pub async fn pop_blocking(&self, timeout: Option<Duration>) -> Result<Sample, DeviceError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut stop = self.stop_rx.clone();

        loop {
            if let Some(sample) = self.shared.buffer.pop() {
                return Ok(sample);
            }
            if *stop.borrow() {
                return Err(DeviceError::Stopped);
            }

            let notified = self.shared.data_ready.notified();
            tokio::pin!(notified);
            match deadline {
                Some(at) => tokio::select! {
                    _ = &mut notified => {}
                    changed = stop.changed() => {
                        if changed.is_err() {
                            return Err(DeviceError::Stopped);
                        }
                    }
                    _ = tokio::time::sleep_until(at) => {
                        return Err(DeviceError::WouldBlock);
                    }
                },
                None => tokio::select! {
                    _ = &mut notified => {}
                    changed = stop.changed() => {
                        if changed.is_err() {
                            return Err(DeviceError::Stopped);
                        }
                    }
                },
            }
        }
    }

    /// Snapshot of the data-available and alert-pending wait conditions
    pub fn readiness(&self) -> Readiness {
        self.shared.buffer.readiness()
    }

    /// Non-blocking wire read: encode one record into `buf`
    ///
    /// A buffer shorter than one 16-byte record is rejected without consuming
    /// a sample; an empty device reports [`DeviceError::WouldBlock`].
    pub fn read_record(&self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if buf.len() < RECORD_SIZE {
            return Err(ProtocolError::ShortRecord {
                need: RECORD_SIZE,
                got: buf.len(),
            }
            .into());
        }
        let sample = self.try_pop().ok_or(DeviceError::WouldBlock)?;
        Ok(sample.write_to(buf)?)
    }

    /// Whether irreversible shutdown has begun
    pub fn is_stopping(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Begin irreversible shutdown and join the sampler task
    ///
    /// Idempotent. When this returns the sampler has exited, no further
    /// admission can happen, and every consumer blocked in `pop_blocking`
    /// has been woken.
    pub async fn shutdown(&self) {
        let verbose = self.debug();
        if !*self.stop_tx.borrow() {
            let _ = self.stop_tx.send(true);
            if verbose {
                debug!("shutdown: stop signalled");
            }
        }
        self.shared.data_ready.notify_waiters();

        let handle = self
            .sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                warn!("sampler task panicked during shutdown");
            }
            if verbose {
                debug!("shutdown: sampler task joined");
            }
        }
        info!("simtemp device stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simtemp_protocol::flags;

    fn fast_config(sampling_ms: u64) -> DeviceConfig {
        DeviceConfig {
            sampling_ms,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_interval() {
        let device = SimTempDevice::new(fast_config(100)).unwrap();

        let sample = device.pop_blocking(None).await.unwrap();
        assert_eq!(sample.temp_mc, 30_000);
        assert_eq!(sample.flags, flags::NEW_SAMPLE);
        assert!(sample.timestamp_ns >= 100_000_000);
        assert_eq!(device.stats().updates, 1);

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_applies_to_next_fire() {
        let device = SimTempDevice::new(fast_config(100)).unwrap();
        device.pop_blocking(None).await.unwrap();

        // An enormous period set right after a tick cancels the pending
        // short-period fire
        device.set_sampling_ms(3_600_000).unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(device.try_pop(), None);
        assert_eq!(device.stats().updates, 1);

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shortening_interval_takes_effect_immediately() {
        let device = SimTempDevice::new(fast_config(60_000)).unwrap();

        device.set_sampling_ms(50).unwrap();
        let sample = device
            .pop_blocking(Some(Duration::from_millis(200)))
            .await
            .unwrap();
        assert_eq!(sample.temp_mc, 30_000);

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected() {
        assert!(matches!(
            SimTempDevice::new(fast_config(0)),
            Err(DeviceError::InvalidArgument("sampling_ms", _))
        ));

        let device = SimTempDevice::new(fast_config(100)).unwrap();
        assert!(device.set_sampling_ms(0).is_err());
        assert_eq!(device.sampling_ms(), 100);

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_change_takes_effect_next_tick() {
        let device = SimTempDevice::new(fast_config(100)).unwrap();

        let first = device.pop_blocking(None).await.unwrap();
        assert_eq!(first.temp_mc, 30_000);

        device.set_mode(WaveformMode::Ramp);
        // Counter kept across the switch: second tick sees counter == 1
        let second = device.pop_blocking(None).await.unwrap();
        assert_eq!(second.temp_mc, 25_200);

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_crosses_threshold_at_predicted_counter() {
        let config = DeviceConfig {
            sampling_ms: 10,
            threshold_mc: 45_000,
            mode: WaveformMode::Ramp,
            debug: false,
        };
        let device = SimTempDevice::with_capacity(config, 256).unwrap();

        // 25000 + counter * 200 reaches 45000 first at counter == 100
        for _ in 0..100 {
            let sample = device.pop_blocking(None).await.unwrap();
            assert!(!sample.crossed_threshold(), "early alert at {}", sample.temp_mc);
        }
        let crossing = device.pop_blocking(None).await.unwrap();
        assert!(crossing.crossed_threshold());
        assert_eq!(crossing.temp_mc, 45_000);
        assert_eq!(device.stats().alerts, 1);

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_consumer_evicts_oldest() {
        let device = SimTempDevice::with_capacity(fast_config(10), 4).unwrap();

        // Five ticks, no pops
        tokio::time::sleep(Duration::from_millis(55)).await;

        let stats = device.stats();
        assert_eq!(stats.updates, 5);
        assert_eq!(stats.drops, 1);
        // Oldest sample was evicted; the survivor is the second tick's
        assert_eq!(device.try_pop().map(|s| s.temp_mc), Some(30_001));

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_blocking_timeout() {
        let device = SimTempDevice::new(fast_config(60_000)).unwrap();

        let result = device.pop_blocking(Some(Duration::from_millis(10))).await;
        assert_eq!(result, Err(DeviceError::WouldBlock));

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wakes_all_blocked_consumers() {
        let device = Arc::new(SimTempDevice::new(fast_config(3_600_000)).unwrap());

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let device = Arc::clone(&device);
            waiters.push(tokio::spawn(async move {
                device.pop_blocking(None).await
            }));
        }
        // Let the consumers park on the notify before stopping
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        device.shutdown().await;
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), Err(DeviceError::Stopped));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_production_and_is_idempotent() {
        let device = SimTempDevice::new(fast_config(10)).unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;

        device.shutdown().await;
        assert!(device.is_stopping());
        let stats = device.stats();
        assert_eq!(stats.updates, 2);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(device.stats().updates, 2);

        // Buffered samples drain after stop, then the terminal error surfaces
        assert!(device.try_pop().is_some());
        assert!(device.try_pop().is_some());
        assert_eq!(device.pop_blocking(None).await, Err(DeviceError::Stopped));

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_mirrors_buffer_and_latch() {
        let config = DeviceConfig {
            sampling_ms: 10,
            threshold_mc: 0,
            ..Default::default()
        };
        let device = SimTempDevice::new(config).unwrap();
        assert_eq!(device.readiness(), Readiness::default());

        tokio::time::sleep(Duration::from_millis(15)).await;
        let ready = device.readiness();
        assert!(ready.readable);
        assert!(ready.alert);

        device.try_pop();
        assert_eq!(device.readiness(), Readiness::default());

        device.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_record_wire_semantics() {
        let device = SimTempDevice::new(fast_config(100)).unwrap();

        let mut short = [0u8; RECORD_SIZE - 1];
        assert!(matches!(
            device.read_record(&mut short),
            Err(DeviceError::InvalidArgument("buffer", _))
        ));

        let mut buf = [0u8; RECORD_SIZE];
        assert_eq!(device.read_record(&mut buf), Err(DeviceError::WouldBlock));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(device.read_record(&mut buf), Ok(RECORD_SIZE));
        let decoded = Sample::decode(&buf).unwrap();
        assert_eq!(decoded.temp_mc, 30_000);

        device.shutdown().await;
    }
}
