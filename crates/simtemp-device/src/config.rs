//! Device Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use simtemp_protocol::WaveformMode;

use crate::DeviceError;

/// Live-tunable device parameters
///
/// Guarded by its own lock inside the device, independent of the data plane.
/// The sampler re-reads every field on each tick, so writes take effect on
/// the next sample without stopping production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Sampling period in milliseconds, always greater than zero
    pub sampling_ms: u64,
    /// Alert threshold in milli-degrees Celsius
    pub threshold_mc: i32,
    /// Active waveform shape
    pub mode: WaveformMode,
    /// Emit per-tick diagnostics; never affects sampling values or timing
    pub debug: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sampling_ms: 1000,
            threshold_mc: 45_000,
            mode: WaveformMode::Normal,
            debug: false,
        }
    }
}

impl DeviceConfig {
    /// Sampling period as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sampling_ms)
    }

    /// Reject configurations the device cannot run with
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.sampling_ms == 0 {
            return Err(DeviceError::InvalidArgument(
                "sampling_ms",
                "must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
