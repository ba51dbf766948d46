//! Synthetic Temperature Waveforms
//!
//! The generator is deterministic: the temperature is a pure function of
//! (mode, counter), and the counter advances by one on every sample no matter
//! which mode is active. Switching modes never resets the counter, so the
//! sequence stays reproducible across mode changes. Downstream behavior
//! (threshold crossings, eviction timing in tests) depends on these exact
//! formulas.

use simtemp_protocol::WaveformMode;

/// Temperature in milli-degrees Celsius for a given mode and counter value
pub fn temperature_at(mode: WaveformMode, counter: i64) -> i32 {
    match mode {
        // Slow sawtooth in a body-adjacent band: 30.000 C .. 49.999 C
        WaveformMode::Normal => 30_000 + (counter % 20_000) as i32,
        // Faster sawtooth over a wider band: 25.000 C .. 64.800 C
        WaveformMode::Ramp => 25_000 + ((counter * 200) % 40_000) as i32,
        // Pseudo-random jitter bounded within about +/-2 C of 30 C
        WaveformMode::Noisy => 30_000 + ((counter * 37) % 4001) as i32 - 2000,
    }
}

/// Stateful waveform generator owned by the sampler task
#[derive(Debug, Default)]
pub struct WaveformGenerator {
    counter: i64,
}

impl WaveformGenerator {
    /// Create a generator with the counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator starting from an arbitrary counter value
    pub fn with_counter(counter: i64) -> Self {
        Self { counter }
    }

    /// Produce the next temperature and advance the counter
    pub fn next_sample(&mut self, mode: WaveformMode) -> i32 {
        let temp_mc = temperature_at(mode, self.counter);
        self.counter += 1;
        temp_mc
    }

    /// Current counter value
    pub fn counter(&self) -> i64 {
        self.counter
    }
}
