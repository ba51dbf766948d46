//! SimTemp Device Core
//!
//! A simulated temperature sensor: a periodic sampler task synthesizes
//! timestamped readings, a bounded FIFO buffers them for consumers with a
//! drop-oldest overflow policy, an edge-triggered latch tracks threshold
//! alerts, and a synchronized control surface lets concurrent writers retune
//! the device without stopping production.

mod buffer;
mod config;
mod control;
mod device;
mod error;
mod sampler;
mod waveform;

pub use buffer::{Admission, Readiness, SampleBuffer, DEFAULT_CAPACITY};
pub use config::DeviceConfig;
pub use control::{read_attribute, write_attribute};
pub use device::SimTempDevice;
pub use error::DeviceError;
pub use waveform::{temperature_at, WaveformGenerator};
