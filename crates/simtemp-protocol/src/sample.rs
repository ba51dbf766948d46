//! Sample Record Definition and Wire Layout
//!
//! One record per tick, one record per pop. The wire layout is fixed so an
//! external reader can consume records without a schema: little-endian
//! `u64 | i32 | u32`, 16 bytes, no padding.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Flag bits carried in [`Sample::flags`]
pub mod flags {
    /// Set on every produced sample
    pub const NEW_SAMPLE: u32 = 1 << 0;
    /// Set when the temperature reached the configured threshold
    pub const THRESHOLD_CROSSED: u32 = 1 << 1;
}

/// Size of one encoded sample record in bytes
pub const RECORD_SIZE: usize = 16;

// timestamp_ns (8) + temp_mc (4) + flags (4)
const _: () = assert!(RECORD_SIZE == 8 + 4 + 4);

/// A single timestamped temperature reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Temperature in milli-degrees Celsius
    pub temp_mc: i32,
    /// Flag bitmask, see [`flags`]
    pub flags: u32,
}

impl Sample {
    /// Create a sample with the given timestamp, temperature, and flags
    pub fn new(timestamp_ns: u64, temp_mc: i32, flags: u32) -> Self {
        Self {
            timestamp_ns,
            temp_mc,
            flags,
        }
    }

    /// Whether this sample crossed the alert threshold when produced
    pub fn crossed_threshold(&self) -> bool {
        self.flags & flags::THRESHOLD_CROSSED != 0
    }

    /// Encode into the fixed 16-byte wire layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[8..12].copy_from_slice(&self.temp_mc.to_le_bytes());
        buf[12..16].copy_from_slice(&self.flags.to_le_bytes());
        buf
    }

    /// Encode into the front of `buf`, returning the number of bytes written
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        if buf.len() < RECORD_SIZE {
            return Err(ProtocolError::ShortRecord {
                need: RECORD_SIZE,
                got: buf.len(),
            });
        }
        buf[..RECORD_SIZE].copy_from_slice(&self.encode());
        Ok(RECORD_SIZE)
    }

    /// Decode one record from the front of `buf`
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < RECORD_SIZE {
            return Err(ProtocolError::ShortRecord {
                need: RECORD_SIZE,
                got: buf.len(),
            });
        }
        let mut ts = [0u8; 8];
        let mut word = [0u8; 4];
        ts.copy_from_slice(&buf[0..8]);
        let timestamp_ns = u64::from_le_bytes(ts);
        word.copy_from_slice(&buf[8..12]);
        let temp_mc = i32::from_le_bytes(word);
        word.copy_from_slice(&buf[12..16]);
        let flags = u32::from_le_bytes(word);
        Ok(Self {
            timestamp_ns,
            temp_mc,
            flags,
        })
    }
}
