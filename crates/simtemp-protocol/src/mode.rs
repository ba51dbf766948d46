//! Waveform Mode Names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Waveform shapes the device can synthesize
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformMode {
    /// Slow sawtooth around body temperature
    #[default]
    Normal,
    /// Faster sawtooth over a wider band
    Ramp,
    /// Bounded pseudo-random jitter around 30 C
    Noisy,
}

impl WaveformMode {
    /// The control-plane name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            WaveformMode::Normal => "normal",
            WaveformMode::Ramp => "ramp",
            WaveformMode::Noisy => "noisy",
        }
    }
}

impl fmt::Display for WaveformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaveformMode {
    type Err = ProtocolError;

    /// Parse a control-plane mode name; matching is case-sensitive and exact
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(WaveformMode::Normal),
            "ramp" => Ok(WaveformMode::Ramp),
            "noisy" => Ok(WaveformMode::Noisy),
            other => Err(ProtocolError::UnknownMode(other.to_string())),
        }
    }
}
