//! Protocol Error Types

use thiserror::Error;

/// Errors raised while parsing or encoding boundary data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Mode name did not match any known waveform
    #[error("unknown waveform mode: {0:?}")]
    UnknownMode(String),

    /// Record buffer smaller than one sample record
    #[error("record buffer too short: need {need} bytes, got {got}")]
    ShortRecord { need: usize, got: usize },
}
