//! Device Error Types

use simtemp_protocol::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the device control surface and consumer interface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// A configuration write or request carried a value the device rejects;
    /// device state is unchanged
    #[error("invalid argument for {0}: {1}")]
    InvalidArgument(&'static str, String),

    /// A non-blocking operation found nothing to do
    #[error("operation would block")]
    WouldBlock,

    /// The device has begun irreversible shutdown
    #[error("device stopped")]
    Stopped,
}

impl From<ProtocolError> for DeviceError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownMode(name) => {
                DeviceError::InvalidArgument("mode", format!("unknown waveform mode {name:?}"))
            }
            ProtocolError::ShortRecord { need, got } => DeviceError::InvalidArgument(
                "buffer",
                format!("record buffer too short: need {need} bytes, got {got}"),
            ),
        }
    }
}
