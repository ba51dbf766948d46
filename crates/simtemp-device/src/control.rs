//! Text Attribute Layer
//!
//! Renders the live-tunable parameters and statistics as decimal text
//! scalars, one attribute per name: `sampling_ms`, `threshold_mC`, `mode`,
//! `debug`, and the read-only `stats`. Reads are newline-terminated; writes
//! accept an optional trailing newline. This is the control plane an
//! external filesystem-like surface would mount.

use simtemp_protocol::WaveformMode;

use crate::device::SimTempDevice;
use crate::error::DeviceError;

/// Read one attribute as newline-terminated decimal text
pub fn read_attribute(device: &SimTempDevice, name: &str) -> Result<String, DeviceError> {
    let text = match name {
        "sampling_ms" => format!("{}\n", device.sampling_ms()),
        "threshold_mC" => format!("{}\n", device.threshold_mc()),
        "mode" => format!("{}\n", device.mode()),
        "debug" => format!("{}\n", device.debug() as u8),
        "stats" => format!("{}\n", device.stats()),
        _ => {
            return Err(DeviceError::InvalidArgument(
                "attribute",
                format!("unknown attribute {name:?}"),
            ))
        }
    };
    Ok(text)
}

/// Write one attribute from decimal text, trailing newline allowed
pub fn write_attribute(device: &SimTempDevice, name: &str, raw: &str) -> Result<(), DeviceError> {
    let value = raw.strip_suffix('\n').unwrap_or(raw);
    match name {
        "sampling_ms" => {
            let ms = parse_scalar::<u64>("sampling_ms", value)?;
            device.set_sampling_ms(ms)
        }
        "threshold_mC" => {
            let threshold = parse_scalar::<i32>("threshold_mC", value)?;
            device.set_threshold_mc(threshold);
            Ok(())
        }
        "mode" => {
            let mode: WaveformMode = value.parse()?;
            device.set_mode(mode);
            Ok(())
        }
        "debug" => {
            // Any nonzero integer is truthy
            let flag = parse_scalar::<i64>("debug", value)?;
            device.set_debug(flag != 0);
            Ok(())
        }
        "stats" => Err(DeviceError::InvalidArgument(
            "stats",
            "attribute is read-only".to_string(),
        )),
        _ => Err(DeviceError::InvalidArgument(
            "attribute",
            format!("unknown attribute {name:?}"),
        )),
    }
}

fn parse_scalar<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, DeviceError> {
    value
        .parse()
        .map_err(|_| DeviceError::InvalidArgument(name, format!("not a valid value: {value:?}")))
}
