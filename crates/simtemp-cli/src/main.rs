//! SimTemp Monitor - Main Entry Point
//!
//! Streams samples from a simulated temperature sensor to stdout and programs
//! the device through its text attribute layer. The `--test` mode drives the
//! device into a fast ramp against a low threshold and exits successfully
//! once an alert-bearing sample is observed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use simtemp_device::{write_attribute, DeviceConfig, DeviceError, SimTempDevice};
use simtemp_protocol::Sample;

#[derive(Parser, Debug)]
#[command(name = "simtemp", about = "Monitor a simulated temperature sensor")]
struct Cli {
    /// Path to a TOML file with initial device configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit samples as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Program an alert scenario and exit 0 once the alert is observed
    #[arg(long)]
    test: bool,
}

/// Initialize logging
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Layer an optional TOML file and SIMTEMP_* environment variables over the
/// built-in defaults
fn load_config(path: Option<&Path>) -> anyhow::Result<DeviceConfig> {
    let mut builder = config::Config::builder()
        .add_source(config::Config::try_from(&DeviceConfig::default())?);
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    builder = builder.add_source(config::Environment::with_prefix("SIMTEMP").try_parsing(true));

    Ok(builder.build()?.try_deserialize()?)
}

fn render_sample(sample: &Sample, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(sample)?);
    }
    let secs = sample.timestamp_ns as f64 / 1e9;
    let temp_c = sample.temp_mc as f64 / 1000.0;
    Ok(format!(
        "t={secs:.3}s temp={temp_c:.3}C alert={}",
        sample.crossed_threshold()
    ))
}

/// Stream samples until Ctrl-C or device stop
async fn run_monitor(device: &SimTempDevice, json: bool) -> anyhow::Result<()> {
    info!("streaming samples, press Ctrl-C to stop");
    loop {
        tokio::select! {
            result = device.pop_blocking(None) => match result {
                Ok(sample) => println!("{}", render_sample(&sample, json)?),
                Err(DeviceError::Stopped) => break,
                Err(err) => return Err(err.into()),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }
    Ok(())
}

/// Drive a fast ramp against a low threshold and wait for the alert
async fn run_self_test(device: &SimTempDevice) -> anyhow::Result<()> {
    write_attribute(device, "sampling_ms", "100")?;
    write_attribute(device, "mode", "ramp")?;
    write_attribute(device, "threshold_mC", "26000")?;
    info!("self-test programmed: 100ms ramp against 26000mC");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            anyhow::bail!("self-test failed: no alert observed within 5s");
        }
        let sample = match device.pop_blocking(Some(remaining)).await {
            Ok(sample) => sample,
            Err(DeviceError::WouldBlock) => {
                anyhow::bail!("self-test failed: no alert observed within 5s")
            }
            Err(err) => return Err(err.into()),
        };
        println!("{}", render_sample(&sample, false)?);
        if sample.crossed_threshold() {
            info!("self-test passed: alert observed ({})", device.stats());
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let device = SimTempDevice::new(config)?;

    let result = if cli.test {
        run_self_test(&device).await
    } else {
        run_monitor(&device, cli.json).await
    };

    device.shutdown().await;
    result
}
