//! LED matrix marquee binary.
//!
//! # Usage
//!
//! ```bash
//! # Query firmware version
//! ledmarquee version --port /dev/ttyACM0
//!
//! # Show a 34x9 grid once, in greyscale
//! ledmarquee draw --port /dev/ttyACM0 --grid frame.txt --bit-depth gray8
//!
//! # Scroll a text raster across two modules until Ctrl-C
//! ledmarquee marquee --left /dev/ttyACM0 --right /dev/ttyACM1 --grid word.txt
//! ```

mod error;
mod grid_file;
mod picker;
#[cfg(unix)]
mod tty;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use ledmarquee_app::{Runtime, RuntimeConfig, RuntimeHandle, SharedSink, Side};
use ledmarquee_core::{
    BitDepth, DEFAULT_READ_TIMEOUT, DeviceSession, DialectChoice, PixelGrid, SessionConfig,
    SystemEnv, connect,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{error::CliError, picker::DevicePathPicker};

/// LED matrix marquee driver
#[derive(Parser, Debug)]
#[command(name = "ledmarquee")]
#[command(about = "Drive LED matrix input modules over their serial ports")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Identify the firmware and report its version
    Version {
        /// Serial device path
        #[arg(short, long)]
        port: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Show one grid file on one module
    Draw {
        /// Serial device path
        #[arg(short, long)]
        port: PathBuf,

        /// Grid file: one row per line, values 0..1
        #[arg(short, long)]
        grid: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Animate a text raster across one or two modules until Ctrl-C
    Marquee {
        /// Device for the left half
        #[arg(long)]
        left: PathBuf,

        /// Device for the right half
        #[arg(long)]
        right: Option<PathBuf>,

        /// Text raster file, glyphs stacked vertically
        #[arg(short, long)]
        grid: PathBuf,

        /// Frame period in milliseconds
        #[arg(long, default_value = "50")]
        tick_ms: u64,

        #[command(flatten)]
        session: SessionArgs,
    },
}

/// Options shared by every command that opens a module.
#[derive(ClapArgs, Debug)]
struct SessionArgs {
    /// Firmware dialect (auto, official, sigroot)
    #[arg(long, default_value = "auto")]
    dialect: DialectChoice,

    /// Draw path for official firmware
    #[arg(long, value_enum, default_value = "mono1")]
    bit_depth: DepthArg,

    /// Reply timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DepthArg {
    /// 8-bit greyscale
    Gray8,
    /// 1-bit monochrome
    Mono1,
}

impl SessionArgs {
    fn config(&self) -> SessionConfig {
        SessionConfig {
            dialect: self.dialect,
            bit_depth: match self.bit_depth {
                DepthArg::Gray8 => BitDepth::Gray8,
                DepthArg::Mono1 => BitDepth::Mono1,
            },
            read_timeout: Duration::from_millis(self.timeout_ms),
            label: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match args.command {
        Command::Version { port, session } => version(port, &session.config()).await?,
        Command::Draw { port, grid, session } => draw(port, grid, &session.config()).await?,
        Command::Marquee { left, right, grid, tick_ms, session } => {
            let runtime = RuntimeConfig {
                tick: Duration::from_millis(tick_ms),
                ..RuntimeConfig::default()
            };
            marquee(left, right, grid, &session.config(), runtime).await?;
        },
    }
    Ok(())
}

async fn open(path: PathBuf, config: &SessionConfig) -> Result<DeviceSession, CliError> {
    let picker = DevicePathPicker::new(path);
    connect(&picker, config).await.map_err(|source| CliError::Connect {
        port: picker.path().display().to_string(),
        source,
    })
}

async fn version(port: PathBuf, config: &SessionConfig) -> Result<(), CliError> {
    let session = open(port, config).await?;
    let version = session.version().await?;
    tracing::info!(
        port = %session.info(),
        dialect = %session.dialect_kind(),
        %version,
        "firmware version"
    );
    Ok(())
}

async fn draw(port: PathBuf, grid: PathBuf, config: &SessionConfig) -> Result<(), CliError> {
    let grid = grid_file::load(&grid).await?;
    let session = open(port, config).await?;
    session.draw(&grid).await?;
    tracing::info!(port = %session.info(), "frame sent");
    Ok(())
}

async fn marquee(
    left: PathBuf,
    right: Option<PathBuf>,
    grid: PathBuf,
    config: &SessionConfig,
    runtime_config: RuntimeConfig,
) -> Result<(), CliError> {
    let raster = grid_file::load(&grid).await?;
    let (runtime, handle) = Runtime::new(SystemEnv::new(), runtime_config);

    let left: SharedSink = Arc::new(open(left, config).await?);
    let mut sinks = vec![(Side::Left, left)];
    if let Some(right) = right {
        let right: SharedSink = Arc::new(open(right, config).await?);
        sinks.push((Side::Right, right));
    }
    wire(&handle, sinks, raster)?;

    let running = tokio::spawn(runtime.run());
    tokio::signal::ctrl_c().await.map_err(CliError::Signal)?;
    tracing::info!("interrupted, stopping");
    handle.shutdown();
    let _ = running.await;
    Ok(())
}

/// Hands the sinks and the raster to a runtime that has not been spawned yet.
fn wire(
    handle: &RuntimeHandle,
    sinks: Vec<(Side, SharedSink)>,
    raster: PixelGrid,
) -> Result<(), CliError> {
    for (side, sink) in sinks {
        if !handle.attach(side, sink) {
            return Err(CliError::RuntimeStopped);
        }
    }
    if !handle.load(raster) {
        return Err(CliError::RuntimeStopped);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_a_live_runtime_succeeds() {
        let (_runtime, handle) = Runtime::new(SystemEnv::new(), RuntimeConfig::default());
        assert!(wire(&handle, Vec::new(), PixelGrid::new(9, 12)).is_ok());
    }

    #[test]
    fn wiring_a_dropped_runtime_fails() {
        let (runtime, handle) = Runtime::new(SystemEnv::new(), RuntimeConfig::default());
        drop(runtime);

        let result = wire(&handle, Vec::new(), PixelGrid::new(9, 12));

        assert!(matches!(result, Err(CliError::RuntimeStopped)));
    }
}
