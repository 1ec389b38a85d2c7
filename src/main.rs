//! CLI entry point for motorsim.
//!
//! Builds one simulated motor axis, issues a move and streams readback
//! updates to the log until the axis settles, then prints a JSON snapshot of
//! the final field values. Useful for eyeballing the record behavior without
//! a hosting control system.
//!
//! # Usage
//!
//! Move from 0 to 5 user units at 10 steps/s with 2 steps/unit:
//! ```bash
//! motorsim --resolution 2 --velocity 10 5.0
//! ```
//!
//! Load the axis configuration from a TOML file instead of flags:
//! ```bash
//! motorsim --config m1.toml 5.0
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use motorsim::{MotorConfig, MotorRecord};

#[derive(Parser)]
#[command(name = "motorsim")]
#[command(about = "Simulated EPICS-style motor record", long_about = None)]
struct Cli {
    /// Target position in user units.
    target: f64,

    /// Axis configuration TOML file (overrides the individual flags).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting position in user units.
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Resolution in steps per user unit.
    #[arg(long, default_value_t = 1.0)]
    resolution: f64,

    /// Velocity in steps per second.
    #[arg(long, default_value_t = 10.0)]
    velocity: f64,

    /// Low soft limit in user units.
    #[arg(long)]
    low_limit: Option<f64>,

    /// High soft limit in user units.
    #[arg(long)]
    high_limit: Option<f64>,
}

impl Cli {
    fn motor_config(&self) -> Result<MotorConfig> {
        if let Some(path) = &self.config {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config = toml::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            return Ok(config);
        }
        let mut config = MotorConfig::new("m1")
            .with_start_position(self.start)
            .with_resolution(self.resolution)
            .with_velocity(self.velocity);
        config.low_limit = self.low_limit;
        config.high_limit = self.high_limit;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.motor_config()?;
    let record = MotorRecord::new(&config)?;

    let precision = record.fields().precision.get() as usize;
    let mut raw_rx = record.fields().raw_position.subscribe();
    let mut done_rx = record.fields().done.subscribe();

    record.write_user(cli.target).await?;

    while !*done_rx.borrow_and_update() {
        tokio::select! {
            changed = raw_rx.changed() => {
                changed?;
                let raw = *raw_rx.borrow_and_update();
                info!(raw = format!("{raw:.precision$}"), "readback");
            }
            changed = done_rx.changed() => {
                changed?;
            }
        }
    }

    let snapshot = record.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
