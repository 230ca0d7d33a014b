//! DVR simulator: entry point.
//!
//! Builds a simulated network from a TOML file (or the built-in default
//! topology), runs it for the configured duration, and prints a JSON report.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dvr_sim::{Network, SimConfig};

/// Distance-vector routing simulator
#[derive(Parser, Debug)]
#[command(name = "dvr-sim", version, about = "Distance-vector routing simulator")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "dvr-sim.toml")]
    config: PathBuf,

    /// Override the number of simulated seconds to run.
    #[arg(long)]
    duration: Option<u64>,

    /// Override the periodic tick interval in seconds.
    #[arg(long)]
    tick_interval: Option<u64>,

    /// Never advertise a route back out of its next-hop port.
    #[arg(long)]
    split_horizon: bool,

    /// Advertise routes back to their next hop as unreachable.
    #[arg(long)]
    poison_reverse: bool,

    /// Keep expired routes as unreachable for one more TTL.
    #[arg(long)]
    poison_expired: bool,

    /// Send the full table on a link as soon as it comes up.
    #[arg(long)]
    send_on_link_up: bool,

    /// Poison routes through a failed link instead of dropping them.
    #[arg(long)]
    poison_on_link_down: bool,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long)]
    log_format: Option<String>,

    /// Print the final routing tables as text instead of the JSON report.
    #[arg(long)]
    tables: bool,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        init_tracing(args.log_level.as_deref().unwrap_or("info"), "text");
        let config = SimConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    // Load configuration
    let mut config = SimConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    init_tracing(&config.logging.level, &config.logging.format);

    if let Some(duration) = args.duration {
        config.sim.duration = duration;
    }
    if let Some(tick_interval) = args.tick_interval {
        config.sim.tick_interval = tick_interval;
    }
    config.override_loop_suppression(args.split_horizon, args.poison_reverse)?;
    config.router.poison_expired |= args.poison_expired;
    config.router.send_on_link_up |= args.send_on_link_up;
    config.router.poison_on_link_down |= args.poison_on_link_down;

    tracing::info!("dvr-sim v{}", env!("CARGO_PKG_VERSION"));

    let mut network = Network::from_config(&config)?;
    let report = network.run()?;

    tracing::info!(
        delivered = report.delivered.len(),
        lost = report.lost.len(),
        ended_at = report.ended_at,
        "simulation finished"
    );

    if args.tables {
        println!("{}", report.tables());
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
