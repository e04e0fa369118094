pub mod file_lock;

use anyhow::Context;
use clap::{ArgAction, Parser};
use env_logger::Builder;
use log::{LevelFilter, info, warn};
use std::time::Duration;

use nmsteer::{ApManager, SteeringConfig};

use crate::file_lock::acquire_daemon_lock;

#[derive(Parser, Debug)]
#[command(name = "nmsteerd")]
#[command(about = "Keeps Wi-Fi connections on the best band of their network")]
#[command(disable_version_flag = true)]
#[command(version)]
struct Args {
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// Seconds to wait after scan results before a steering pass.
    #[arg(long, default_value_t = 10)]
    debounce_secs: u64,

    /// Track access points but never steer on scan results.
    #[arg(long)]
    no_steering: bool,

    /// Move every device to this band once at startup.
    #[arg(long, value_parser = ["a", "bg"])]
    band: Option<String>,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> SteeringConfig {
        SteeringConfig::new()
            .with_debounce(Duration::from_secs(self.debounce_secs))
            .with_steering_enabled(!self.no_steering)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter(Some("nmsteer"), level)
        .filter(Some("nmsteer_daemon"), level)
        .parse_default_env()
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.version {
        println!("nmsteerd {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(args.verbose);

    let _lock = match acquire_daemon_lock() {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    runtime.block_on(serve(args))
}

async fn serve(args: Args) -> anyhow::Result<()> {
    let manager = ApManager::system(args.config())
        .await
        .context("failed to connect to NetworkManager")?;

    let tracked = manager
        .track_all_devices()
        .await
        .context("failed to list wireless devices")?;
    if tracked == 0 {
        warn!("No wireless devices found; waiting for shutdown");
    }

    if let Some(band) = &args.band {
        manager
            .request_band(band)
            .await
            .with_context(|| format!("failed to request band {band}"))?;
    }

    info!("nmsteerd running");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("Shutting down");
    manager.shutdown();
    Ok(())
}
