//! Companion process: watches one screen session and tears its launch down

use anyhow::{Context, Result};
use clap::Parser;
use command_executor::LocalLauncher;
use remote_launch::{MonitorConfig, RemoteProcessHandler};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::info;

#[path = "../logging.rs"]
mod logging;

#[derive(Parser)]
#[command(name = "remote-process-handler")]
#[command(about = "Tear down a remote container when its screen session ends")]
struct Args {
    /// Node name
    #[arg(long)]
    name: String,

    /// Node namespace
    #[arg(long)]
    namespace: String,

    /// Seconds between session checks
    #[arg(long, default_value_t = 2)]
    poll_interval_secs: u64,

    /// MonitorConfig as JSON
    #[arg(long)]
    config: String,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level.as_deref())?;

    let config = MonitorConfig::from_json(&args.config).context("Invalid --config")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM, SIGHUP] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .with_context(|| format!("Failed to register handler for signal {}", signal))?;
    }

    info!(
        name = %args.name,
        namespace = %args.namespace,
        session = %config.screen_process_name,
        "watching session"
    );

    let handler = RemoteProcessHandler::new(config, LocalLauncher)
        .with_poll_interval(Duration::from_secs(args.poll_interval_secs.max(1)));
    let report = smol::block_on(handler.run(&shutdown))?;

    info!(
        screen_quit = ?report.screen_quit.and_then(|s| s.code),
        docker_kill = ?report.docker_kill.and_then(|s| s.code),
        "teardown complete"
    );
    Ok(())
}
