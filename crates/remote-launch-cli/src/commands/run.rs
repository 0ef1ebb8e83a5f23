use anyhow::{Context, Result};
use command_executor::LocalLauncher;
use futures::future::join_all;
use launch_description::LaunchDescription;
use remote_launch::ResolutionContext;
use tracing::{error, info};

pub async fn run(description: &LaunchDescription, ctx: &ResolutionContext) -> Result<()> {
    let plans = super::plans(description, ctx)?;
    if plans.is_empty() {
        info!("no actions to launch");
        return Ok(());
    }

    let launcher = LocalLauncher;
    let mut running = Vec::with_capacity(plans.len());
    for plan in &plans {
        match plan.start(&launcher).await {
            Ok(launch) => running.push(launch),
            Err(e) => {
                for launch in join_all(running.into_iter().map(|launch| launch.abort())).await {
                    if let Err(abort_err) = launch {
                        error!(error = %abort_err, "failed to abort a started launch");
                    }
                }
                return Err(e).with_context(|| format!("Failed to start {}", plan.process_name));
            }
        }
    }
    info!(count = running.len(), "all launches started");

    for outcome in join_all(running.into_iter().map(|launch| launch.wait())).await {
        match outcome {
            Ok(outcome) => info!(
                process = %outcome.process_name,
                launch = ?outcome.launch.code,
                monitor = ?outcome.monitor.code,
                "launch ended"
            ),
            Err(e) => error!(error = %e, "lost track of a launch"),
        }
    }

    Ok(())
}
