//! Subcommand implementations

pub mod compose;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use launch_description::LaunchDescription;
use remote_launch::{LaunchPlan, ResolutionContext};

/// Resolve every action, dropping the ones whose condition is false
pub fn plans(description: &LaunchDescription, ctx: &ResolutionContext) -> Result<Vec<LaunchPlan>> {
    let settings = description.settings.launch_settings();
    let mut plans = Vec::with_capacity(description.actions.len());
    for (index, action) in description.actions.iter().enumerate() {
        let plan = action
            .plan(ctx, &settings)
            .with_context(|| format!("Failed to resolve action #{}", index + 1))?;
        plans.extend(plan);
    }
    Ok(plans)
}
