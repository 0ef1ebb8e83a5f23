use anyhow::Result;
use launch_description::LaunchDescription;
use remote_launch::ResolutionContext;
use std::path::Path;

pub async fn run(
    path: &Path,
    description: &LaunchDescription,
    ctx: &ResolutionContext,
    strict: bool,
) -> Result<()> {
    println!("Validating {}...", path.display());
    println!("✓ Description valid");
    println!("  Version: {}", description.version);
    println!("  Arguments: {}", description.arguments.len());
    println!("  Actions: {}", description.actions.len());

    if strict {
        let settings = description.settings.launch_settings();
        let mut failures = 0;
        for (index, action) in description.actions.iter().enumerate() {
            match action.plan(ctx, &settings) {
                Ok(Some(plan)) => println!("  ✓ #{} {}", index + 1, plan.process_name),
                Ok(None) => println!("  - #{} skipped by condition", index + 1),
                Err(e) => {
                    failures += 1;
                    println!("  ✗ #{} {}", index + 1, e);
                }
            }
        }
        if failures > 0 {
            anyhow::bail!("{} action(s) failed to resolve", failures);
        }
        println!("✓ All references resolved");
    }

    Ok(())
}
