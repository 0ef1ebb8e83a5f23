use crate::Format;
use anyhow::Result;
use launch_description::LaunchDescription;
use remote_launch::ResolutionContext;

pub async fn run(description: &LaunchDescription, ctx: &ResolutionContext, format: Format) -> Result<()> {
    let plans = super::plans(description, ctx)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&plans)?),
        Format::Text => {
            if plans.is_empty() {
                println!("No actions to launch");
            }
            for plan in &plans {
                println!("{}", plan.process_name);
                println!("  Container: {}", plan.container_name);
                println!("  Launch:    {}", plan.launch_command);
                println!("  Teardown:  {}", plan.teardown_command);
                println!("  Monitor:   {}", plan.monitor.command()?.display());
                println!();
            }
        }
    }

    Ok(())
}
