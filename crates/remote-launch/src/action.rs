//! The `docker_run_remote_ssh` launch action
//!
//! An action owns one [`SessionIdentity`] and the commands composed from it.
//! Planning resolves everything to plain strings and evaluates the condition
//! gate once; starting a plan spawns the companion and then the launch
//! subprocess, with no synchronization between them beyond that order.

use crate::composer::{CommandComposer, ComposedCommand, LaunchTarget, Payload};
use crate::condition::Condition;
use crate::error::Result;
use crate::fragment::ResolutionContext;
use crate::identity::{IdentifierAllocator, SessionIdentity};
use crate::monitor::{
    HANDLER_EXECUTABLE, HANDLER_NAME_PREFIX, MonitorConfig, MonitorInvocation, monitor_namespace,
};
use command_executor::{Command, ExitStatus, Launcher, ProcessEvent, ProcessHandle, Target};
use futures::StreamExt;
use futures::future;
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where subprocess output goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Print `[name] line` to stdout
    #[default]
    Screen,
    /// Emit each line as a tracing event
    Log,
}

impl FromStr for OutputMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "screen" => Ok(OutputMode::Screen),
            "log" => Ok(OutputMode::Log),
            other => Err(crate::error::Error::construction(format!(
                "unknown output mode '{}', expected 'screen' or 'log'",
                other
            ))),
        }
    }
}

/// Settings shared by every action in a launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    /// Companion executable
    pub monitor_executable: String,
    /// How often the companion checks the screen session
    pub poll_interval: Duration,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            monitor_executable: HANDLER_EXECUTABLE.to_string(),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Run a container on a remote host over SSH inside a detached screen session
#[derive(Debug, Clone)]
pub struct DockerRunRemoteSsh {
    target: LaunchTarget,
    payload: Payload,
    identity: SessionIdentity,
    condition: Condition,
    output: OutputMode,
    composed: ComposedCommand,
}

impl DockerRunRemoteSsh {
    /// Create an action with a freshly allocated identity
    pub fn new(target: LaunchTarget, payload: Payload) -> Self {
        Self::with_identity(target, payload, IdentifierAllocator::new().allocate())
    }

    /// Create an action with a given identity
    pub fn with_identity(target: LaunchTarget, payload: Payload, identity: SessionIdentity) -> Self {
        let composed = CommandComposer::new().compose(&target, &payload, &identity);
        Self {
            target,
            payload,
            identity,
            condition: Condition::Always,
            output: OutputMode::Screen,
            composed,
        }
    }

    /// Gate the launch
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Choose where output goes
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// SSH destination
    pub fn target(&self) -> &LaunchTarget {
        &self.target
    }

    /// Remote workload
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// This launch's identity
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// The launch gate
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// The composed, still unresolved, commands
    pub fn composed(&self) -> &ComposedCommand {
        &self.composed
    }

    /// Resolve everything; `None` when the condition gate is false
    pub fn plan(&self, ctx: &ResolutionContext, settings: &LaunchSettings) -> Result<Option<LaunchPlan>> {
        if !self.condition.evaluate(ctx)? {
            info!(session = %self.identity.short_id(), "condition is false, skipping launch");
            return Ok(None);
        }

        let process_name = self.composed.process_name.resolve(ctx)?;
        let teardown_command = self.composed.teardown_command.resolve(ctx)?;
        let monitor = MonitorInvocation {
            executable: settings.monitor_executable.clone(),
            name: format!("{}{}", HANDLER_NAME_PREFIX, self.identity.short_id()),
            namespace: monitor_namespace(self.target.host()).resolve(ctx)?,
            poll_interval_secs: settings.poll_interval.as_secs().max(1),
            config: MonitorConfig {
                screen_process_name: process_name.clone(),
                docker_kill_command: teardown_command.clone(),
            },
        };

        Ok(Some(LaunchPlan {
            process_name,
            container_name: self.composed.container_name.resolve(ctx)?,
            launch_command: self.composed.launch_command.resolve(ctx)?,
            teardown_command,
            output: self.output,
            monitor,
        }))
    }
}

/// A resolved launch, ready to start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    /// Screen session name
    pub process_name: String,
    /// Remote container name
    pub container_name: String,
    /// Local shell command starting the session
    pub launch_command: String,
    /// Shell command killing the container
    pub teardown_command: String,
    /// Where output goes
    pub output: OutputMode,
    /// Companion invocation
    pub monitor: MonitorInvocation,
}

impl LaunchPlan {
    /// The launch subprocess
    pub fn launch_process(&self) -> Command {
        let mut cmd = Command::shell(&self.launch_command);
        cmd.name(&self.process_name);
        cmd
    }

    /// Spawn the companion, then the launch subprocess under a pseudo-terminal
    ///
    /// The companion tolerates a session that does not exist yet, so it goes
    /// first: a launch is never left running without something to tear it
    /// down. If the launch cannot be spawned the companion is stopped again.
    pub async fn start<L>(&self, launcher: &L) -> Result<RunningLaunch<L>>
    where
        L: Launcher<Target = Target>,
        L::EventStream: 'static,
    {
        let monitor_cmd = self.monitor.command()?;
        info!(monitor = %monitor_cmd.label(), "starting companion process");
        let (monitor_events, mut monitor_handle) =
            launcher.launch(&Target::Command, monitor_cmd).await?;

        info!(process = %self.process_name, "starting remote launch");
        let (launch_events, launch_handle) =
            match launcher.launch(&Target::Terminal, self.launch_process()).await {
                Ok(launched) => launched,
                Err(e) => {
                    stop_companion(&mut monitor_handle).await;
                    return Err(e.into());
                }
            };

        let launch_name = self.process_name.clone();
        let monitor_name = self.monitor.name.clone();
        let events = stream::select(
            launch_events.map(move |e| (launch_name.clone(), e)),
            monitor_events.map(move |e| (monitor_name.clone(), e)),
        )
        .boxed();

        Ok(RunningLaunch {
            process_name: self.process_name.clone(),
            output: self.output,
            events,
            launch: launch_handle,
            monitor: monitor_handle,
        })
    }
}

/// Exit statuses of a finished launch, reported as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// Screen session name
    pub process_name: String,
    /// How the launch subprocess ended
    pub launch: ExitStatus,
    /// How the companion ended
    pub monitor: ExitStatus,
}

/// A started launch
pub struct RunningLaunch<L: Launcher> {
    process_name: String,
    output: OutputMode,
    events: BoxStream<'static, (String, ProcessEvent)>,
    launch: L::Handle,
    monitor: L::Handle,
}

impl<L: Launcher> RunningLaunch<L> {
    /// Screen session name
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Forward output until the launch subprocess exits, then stop the companion
    ///
    /// A launch that dies before its session ever appears (unreachable host,
    /// refused connection) would otherwise leave the companion waiting forever.
    pub async fn wait(self) -> Result<LaunchOutcome> {
        let RunningLaunch {
            process_name,
            output,
            mut events,
            mut launch,
            mut monitor,
        } = self;

        let supervise = async {
            let launch_status = launch.wait().await;
            debug!(process = %process_name, "launch process exited, stopping companion");
            let monitor_status = stop_companion(&mut monitor).await;
            (launch_status, monitor_status)
        };
        let (launch_status, monitor_status) = forward_while(&mut events, output, supervise).await;
        let launch = launch_status?;
        let monitor = monitor_status?;

        if !launch.success() {
            warn!(process = %process_name, code = ?launch.code, "launch process exited unsuccessfully");
        }
        info!(process = %process_name, "remote launch finished");

        Ok(LaunchOutcome {
            process_name,
            launch,
            monitor,
        })
    }

    /// Tear the launch down early: the companion first, then the launch subprocess
    pub async fn abort(self) -> Result<LaunchOutcome> {
        let RunningLaunch {
            process_name,
            output,
            mut events,
            mut launch,
            mut monitor,
        } = self;

        warn!(process = %process_name, "aborting remote launch");
        let stop = async {
            let monitor_status = stop_companion(&mut monitor).await;
            if let Err(e) = launch.terminate().await {
                debug!(process = %process_name, error = %e, "launch process already gone");
            }
            (launch.wait().await, monitor_status)
        };
        let (launch_status, monitor_status) = forward_while(&mut events, output, stop).await;

        Ok(LaunchOutcome {
            process_name,
            launch: launch_status?,
            monitor: monitor_status?,
        })
    }
}

/// Keep forwarding output while `work` runs, and until both processes close it
///
/// Dropping the stream early would close the pipes under a companion that is
/// still logging its teardown.
async fn forward_while<F: Future>(
    events: &mut BoxStream<'static, (String, ProcessEvent)>,
    output: OutputMode,
    work: F,
) -> F::Output {
    let forward = async {
        while let Some((source, event)) = events.next().await {
            if let Some(line) = event.line() {
                forward_line(output, &source, line);
            }
        }
    };
    let ((), result) = future::join(forward, work).await;
    result
}

/// SIGTERM the companion so it runs its teardown, and wait for it to finish
async fn stop_companion<H: ProcessHandle>(monitor: &mut H) -> command_executor::Result<ExitStatus> {
    if let Err(e) = monitor.terminate().await {
        debug!(error = %e, "companion already gone");
    }
    monitor.wait().await
}

fn forward_line(output: OutputMode, source: &str, line: &str) {
    match output {
        OutputMode::Screen => println!("[{}] {}", source, line),
        OutputMode::Log => info!(process = %source, "{}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragments;

    fn action() -> DockerRunRemoteSsh {
        DockerRunRemoteSsh::with_identity(
            LaunchTarget::new("alice", Fragments::reference("robot")),
            Payload::new("myimg"),
            SessionIdentity::from_full_id("0123456789abcdef0123456789abcdef").unwrap(),
        )
    }

    #[test]
    fn test_plan_resolves_everything() {
        let ctx = ResolutionContext::new().with_var("robot", "my-bot.lan");
        let plan = action().plan(&ctx, &LaunchSettings::default()).unwrap().unwrap();

        assert_eq!(plan.process_name, "my-bot_lan_0123456789ab");
        assert_eq!(plan.container_name, "cntr_my-bot_lan_0123456789ab");
        assert_eq!(plan.monitor.namespace, "machine_my_bot_lan");
        assert_eq!(plan.monitor.name, "remote_docker_process_handler_0123456789ab");
        assert_eq!(plan.monitor.config.screen_process_name, plan.process_name);
        assert_eq!(plan.monitor.config.docker_kill_command, plan.teardown_command);
        assert_eq!(plan.launch_process().get_script(), Some(plan.launch_command.as_str()));
    }

    #[test]
    fn test_false_condition_yields_no_plan() {
        let ctx = ResolutionContext::new().with_var("remote", "false");
        let action = action().with_condition(Condition::If(Fragments::reference("remote")));
        assert!(action.plan(&ctx, &LaunchSettings::default()).unwrap().is_none());
    }

    #[test]
    fn test_unresolved_host_fails_planning() {
        assert!(action().plan(&ResolutionContext::new(), &LaunchSettings::default()).is_err());
    }

    #[test]
    fn test_fresh_actions_get_distinct_identities() {
        let a = DockerRunRemoteSsh::new(LaunchTarget::new("u", "h"), Payload::new("i"));
        let b = DockerRunRemoteSsh::new(LaunchTarget::new("u", "h"), Payload::new("i"));
        assert_ne!(a.identity(), b.identity());
        assert_ne!(a.composed().process_name, b.composed().process_name);
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("log".parse::<OutputMode>().unwrap(), OutputMode::Log);
        assert!("file".parse::<OutputMode>().is_err());
    }
}
