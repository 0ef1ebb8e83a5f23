//! Companion process behaviour
//!
//! The handler watches the local screen session named in its
//! [`MonitorConfig`]. When the session ends, or the handler is asked to shut
//! down, it quits the session and runs the configured docker kill command.
//! Neither command's exit status is treated as an error: a container that is
//! already gone is the expected outcome of a normal shutdown.

use crate::error::Result;
use crate::monitor::MonitorConfig;
use async_io::Timer;
use command_executor::{Command, ExitStatus, Launcher, Target};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

const SHUTDOWN_CHECK: Duration = Duration::from_millis(100);

/// Why watching stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The screen session went away
    SessionEnded,
    /// Shutdown was requested
    Shutdown,
}

/// Session state as seen by successive checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not seen yet; the launch may still be coming up
    Pending,
    /// Seen and still listed
    Running,
    /// Seen before, now gone
    Ended,
}

/// Tracks whether a session has come up and gone away
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionWatch {
    seen: bool,
}

impl SessionWatch {
    /// Record one check
    pub fn observe(&mut self, listed: bool) -> SessionState {
        match (listed, self.seen) {
            (true, _) => {
                self.seen = true;
                SessionState::Running
            }
            (false, true) => SessionState::Ended,
            (false, false) => SessionState::Pending,
        }
    }
}

/// Exit statuses of the two teardown commands, `None` if one could not start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// `screen -S <name> -X quit`
    pub screen_quit: Option<ExitStatus>,
    /// The configured docker kill command
    pub docker_kill: Option<ExitStatus>,
}

/// Watches one launch and tears it down
pub struct RemoteProcessHandler<L> {
    config: MonitorConfig,
    launcher: L,
    poll_interval: Duration,
}

impl<L> RemoteProcessHandler<L>
where
    L: Launcher<Target = Target>,
{
    /// Create a handler
    pub fn new(config: MonitorConfig, launcher: L) -> Self {
        Self {
            config,
            launcher,
            poll_interval: Duration::from_secs(2),
        }
    }

    /// How often the session is checked
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The configuration this handler was started with
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Command that closes the local screen session
    pub fn screen_quit_command(&self) -> Command {
        let mut cmd = Command::shell(format!(
            "screen -S {} -X quit",
            self.config.screen_process_name
        ));
        cmd.name("screen-quit");
        cmd
    }

    /// Command that kills the remote container
    pub fn docker_kill_command(&self) -> Command {
        let mut cmd = Command::shell(&self.config.docker_kill_command);
        cmd.name("docker-kill");
        cmd
    }

    /// Whether `screen -ls` currently lists the session
    pub async fn session_running(&self) -> Result<bool> {
        let mut cmd = Command::new("screen");
        cmd.arg("-ls").arg(&self.config.screen_process_name).name("screen-ls");
        // `screen -ls` exits non-zero even when sessions exist, so only the listing counts
        let result = self.launcher.execute(&Target::Command, cmd).await?;
        Ok(session_listed(&result.output, &self.config.screen_process_name))
    }

    /// Wait until the session ends or `shutdown` is set
    pub async fn watch(&self, shutdown: &AtomicBool) -> Result<WatchExit> {
        let mut watch = SessionWatch::default();
        let mut since_check = self.poll_interval;

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!(session = %self.config.screen_process_name, "shutdown requested");
                return Ok(WatchExit::Shutdown);
            }

            if since_check >= self.poll_interval {
                since_check = Duration::ZERO;
                let listed = match self.session_running().await {
                    Ok(listed) => listed,
                    Err(e) => {
                        warn!(error = %e, "could not list screen sessions");
                        false
                    }
                };
                match watch.observe(listed) {
                    SessionState::Pending => {
                        debug!(session = %self.config.screen_process_name, "session not up yet")
                    }
                    SessionState::Running => {}
                    SessionState::Ended => {
                        info!(session = %self.config.screen_process_name, "session ended");
                        return Ok(WatchExit::SessionEnded);
                    }
                }
            }

            Timer::after(SHUTDOWN_CHECK).await;
            since_check += SHUTDOWN_CHECK;
        }
    }

    /// Quit the session and kill the container, reporting but not judging the results
    pub async fn teardown(&self) -> TeardownReport {
        info!(session = %self.config.screen_process_name, "terminating session");
        let screen_quit = self.run_quietly(self.screen_quit_command()).await;

        info!(command = %self.config.docker_kill_command, "killing container");
        let docker_kill = self.run_quietly(self.docker_kill_command()).await;

        TeardownReport {
            screen_quit,
            docker_kill,
        }
    }

    /// Watch, then tear down
    pub async fn run(&self, shutdown: &AtomicBool) -> Result<TeardownReport> {
        self.watch(shutdown).await?;
        Ok(self.teardown().await)
    }

    async fn run_quietly(&self, cmd: Command) -> Option<ExitStatus> {
        let label = cmd.label();
        match self.launcher.execute(&Target::Command, cmd).await {
            Ok(result) => {
                if !result.status.success() {
                    warn!(
                        command = %label,
                        code = ?result.status.code,
                        output = %result.output.trim_end(),
                        "teardown step failed, target likely already stopped"
                    );
                }
                Some(result.status)
            }
            Err(e) => {
                warn!(command = %label, error = %e, "teardown step could not run");
                None
            }
        }
    }
}

/// Whether a `screen -ls` listing contains `<pid>.<name>`
pub fn session_listed(listing: &str, name: &str) -> bool {
    listing.lines().any(|line| {
        let Some(entry) = line.split_whitespace().next() else {
            return false;
        };
        match entry.split_once('.') {
            Some((pid, session)) => {
                !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit()) && session == name
            }
            None => false,
        }
    })
}
