//! Local process execution backend

use async_process::{Child, Stdio};
use async_trait::async_trait;
use futures::stream::Stream;
use futures_lite::io::{AsyncBufReadExt, BufReader, Lines};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::event::{CarriageReturnFilter, LogFilter, LogSource, NoOpFilter, ProcessEvent, ProcessEventType};
use crate::launcher::Launcher;
use crate::process::{ExitStatus, ProcessHandle};
use crate::target::{PTY_SHELL, PTY_WRAPPER, Target};

/// Launcher for executing processes locally
#[derive(Debug, Clone, Copy)]
pub struct LocalLauncher;

/// A handle to control a local process; the process is killed when the handle drops
pub struct LocalProcessHandle {
    child: Child,
}

/// Stream of process events
pub struct ProcessEventStream {
    stdout: Option<Lines<BufReader<async_process::ChildStdout>>>,
    stderr: Option<Lines<BufReader<async_process::ChildStderr>>>,
    filter: Box<dyn LogFilter + Send>,
    started_sent: bool,
    child_id: u32,
}

#[async_trait]
impl Launcher for LocalLauncher {
    type Target = Target;
    type EventStream = ProcessEventStream;
    type Handle = LocalProcessHandle;

    async fn launch(
        &self,
        target: &Self::Target,
        command: Command,
    ) -> Result<(Self::EventStream, Self::Handle)> {
        let label = command.label();
        let (command, filter): (Command, Box<dyn LogFilter + Send>) = match target {
            Target::Command => (command, Box::new(NoOpFilter)),
            Target::Terminal => (wrap_in_terminal(&command), Box::new(CarriageReturnFilter)),
        };

        tracing::debug!(process = %label, command = %command.display(), "spawning local process");

        let mut async_cmd = command.prepare();
        async_cmd.stdin(Stdio::null());
        async_cmd.stdout(Stdio::piped());
        async_cmd.stderr(Stdio::piped());

        let mut child = async_cmd
            .spawn()
            .map_err(|e| Error::spawn_failed(e.to_string()).with_process_context(&label))?;

        let child_id = child.id();

        let stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
        let stderr = child.stderr.take().map(|s| BufReader::new(s).lines());

        let events = ProcessEventStream {
            stdout,
            stderr,
            filter,
            started_sent: false,
            child_id,
        };

        let handle = LocalProcessHandle { child };

        Ok((events, handle))
    }
}

/// Run `command` under a pseudo-terminal allocated by `script`
///
/// `script -c` hands its argument to `$SHELL`, so `SHELL` is pinned to
/// [`PTY_SHELL`] and the full argument list is escaped for it. A
/// [`Command::shell`] script is therefore still read by exactly one `sh -c`.
fn wrap_in_terminal(command: &Command) -> Command {
    let mut wrapped = Command::new(PTY_WRAPPER);
    wrapped
        .args(["-q", "-e", "-f", "-c"])
        .arg(command_to_shell_string(command))
        .arg("/dev/null");
    for (key, value) in command.get_envs() {
        wrapped.env(key, value);
    }
    wrapped.env("SHELL", PTY_SHELL).name(command.label());
    wrapped
}

/// Convert an argument-list Command to a shell-escaped string
fn command_to_shell_string(command: &Command) -> String {
    let program = shell_escape(command.get_program().to_string_lossy().into_owned());
    let args: Vec<String> = command
        .get_args()
        .iter()
        .map(|arg| shell_escape(arg.to_string_lossy().into_owned()))
        .collect();

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Escape a string for safe inclusion in a shell command
fn shell_escape(s: String) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.contains(|c: char| c.is_whitespace() || "\"'\\$`!*?<>|&;()[]{}#~".contains(c)) {
        // Close the quote, emit an escaped quote, reopen
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    } else {
        s
    }
}

#[async_trait]
impl ProcessHandle for LocalProcessHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self
            .child
            .status()
            .await
            .map_err(|e| Error::wait_failed(e.to_string()))?;

        Ok(status.into())
    }

    async fn terminate(&mut self) -> Result<()> {
        self.send_signal(15).await
    }

    async fn kill(&mut self) -> Result<()> {
        self.send_signal(9).await
    }

    async fn interrupt(&mut self) -> Result<()> {
        self.send_signal(2).await
    }
}

impl LocalProcessHandle {
    async fn send_signal(&mut self, signal: i32) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            let sig = Signal::try_from(signal)
                .map_err(|e| Error::signal_failed(signal, e.to_string()))?;
            let pid = Pid::from_raw(self.child.id() as i32);
            signal::kill(pid, sig).map_err(|e| Error::signal_failed(signal, e.to_string()))?;
        }

        #[cfg(not(unix))]
        {
            self.child
                .kill()
                .map_err(|e| Error::signal_failed(signal, e.to_string()))?;
        }

        Ok(())
    }
}

impl Drop for LocalProcessHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

impl Stream for ProcessEventStream {
    type Item = ProcessEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Send Started event first
        if !self.started_sent {
            self.started_sent = true;
            let event = ProcessEvent::new(ProcessEventType::Started { pid: self.child_id });
            return Poll::Ready(Some(event));
        }

        if let Some(stdout) = &mut self.stdout {
            match Pin::new(stdout).poll_next(cx) {
                Poll::Ready(Some(Ok(line))) => {
                    if let Some(filtered) = self.filter.filter(&line, LogSource::Stdout) {
                        let event = ProcessEvent::new_with_data(
                            ProcessEventType::Stdout,
                            filtered.to_string(),
                        );
                        return Poll::Ready(Some(event));
                    }
                    return self.poll_next(cx);
                }
                Poll::Ready(Some(Err(_))) | Poll::Ready(None) => {
                    self.stdout = None;
                }
                Poll::Pending => {}
            }
        }

        if let Some(stderr) = &mut self.stderr {
            match Pin::new(stderr).poll_next(cx) {
                Poll::Ready(Some(Ok(line))) => {
                    if let Some(filtered) = self.filter.filter(&line, LogSource::Stderr) {
                        let event = ProcessEvent::new_with_data(
                            ProcessEventType::Stderr,
                            filtered.to_string(),
                        );
                        return Poll::Ready(Some(event));
                    }
                    return self.poll_next(cx);
                }
                Poll::Ready(Some(Err(_))) | Poll::Ready(None) => {
                    self.stderr = None;
                }
                Poll::Pending => {}
            }
        }

        // If both streams are closed, the stream is exhausted
        if self.stdout.is_none() && self.stderr.is_none() {
            return Poll::Ready(None);
        }

        Poll::Pending
    }
}
