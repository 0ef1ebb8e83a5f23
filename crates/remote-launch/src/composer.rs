//! Composition of the launch and teardown shell commands
//!
//! The launch command passes through four shells before the workload runs:
//!
//! 1. the local `sh -c` that executes the whole string,
//! 2. the `bash -i -c` started inside the detached `screen` session,
//! 3. the remote login shell that `ssh` hands its command to,
//! 4. the remote `bash -i -c` that finally runs `docker run`.
//!
//! Layer 1 double-quotes layer 2, layer 2 single-quotes layer 3, and layer 3
//! double-quotes layer 4. Because layer 4's double quotes sit inside layer 1's
//! double quotes, they are written as `\"` so that layer 1 strips only the
//! backslashes. `$outer_stdout` is inside layer 1's double quotes and is
//! therefore expanded locally, which is what sends the remote output back to
//! the caller's stdout.

use crate::fragment::Fragments;
use crate::identity::SessionIdentity;

/// Prefix of every remote container name
pub const CONTAINER_PREFIX: &str = "cntr_";

/// Records the caller's stdout (fd 3 inside the group) in `$outer_stdout`
const CAPTURE_OUTER_STDOUT: &str =
    "{ outer_stdout=$(readlink -f /proc/self/fd/3); } 3>&1 && ";

/// Where to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    user: Fragments,
    host: Fragments,
    port: Option<Fragments>,
}

impl LaunchTarget {
    /// Target `user@host` on the default SSH port
    pub fn new(user: impl Into<Fragments>, host: impl Into<Fragments>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            port: None,
        }
    }

    /// Use a custom SSH port
    pub fn with_port(mut self, port: impl Into<Fragments>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// SSH user
    pub fn user(&self) -> &Fragments {
        &self.user
    }

    /// Remote host
    pub fn host(&self) -> &Fragments {
        &self.host
    }

    /// Custom SSH port, if any
    pub fn port(&self) -> Option<&Fragments> {
        self.port.as_ref()
    }

    /// `ssh [-p <port>] -t <user>@<host>`
    fn ssh_invocation(&self) -> Fragments {
        let mut ssh = Fragments::literal("ssh");
        if let Some(port) = &self.port {
            ssh.push_str(" -p ");
            ssh.append(port);
        }
        ssh.push_str(" -t ");
        ssh.append(&self.user);
        ssh.push_str("@");
        ssh.append(&self.host);
        ssh
    }
}

/// What to run on the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    image: Fragments,
    options: Option<Fragments>,
    command: Option<Fragments>,
}

impl Payload {
    /// Run `image` with its default command
    pub fn new(image: impl Into<Fragments>) -> Self {
        Self {
            image: image.into(),
            options: None,
            command: None,
        }
    }

    /// Extra `docker run` options, placed before the image
    pub fn with_options(mut self, options: impl Into<Fragments>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Command to run inside the container, placed after the image
    pub fn with_command(mut self, command: impl Into<Fragments>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Container image
    pub fn image(&self) -> &Fragments {
        &self.image
    }

    /// `docker run` options
    pub fn options(&self) -> Option<&Fragments> {
        self.options.as_ref()
    }

    /// In-container command
    pub fn command(&self) -> Option<&Fragments> {
        self.command.as_ref()
    }
}

/// The two commands derived from one launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedCommand {
    /// Name of the screen session, also the suffix of the container name
    pub process_name: Fragments,
    /// `cntr_<process_name>`
    pub container_name: Fragments,
    /// Local command that starts the detached session and the workload
    pub launch_command: Fragments,
    /// Command that kills the remote container
    pub teardown_command: Fragments,
}

/// Builds [`ComposedCommand`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandComposer;

impl CommandComposer {
    /// Create a composer
    pub fn new() -> Self {
        Self
    }

    /// Compose both commands for one launch
    pub fn compose(
        &self,
        target: &LaunchTarget,
        payload: &Payload,
        identity: &SessionIdentity,
    ) -> ComposedCommand {
        let process_name = identity.session_name(target.host());
        let container_name = Fragments::literal(CONTAINER_PREFIX).with(&process_name);

        let launch_command = launch_command(target, payload, &process_name, &container_name);
        let teardown_command = teardown_command(target, &container_name);

        ComposedCommand {
            process_name,
            container_name,
            launch_command,
            teardown_command,
        }
    }
}

/// `docker run --name <container> [<options>] <image> [<command>]`
fn docker_run(payload: &Payload, container_name: &Fragments) -> Fragments {
    let mut run = Fragments::literal("docker run --name ").with(container_name);
    if let Some(options) = payload.options() {
        run.push_str(" ");
        run.append(options);
    }
    run.push_str(" ");
    run.append(payload.image());
    if let Some(command) = payload.command() {
        run.push_str(" ");
        run.append(command);
    }
    run
}

fn launch_command(
    target: &LaunchTarget,
    payload: &Payload,
    process_name: &Fragments,
    container_name: &Fragments,
) -> Fragments {
    Fragments::literal(CAPTURE_OUTER_STDOUT)
        .with_str("screen -D -m -S ")
        .with(process_name)
        .with_str(" bash -i -c \"")
        .with(&target.ssh_invocation())
        .with_str(" 'bash -i -c \\\"")
        .with(&docker_run(payload, container_name))
        .with_str("\\\"' > $outer_stdout\"")
}

fn teardown_command(target: &LaunchTarget, container_name: &Fragments) -> Fragments {
    target
        .ssh_invocation()
        .with_str(" \"bash -c 'docker kill ")
        .with(container_name)
        .with_str("'\"")
}
