//! Execution target types
//!
//! Targets describe HOW a command's standard streams are attached; launchers
//! determine WHERE the command runs.

/// Program used to give a child a pseudo-terminal
pub const PTY_WRAPPER: &str = "script";

/// Shell [`PTY_WRAPPER`] is told to run its command with
pub const PTY_SHELL: &str = "/bin/sh";

/// How a launched command is attached to its output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// Plain child process with piped stdout and stderr
    #[default]
    Command,
    /// Child runs inside a pseudo-terminal whose output is piped back
    ///
    /// Interactive programs (`ssh -t`, `bash -i`, `screen`) behave as if they
    /// were attached to a terminal. Requires util-linux `script`.
    Terminal,
}
