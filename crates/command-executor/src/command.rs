//! Command type for building executable commands

use async_process::Command as AsyncCommand;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

/// Shell used for commands built from a single script string
pub const DEFAULT_SHELL: &str = "sh";

/// A command to be executed, `Clone` so one description can spawn it repeatedly
///
/// A command is either an argument list (`Command::new("docker").arg("kill")`) or a
/// shell string (`Command::shell("screen -ls | grep robot")`). The latter is passed
/// verbatim as the single `-c` argument of [`DEFAULT_SHELL`], so it is interpreted
/// by exactly one shell layer.
#[derive(Debug, Clone)]
pub struct Command {
    /// The program to execute
    program: OsString,
    /// The arguments to pass to the program
    args: Vec<OsString>,
    /// Environment variables to set
    env: HashMap<OsString, OsString>,
    /// Name used to label output and errors
    name: Option<String>,
    /// The script, when this command was built with [`Command::shell`]
    script: Option<String>,
}

impl Command {
    /// Create a new command for the given program
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            env: HashMap::new(),
            name: None,
            script: None,
        }
    }

    /// Create a command that runs `script` through [`DEFAULT_SHELL`]
    pub fn shell(script: impl Into<String>) -> Self {
        let script = script.into();
        let mut cmd = Self::new(DEFAULT_SHELL);
        cmd.arg("-c").arg(&script);
        cmd.script = Some(script);
        cmd
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Set an environment variable
    pub fn env<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.env
            .insert(key.as_ref().to_owned(), val.as_ref().to_owned());
        self
    }

    /// Set the name used to label this command's output
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Get the program name
    pub fn get_program(&self) -> &OsStr {
        &self.program
    }

    /// Get the arguments
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get the environment variables
    pub fn get_envs(&self) -> &HashMap<OsString, OsString> {
        &self.env
    }

    /// Get the shell script, if this is a shell command
    pub fn get_script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Label for logs and errors, falling back to the program name
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Render the command as a single line for logging
    pub fn display(&self) -> String {
        if let Some(script) = &self.script {
            return script.clone();
        }
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// Prepare this command for execution by converting to an `async_process::Command`
    pub fn prepare(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.program);

        cmd.args(&self.args);

        cmd.envs(&self.env);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_creation() {
        let cmd = Command::new("echo");
        assert_eq!(cmd.get_program(), "echo");
        assert_eq!(cmd.get_args().len(), 0);
        assert_eq!(cmd.get_script(), None);
    }

    #[test]
    fn test_shell_command_passes_script_as_one_argument() {
        let script = r#"ssh -t alice@host "bash -c 'docker kill cntr_x'""#;
        let cmd = Command::shell(script);

        assert_eq!(cmd.get_program(), DEFAULT_SHELL);
        assert_eq!(cmd.get_args().len(), 2);
        assert_eq!(cmd.get_args()[0], "-c");
        assert_eq!(cmd.get_args()[1], script);
        assert_eq!(cmd.get_script(), Some(script));
        assert_eq!(cmd.display(), script);
    }

    #[test]
    fn test_named_command_with_env() {
        let mut cmd = Command::new("echo");
        cmd.args(["hello", "world"])
            .env("ROS_DOMAIN_ID", "7")
            .name("greeter");

        assert_eq!(cmd.get_args().len(), 2);
        assert_eq!(
            cmd.get_envs().get(OsStr::new("ROS_DOMAIN_ID")),
            Some(&OsString::from("7"))
        );
        assert_eq!(cmd.label(), "greeter");
        assert_eq!(cmd.display(), "echo hello world");
    }

    #[test]
    fn test_label_defaults_to_program() {
        let cmd = Command::new("screen");
        assert_eq!(cmd.label(), "screen");
    }
}
