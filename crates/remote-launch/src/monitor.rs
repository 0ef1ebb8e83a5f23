//! Data handed to the companion process
//!
//! The companion runs as a separate OS process, so everything it needs is
//! carried as resolved text in its startup arguments.

use crate::error::Result;
use crate::fragment::Fragments;
use crate::substitution::substitute;
use command_executor::Command;
use serde::{Deserialize, Serialize};

/// Default executable of the companion process
pub const HANDLER_EXECUTABLE: &str = "remote-process-handler";

/// Prefix of the companion's node name, followed by the short id
pub const HANDLER_NAME_PREFIX: &str = "remote_docker_process_handler_";

/// Prefix of the per-host companion namespace
pub const NAMESPACE_PREFIX: &str = "machine_";

/// Startup configuration of the companion process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Screen session to watch and quit
    pub screen_process_name: String,
    /// Command that kills the remote container
    pub docker_kill_command: String,
}

impl MonitorConfig {
    /// Encode as the JSON passed on the command line
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON passed on the command line
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `machine_<host>` with `.` and `-` replaced by `_`
pub fn monitor_namespace(host: &Fragments) -> Fragments {
    let sanitized = substitute(substitute(host, ".", "_"), "-", "_");
    Fragments::literal(NAMESPACE_PREFIX).with(&sanitized)
}

/// A fully resolved companion process invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInvocation {
    /// Program to run
    pub executable: String,
    /// Node name, unique per launch
    pub name: String,
    /// Per-host namespace
    pub namespace: String,
    /// Seconds between session checks
    pub poll_interval_secs: u64,
    /// The configuration payload
    pub config: MonitorConfig,
}

impl MonitorInvocation {
    /// The process command: configuration travels as arguments, not env or stdin
    pub fn command(&self) -> Result<Command> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--name")
            .arg(&self.name)
            .arg("--namespace")
            .arg(&self.namespace)
            .arg("--poll-interval-secs")
            .arg(self.poll_interval_secs.to_string())
            .arg("--config")
            .arg(self.config.to_json()?)
            .name(format!("{}/{}", self.namespace, self.name));
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::ResolutionContext;

    #[test]
    fn test_config_has_exactly_two_keys() {
        let config = MonitorConfig {
            screen_process_name: "h_0123456789ab".into(),
            docker_kill_command: r#"ssh -t a@h "bash -c 'docker kill cntr_h_0123456789ab'""#.into(),
        };
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["docker_kill_command", "screen_process_name"]);

        assert_eq!(MonitorConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let json = r#"{"screen_process_name":"a","docker_kill_command":"b","extra":"c"}"#;
        assert!(MonitorConfig::from_json(json).is_err());
    }

    #[test]
    fn test_namespace_strips_dots_and_dashes() {
        let ns = monitor_namespace(&Fragments::literal("my-robot.local"));
        assert_eq!(ns.resolve(&ResolutionContext::new()).unwrap(), "machine_my_robot_local");
    }

    #[test]
    fn test_invocation_passes_config_as_arguments() {
        let invocation = MonitorInvocation {
            executable: HANDLER_EXECUTABLE.into(),
            name: format!("{}0123456789ab", HANDLER_NAME_PREFIX),
            namespace: "machine_10_0_0_5".into(),
            poll_interval_secs: 2,
            config: MonitorConfig {
                screen_process_name: "10_0_0_5_0123456789ab".into(),
                docker_kill_command: "ssh -t a@10.0.0.5 \"bash -c 'docker kill x'\"".into(),
            },
        };
        let cmd = invocation.command().unwrap();
        let args: Vec<_> = cmd.get_args().iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(cmd.get_program(), HANDLER_EXECUTABLE);
        assert_eq!(args[..6], ["--name", "remote_docker_process_handler_0123456789ab", "--namespace", "machine_10_0_0_5", "--poll-interval-secs", "2"]);
        assert_eq!(args[6], "--config");
        assert_eq!(MonitorConfig::from_json(&args[7]).unwrap(), invocation.config);
        assert!(cmd.get_envs().is_empty());
    }
}
