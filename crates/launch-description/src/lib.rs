//! # Launch Description
//!
//! YAML launch description parser for remote-launch.
//!
//! A description lists `docker_run_remote_ssh` actions by their named text
//! attributes. Attribute values may contain `${name}` references that are
//! resolved only when the launch is planned.
//!
//! ```yaml
//! version: "1.0"
//! arguments:
//!   robot: 10.0.0.5
//! actions:
//!   - docker_run_remote_ssh:
//!       user: alice
//!       machine: ${robot}
//!       port: 2222
//!       image: myimg
//!       cmd: echo hi
//! ```

#![warn(missing_docs)]

use remote_launch::{DockerRunRemoteSsh, LaunchSettings, ResolutionContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub mod entity;
pub mod parser;

pub use entity::Entity;

/// Description error types
///
/// Every variant is a construction-time failure: it is raised while parsing,
/// before any process is referenced.
#[derive(Debug, Error)]
pub enum DescriptionError {
    /// Failed to read description file
    #[error("Failed to read description file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Unsupported description version
    #[error("Unsupported version: {0}, expected 1.0")]
    UnsupportedVersion(String),

    /// Action kind not known
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// Required attribute absent
    #[error("Action '{action}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Action kind
        action: String,
        /// Attribute name
        attribute: String,
    },

    /// Attribute not recognized by the action
    #[error("Action '{action}' does not accept attribute '{attribute}'")]
    UnknownAttribute {
        /// Action kind
        action: String,
        /// Attribute name
        attribute: String,
    },

    /// Attribute present but malformed
    #[error("Action '{action}' attribute '{attribute}': {reason}")]
    InvalidAttribute {
        /// Action kind
        action: String,
        /// Attribute name
        attribute: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Result type for description operations
pub type Result<T> = std::result::Result<T, DescriptionError>;

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Default log level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Companion executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_executable: Option<String>,

    /// Seconds between companion session checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
}

impl Settings {
    /// Settings for planning launches, defaults filled in
    pub fn launch_settings(&self) -> LaunchSettings {
        let mut settings = LaunchSettings::default();
        if let Some(executable) = &self.monitor_executable {
            settings.monitor_executable = executable.clone();
        }
        if let Some(secs) = self.poll_interval_secs {
            settings.poll_interval = Duration::from_secs(secs);
        }
        settings
    }
}

/// A parsed launch description
#[derive(Debug, Clone)]
pub struct LaunchDescription {
    /// Description format version
    pub version: String,
    /// Global settings
    pub settings: Settings,
    /// Default values for `${name}` references
    pub arguments: BTreeMap<String, String>,
    /// Actions in declaration order
    pub actions: Vec<DockerRunRemoteSsh>,
}

impl LaunchDescription {
    /// Resolution context: overrides, then description arguments, then the environment
    pub fn resolution_context<'a>(
        &self,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> ResolutionContext {
        let mut ctx = ResolutionContext::with_process_env();
        for (key, value) in &self.arguments {
            ctx.set(key, value);
        }
        for (key, value) in overrides {
            ctx.set(key, value);
        }
        ctx
    }
}
