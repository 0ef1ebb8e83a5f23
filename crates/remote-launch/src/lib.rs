//! # Remote Launch
//!
//! Launches a container on a remote host over SSH inside a detached, named
//! `screen` session, and produces the independent command that later kills
//! that container.
//!
//! The pieces, bottom up:
//!
//! - [`fragment`]: lazily-resolved text, so late-bound values (host names from
//!   arguments or the environment) stay symbolic until execution.
//! - [`substitution`]: deferred literal find/replace over fragments.
//! - [`identity`]: per-launch unique identifiers.
//! - [`composer`]: the launch and teardown shell commands.
//! - [`monitor`]: the configuration handed to the companion process.
//! - [`action`]: resolving, gating and starting a launch.
//! - [`handler`]: what the companion process does with its configuration.
//!
//! ```rust
//! use remote_launch::{DockerRunRemoteSsh, LaunchSettings, LaunchTarget, Payload, ResolutionContext};
//!
//! let action = DockerRunRemoteSsh::new(
//!     LaunchTarget::new("alice", "10.0.0.5").with_port("2222"),
//!     Payload::new("myimg").with_command("echo hi"),
//! );
//! let plan = action
//!     .plan(&ResolutionContext::new(), &LaunchSettings::default())
//!     .unwrap()
//!     .unwrap();
//! assert!(plan.launch_command.contains("ssh -p 2222 -t alice@10.0.0.5"));
//! ```

#![warn(missing_docs)]

pub mod action;
pub mod composer;
pub mod condition;
pub mod error;
pub mod fragment;
pub mod handler;
pub mod identity;
pub mod monitor;
pub mod substitution;

pub use action::{DockerRunRemoteSsh, LaunchOutcome, LaunchPlan, LaunchSettings, OutputMode, RunningLaunch};
pub use composer::{CommandComposer, ComposedCommand, LaunchTarget, Payload};
pub use condition::Condition;
pub use error::{Error, Result};
pub use fragment::{Fragment, Fragments, ResolutionContext};
pub use handler::{RemoteProcessHandler, TeardownReport, WatchExit};
pub use identity::{IdentifierAllocator, SessionIdentity};
pub use monitor::{MonitorConfig, MonitorInvocation};
pub use substitution::substitute;
