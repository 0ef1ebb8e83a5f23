//! Runtime-agnostic command execution library
//!
//! This crate provides the process execution boundary used by the remote
//! launcher: a cloneable [`Command`] builder that can carry either an argument
//! list or a shell string, a [`Launcher`] trait, and a local backend that
//! streams the child's output as [`ProcessEvent`]s.

#![warn(missing_docs)]

pub mod backends;
pub mod command;
pub mod error;
pub mod event;
pub mod launcher;
pub mod process;
pub mod target;

pub use backends::local::LocalLauncher;
pub use command::Command;
pub use error::{Error, Result};
pub use event::{CarriageReturnFilter, LogFilter, LogSource, NoOpFilter, ProcessEvent, ProcessEventType};
pub use launcher::Launcher;
pub use process::{ExitResult, ExitStatus, ProcessHandle};
pub use target::Target;
