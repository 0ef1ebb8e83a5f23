//! Error types for command execution

use thiserror::Error;

/// Unified error type for command execution
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to spawn a process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed {
        /// The reason for the spawn failure
        reason: String,
    },

    /// Failed to wait on a running process
    #[error("failed to wait for process: {reason}")]
    WaitFailed {
        /// The reason the wait failed
        reason: String,
    },

    /// Failed to send signal to process
    #[error("failed to send signal {signal}: {reason}")]
    SignalFailed {
        /// The signal number that failed to send
        signal: i32,
        /// The reason for the signal failure
        reason: String,
    },
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Create a wait failed error
    pub fn wait_failed(reason: impl Into<String>) -> Self {
        Self::WaitFailed {
            reason: reason.into(),
        }
    }

    /// Create a signal failed error
    pub fn signal_failed(signal: i32, reason: impl Into<String>) -> Self {
        Self::SignalFailed {
            signal,
            reason: reason.into(),
        }
    }

    /// Prefix a spawn failure with the name of the process that failed
    pub fn with_process_context(self, name: impl Into<String>) -> Self {
        match self {
            Error::SpawnFailed { reason } => Error::SpawnFailed {
                reason: format!("[{}] {}", name.into(), reason),
            },
            other => other,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_context_only_touches_spawn_failures() {
        let err = Error::spawn_failed("no such file").with_process_context("robot_ab12");
        assert_eq!(err.to_string(), "failed to spawn process: [robot_ab12] no such file");

        let err = Error::signal_failed(15, "ESRCH").with_process_context("robot_ab12");
        assert_eq!(err.to_string(), "failed to send signal 15: ESRCH");
    }
}
