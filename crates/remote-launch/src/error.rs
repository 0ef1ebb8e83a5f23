//! Error types for remote launch composition and orchestration

use thiserror::Error;

/// Errors raised while building or starting a remote launch
///
/// Failures of the composed shell commands themselves (unreachable host,
/// container already stopped) are never represented here. They surface as
/// exit statuses of the executed processes.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or malformed
    #[error("invalid launch construction: {reason}")]
    Construction {
        /// What was wrong
        reason: String,
    },

    /// A `${key}` reference had no value and no default
    #[error("unresolved reference: ${{{key}}}")]
    UnresolvedReference {
        /// The key that could not be resolved
        key: String,
    },

    /// A condition resolved to something other than a boolean
    #[error("condition must resolve to true/false/1/0, got '{value}'")]
    InvalidCondition {
        /// The resolved value
        value: String,
    },

    /// An identifier too short to yield a full session id prefix
    #[error("session identifier '{id}' is shorter than {min} hex characters")]
    IdentifierTooShort {
        /// The rejected identifier
        id: String,
        /// Required minimum length
        min: usize,
    },

    /// Process execution failed
    #[error(transparent)]
    Executor(#[from] command_executor::Error),

    /// Monitor configuration could not be (de)serialized
    #[error("monitor configuration: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a construction error
    pub fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
