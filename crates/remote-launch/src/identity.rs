//! Per-launch session identifiers

use crate::error::{Error, Result};
use crate::fragment::Fragments;
use crate::substitution::substitute;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the short identifier embedded in session and container names
pub const SHORT_ID_LEN: usize = 12;

/// The unique identity of one launch
///
/// `short_id` is always the first [`SHORT_ID_LEN`] characters of `full_id`.
/// Serialized as the full id alone; deserializing goes through
/// [`SessionIdentity::from_full_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionIdentity {
    full_id: String,
    short_id: String,
}

impl SessionIdentity {
    /// Build an identity from an existing lowercase hex id
    ///
    /// Fails instead of truncating when the id is shorter than [`SHORT_ID_LEN`].
    pub fn from_full_id(full_id: impl Into<String>) -> Result<Self> {
        let full_id = full_id.into();
        if !full_id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(Error::construction(format!(
                "session identifier '{}' is not lowercase hex",
                full_id
            )));
        }
        if full_id.len() < SHORT_ID_LEN {
            return Err(Error::IdentifierTooShort {
                id: full_id,
                min: SHORT_ID_LEN,
            });
        }
        let short_id = full_id[..SHORT_ID_LEN].to_string();
        Ok(Self { full_id, short_id })
    }

    /// The full lowercase hex identifier
    pub fn full_id(&self) -> &str {
        &self.full_id
    }

    /// The fixed-length prefix used in names
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// `host_<short_id>` with dots replaced by underscores
    pub fn session_name(&self, host: &Fragments) -> Fragments {
        let raw = host.clone().with_str("_").with_str(&self.short_id);
        substitute(raw, ".", "_")
    }
}

impl TryFrom<String> for SessionIdentity {
    type Error = Error;

    fn try_from(full_id: String) -> Result<Self> {
        Self::from_full_id(full_id)
    }
}

impl From<SessionIdentity> for String {
    fn from(identity: SessionIdentity) -> Self {
        identity.full_id
    }
}

/// Source of fresh session identities
///
/// Uses random (v4) UUIDs, so independent allocators in separate processes
/// never need to coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierAllocator;

impl IdentifierAllocator {
    /// Create an allocator
    pub fn new() -> Self {
        Self
    }

    /// Generate a new identity
    pub fn allocate(&self) -> SessionIdentity {
        // `simple` is always 32 zero-padded lowercase hex digits
        let full_id = Uuid::new_v4().simple().to_string();
        let short_id = full_id[..SHORT_ID_LEN].to_string();
        SessionIdentity { full_id, short_id }
    }
}
