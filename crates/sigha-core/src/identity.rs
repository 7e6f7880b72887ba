//! # Identity Newtypes — Validated Identifier Primitives
//!
//! Newtype wrappers for the two identifier kinds in the SIGHA system.
//! These prevent accidental identifier confusion — you cannot pass a
//! `SessionId` where an `AgentId` is expected.
//!
//! ## Validation
//!
//! `AgentId` validates its input at construction time: it must be
//! non-empty and at most [`MAX_AGENT_ID_BYTES`] bytes. The inner field is
//! private — the only way to construct the type is through the validated
//! constructor.
//!
//! ## Security Invariant
//!
//! Agent identity is what the accumulator fingerprints. Two ids are equal
//! iff their byte sequences are equal; no normalization is applied, so an
//! id maps to exactly one registry prime.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SighaError;

/// Upper bound on agent id length in bytes.
pub const MAX_AGENT_ID_BYTES: usize = 4096;

// ---------------------------------------------------------------------------
// AgentId
// ---------------------------------------------------------------------------

/// Identity of a cooperating agent, as seen by the accumulator.
///
/// A finite UTF-8 byte string. Equality is byte equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new agent id with validation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the id is empty or longer than
    /// [`MAX_AGENT_ID_BYTES`] bytes.
    pub fn new(id: impl Into<String>) -> Result<Self, SighaError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SighaError::InvalidArgument(
                "agent id must not be empty".into(),
            ));
        }
        if id.len() > MAX_AGENT_ID_BYTES {
            return Err(SighaError::InvalidArgument(format!(
                "agent id length {} exceeds the {MAX_AGENT_ID_BYTES}-byte limit",
                id.len()
            )));
        }
        Ok(Self(id))
    }

    /// Access the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The byte sequence that feeds `hash_to_prime`.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Unique identifier for an accumulator session.
///
/// A session owns exactly one accumulator; the id is stamped into the
/// metadata of every seal and snapshot bundle the session emits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_valid() {
        let id = AgentId::new("alice").unwrap();
        assert_eq!(id.as_str(), "alice");
        assert_eq!(id.as_bytes(), b"alice");
    }

    #[test]
    fn test_agent_id_empty_rejected() {
        assert!(matches!(
            AgentId::new(""),
            Err(SighaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_agent_id_oversized_rejected() {
        let long = "a".repeat(MAX_AGENT_ID_BYTES + 1);
        assert!(AgentId::new(long).is_err());
    }

    #[test]
    fn test_agent_id_at_limit_accepted() {
        let id = AgentId::new("a".repeat(MAX_AGENT_ID_BYTES)).unwrap();
        assert_eq!(id.as_bytes().len(), MAX_AGENT_ID_BYTES);
    }

    #[test]
    fn test_agent_id_byte_equality() {
        let a = AgentId::new("agent-1").unwrap();
        let b = AgentId::new("agent-1").unwrap();
        let c = AgentId::new("agent-2").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        assert!(format!("{id}").starts_with("session:"));
    }

    #[test]
    fn test_serde_agent_id() {
        let id = AgentId::new("worker/7").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
