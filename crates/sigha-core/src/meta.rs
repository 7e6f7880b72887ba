//! # Holographic Metadata
//!
//! The value object attached to everything an accumulator session emits:
//! seals and exported snapshot bundles. It identifies the session, the
//! moment of emission, and — through the context digest — the exact group
//! parameters the fingerprint lives in.

use serde::{Deserialize, Serialize};

use crate::digest::Digest32;
use crate::identity::SessionId;
use crate::temporal::Timestamp;

/// Metadata identifying the origin of an emitted seal or snapshot bundle.
///
/// The `context_digest` pins the emission to one concrete
/// `(bit_length, M, G, T₀)` tuple; a verifier with a different context
/// cannot silently accept the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolographicMeta {
    /// The emitting session.
    pub session_id: SessionId,
    /// When the artifact was emitted (UTC, seconds precision).
    pub created_at: Timestamp,
    /// Bit length of the context modulus.
    pub bit_length: u32,
    /// Canonical digest of the cryptographic context.
    pub context_digest: Digest32,
}

impl HolographicMeta {
    /// Build metadata stamped with the current time.
    pub fn new(session_id: SessionId, bit_length: u32, context_digest: Digest32) -> Self {
        Self {
            session_id,
            created_at: Timestamp::now(),
            bit_length,
            context_digest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_serde_round_trip() {
        let meta = HolographicMeta::new(SessionId::new(), 2048, Digest32::from_bytes([1u8; 32]));
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: HolographicMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, parsed);
    }
}
