//! # StateSealer — Payload-Anchored Sealing
//!
//! Binds an accumulator's final state to a payload digest under the
//! context. The anchor is `SHA-256(T_bytes || payload_digest ||
//! context_digest)`; flipping any bit of the payload, the fingerprint,
//! or the context breaks it.
//!
//! Sealing is the one-way `ACTIVE → SEALED` transition: a sealed
//! accumulator answers reads but rejects every further mutation.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use sigha_core::{Digest32, HolographicMeta, Result, SighaError};

use crate::accumulator::{SnapshotAccumulator, SnapshotRecord};
use crate::bigint::serde_decimal;

/// An immutable binding of accumulator state to a payload digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    /// Session and context of origin.
    pub meta: HolographicMeta,
    /// The sealed fingerprint.
    #[serde(with = "serde_decimal")]
    pub fingerprint: BigUint,
    /// Depth at sealing time.
    pub depth: u32,
    /// The archived snapshot chain at sealing time.
    pub snapshots: Vec<SnapshotRecord>,
    /// `SHA-256(payload_bytes)`.
    pub payload_digest: Digest32,
    /// `SHA-256(T_bytes || payload_digest || context_digest)`.
    pub anchor: Digest32,
}

/// Produces and checks [`Seal`]s.
#[derive(Debug)]
pub struct StateSealer;

impl StateSealer {
    /// Seal an accumulator over a payload and transition it to
    /// `SEALED`.
    ///
    /// # Errors
    ///
    /// `Sealed` if the accumulator has already been sealed.
    pub fn seal(acc: &mut SnapshotAccumulator, payload: &[u8]) -> Result<Seal> {
        if acc.is_sealed() {
            return Err(SighaError::Sealed);
        }
        let meta = acc.meta();
        let payload_digest = sha256(payload);
        let anchor = compute_anchor(acc.current_t(), &payload_digest, &meta.context_digest);

        let seal = Seal {
            meta,
            fingerprint: acc.current_t().clone(),
            depth: acc.depth(),
            snapshots: acc.snapshot_chain().to_vec(),
            payload_digest,
            anchor,
        };
        acc.mark_sealed();
        Ok(seal)
    }

    /// Check a seal against a payload: recompute the payload digest and
    /// the anchor, and compare both.
    pub fn verify(seal: &Seal, payload: &[u8]) -> bool {
        let payload_digest = sha256(payload);
        if payload_digest != seal.payload_digest {
            return false;
        }
        let anchor = compute_anchor(&seal.fingerprint, &payload_digest, &seal.meta.context_digest);
        anchor == seal.anchor
    }
}

fn sha256(bytes: &[u8]) -> Digest32 {
    Digest32::from_bytes(Sha256::digest(bytes).into())
}

fn compute_anchor(t: &BigUint, payload_digest: &Digest32, context_digest: &Digest32) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(t.to_bytes_be());
    hasher.update(payload_digest.as_bytes());
    hasher.update(context_digest.as_bytes());
    Digest32::from_bytes(hasher.finalize().into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextParams, CryptoContext};
    use crate::registry::PrimeRegistry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sigha_core::AgentId;

    fn sealed_fixture() -> (SnapshotAccumulator, Seal) {
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = CryptoContext::generate_with_rng(
            ContextParams {
                bit_length: 512,
                max_depth: 3,
                safe_primes: false,
                ..ContextParams::default()
            },
            &mut rng,
        )
        .unwrap();
        let registry = PrimeRegistry::new(&ctx);
        let mut acc = SnapshotAccumulator::new(&ctx);
        for name in ["alice", "bob"] {
            acc.update(&registry, &AgentId::new(name).unwrap()).unwrap();
        }
        let seal = StateSealer::seal(&mut acc, b"hello").unwrap();
        (acc, seal)
    }

    #[test]
    fn test_seal_round_trip() {
        let (_, seal) = sealed_fixture();
        assert!(StateSealer::verify(&seal, b"hello"));
    }

    #[test]
    fn test_payload_tamper_rejected() {
        let (_, seal) = sealed_fixture();
        assert!(!StateSealer::verify(&seal, b"help!"));
    }

    #[test]
    fn test_seal_tamper_rejected() {
        let (_, seal) = sealed_fixture();

        let mut forged = seal.clone();
        forged.fingerprint += 1u32;
        assert!(!StateSealer::verify(&forged, b"hello"));

        let mut forged = seal.clone();
        let mut bytes = *forged.anchor.as_bytes();
        bytes[0] ^= 1;
        forged.anchor = Digest32::from_bytes(bytes);
        assert!(!StateSealer::verify(&forged, b"hello"));
    }

    #[test]
    fn test_sealing_transitions_phase() {
        let (acc, _) = sealed_fixture();
        assert!(acc.is_sealed());
    }

    #[test]
    fn test_double_seal_rejected() {
        let (mut acc, _) = sealed_fixture();
        assert!(matches!(
            StateSealer::seal(&mut acc, b"again"),
            Err(SighaError::Sealed)
        ));
    }

    #[test]
    fn test_seal_serde_round_trip() {
        let (_, seal) = sealed_fixture();
        let json = serde_json::to_string(&seal).unwrap();
        let parsed: Seal = serde_json::from_str(&json).unwrap();
        assert_eq!(seal, parsed);
        assert!(StateSealer::verify(&parsed, b"hello"));
    }
}
