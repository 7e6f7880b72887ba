//! # TraceInspector — Path Replay Verification
//!
//! Re-walks the exact evolution rule over a claimed agent sequence and
//! compares the result against a claimed fingerprint. The inspector
//! shares its arithmetic with the accumulator, so any divergence between
//! "what happened" and "what is claimed" is a mismatch, never a skew in
//! the replay itself.
//!
//! A failed verification is a negative [`Verdict`], not an error: errors
//! are reserved for inputs the inspector cannot process at all.

use num_bigint::BigUint;

use sigha_core::{AgentId, Result};

use crate::accumulator::{evolution_step, restart_fingerprint};
use crate::context::CryptoContext;
use crate::registry::PrimeRegistry;

/// Outcome of a path verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the claim is consistent with the replay.
    pub ok: bool,
    /// Machine-readable reason; `"ok"` on success.
    pub reason: String,
}

impl Verdict {
    fn ok() -> Self {
        Self {
            ok: true,
            reason: "ok".into(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: reason.into(),
        }
    }
}

/// Replays claimed paths against a context and registry.
#[derive(Debug)]
pub struct TraceInspector<'a> {
    ctx: &'a CryptoContext,
    registry: &'a PrimeRegistry,
}

impl<'a> TraceInspector<'a> {
    /// Create an inspector over a context and its registry.
    pub fn new(ctx: &'a CryptoContext, registry: &'a PrimeRegistry) -> Self {
        Self { ctx, registry }
    }

    /// Re-execute the evolution rule over `path` from
    /// `(starting_t, starting_depth)`, folding at the context's depth
    /// threshold, and compare the result to `claimed_t`.
    ///
    /// Path ids are registered on the fly — registration is deterministic,
    /// so a fresh registry replays identically to the prover's.
    ///
    /// # Errors
    ///
    /// Propagates registry failures (e.g. an exhausted prime search);
    /// a starting fingerprint outside the group yields a negative
    /// verdict, not an error.
    pub fn verify_path(
        &self,
        claimed_t: &BigUint,
        path: &[AgentId],
        starting_t: &BigUint,
        starting_depth: u32,
    ) -> Result<Verdict> {
        if !self.ctx.verify_in_group(starting_t) {
            return Ok(Verdict::fail("starting fingerprint outside the group"));
        }

        let mut t = starting_t.clone();
        let mut depth = starting_depth;
        for id in path {
            let prime = self.registry.register(id)?;
            t = evolution_step(self.ctx, &t, depth, &prime);
            depth += 1;
            if depth >= self.ctx.max_depth() {
                let seed = self.ctx.fold_seed(&t, depth);
                t = restart_fingerprint(self.ctx, &seed);
                depth = 0;
            }
        }

        if t == *claimed_t {
            Ok(Verdict::ok())
        } else {
            Ok(Verdict::fail("fingerprint mismatch"))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::SnapshotAccumulator;
    use crate::context::ContextParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixtures() -> (CryptoContext, PrimeRegistry) {
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
        (ctx, registry)
    }

    fn ids(names: &[&str]) -> Vec<AgentId> {
        names.iter().map(|n| AgentId::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_replay_matches_accumulator() {
        let (ctx, registry) = fixtures();
        let path = ids(&["alice", "bob"]);
        let mut acc = SnapshotAccumulator::new(&ctx);
        for id in &path {
            acc.update(&registry, id).unwrap();
        }

        let inspector = TraceInspector::new(&ctx, &registry);
        let verdict = inspector
            .verify_path(acc.current_t(), &path, ctx.seed_t0(), 0)
            .unwrap();
        assert!(verdict.ok);
        assert_eq!(verdict.reason, "ok");
    }

    #[test]
    fn test_wrong_path_rejected() {
        let (ctx, registry) = fixtures();
        let mut acc = SnapshotAccumulator::new(&ctx);
        for id in &ids(&["alice", "bob"]) {
            acc.update(&registry, id).unwrap();
        }

        let inspector = TraceInspector::new(&ctx, &registry);
        let verdict = inspector
            .verify_path(acc.current_t(), &ids(&["bob", "alice"]), ctx.seed_t0(), 0)
            .unwrap();
        assert!(!verdict.ok);
        assert_eq!(verdict.reason, "fingerprint mismatch");
    }

    #[test]
    fn test_replay_through_folds() {
        let (ctx, registry) = fixtures();
        let path = ids(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut acc = SnapshotAccumulator::new(&ctx);
        for id in &path {
            acc.update(&registry, id).unwrap();
        }
        assert_eq!(acc.snapshot_chain().len(), 2);

        // The inspector needs only the path, not the fold points.
        let inspector = TraceInspector::new(&ctx, &registry);
        let verdict = inspector
            .verify_path(acc.current_t(), &path, ctx.seed_t0(), 0)
            .unwrap();
        assert!(verdict.ok);
    }

    #[test]
    fn test_fresh_registry_replays_identically() {
        let (ctx, registry) = fixtures();
        let path = ids(&["alice", "bob", "carol"]);
        let mut acc = SnapshotAccumulator::new(&ctx);
        for id in &path {
            acc.update(&registry, id).unwrap();
        }

        let fresh = PrimeRegistry::new(&ctx);
        let inspector = TraceInspector::new(&ctx, &fresh);
        let verdict = inspector
            .verify_path(acc.current_t(), &path, ctx.seed_t0(), 0)
            .unwrap();
        assert!(verdict.ok);
    }

    #[test]
    fn test_bad_starting_point_is_negative_verdict() {
        let (ctx, registry) = fixtures();
        let inspector = TraceInspector::new(&ctx, &registry);
        let verdict = inspector
            .verify_path(ctx.seed_t0(), &ids(&["alice"]), ctx.modulus(), 0)
            .unwrap();
        assert!(!verdict.ok);
    }
}
