//! # SnapshotAccumulator — The Evolution State Machine
//!
//! Maintains the fingerprint `T`, the depth counter, and the archived
//! snapshot chain for one session. Every agent action evolves the state:
//!
//! ```text
//! T ← T^p · G^{H_exp(depth+1)}  (mod M)
//! ```
//!
//! where `p` is the agent's registry prime. When the depth counter
//! reaches the context's fold threshold the current fingerprint is
//! archived and the chain restarts from a seed derived from the archive,
//! so the full history stays replayable from `T₀`.
//!
//! ## Lifecycle
//!
//! Two phases: `Active` (accepts updates) and `Sealed` (read-only).
//! Sealing is one-way and performed by `StateSealer`.
//!
//! ## Rollback Discipline
//!
//! State assignment is the last step of every update path. A failed or
//! rejected update leaves `(T, depth, snapshots)` untouched.

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use sigha_core::{AgentId, Digest32, HolographicMeta, Result, SessionId, SighaError};

use crate::bigint::{gcd, serde_decimal};
use crate::context::CryptoContext;
use crate::registry::PrimeRegistry;

// ---------------------------------------------------------------------------
// Shared evolution arithmetic
// ---------------------------------------------------------------------------

/// One evolution step from `(t, depth_before)` under `prime`.
///
/// Every consumer of the rule — accumulator, scopes, verifier — calls
/// this function, so replay is bit-for-bit by construction.
pub(crate) fn evolution_step(
    ctx: &CryptoContext,
    t: &BigUint,
    depth_before: u32,
    prime: &BigUint,
) -> BigUint {
    let modulus = ctx.modulus();
    let path_term = t.modpow(prime, modulus);
    let depth_term = ctx
        .generator()
        .modpow(&ctx.h_exp(u64::from(depth_before) + 1), modulus);
    (path_term * depth_term) % modulus
}

/// The restart fingerprint after a fold: `T₀ · G^{fold_seed} mod M`.
pub(crate) fn restart_fingerprint(ctx: &CryptoContext, fold_seed: &Digest32) -> BigUint {
    let modulus = ctx.modulus();
    let exp = BigUint::from_bytes_be(fold_seed.as_bytes());
    (ctx.seed_t0() * ctx.generator().modpow(&exp, modulus)) % modulus
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// An archived segment of the evolution chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// The fingerprint at the moment of the fold.
    #[serde(with = "serde_decimal")]
    pub fingerprint: BigUint,
    /// The depth at the moment of the fold.
    pub depth: u32,
    /// Seed chaining the next segment to this archive.
    pub fold_seed: Digest32,
}

/// Snapshot chain export with session metadata attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBundle {
    /// Origin of the export.
    pub meta: HolographicMeta,
    /// The archived chain, oldest first.
    pub records: Vec<SnapshotRecord>,
}

/// Accumulator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Accepting updates.
    Active,
    /// Read-only; produced by sealing. No reverse transition.
    Sealed,
}

// ---------------------------------------------------------------------------
// SnapshotAccumulator
// ---------------------------------------------------------------------------

/// The per-session accumulator state machine.
#[derive(Debug, Clone)]
pub struct SnapshotAccumulator {
    ctx: CryptoContext,
    session_id: SessionId,
    fingerprint: BigUint,
    depth: u32,
    snapshots: Vec<SnapshotRecord>,
    phase: Phase,
}

impl SnapshotAccumulator {
    /// Create an accumulator bound to a context, starting from `T₀`.
    pub fn new(ctx: &CryptoContext) -> Self {
        Self {
            ctx: ctx.clone(),
            session_id: SessionId::new(),
            fingerprint: ctx.seed_t0().clone(),
            depth: 0,
            snapshots: Vec::new(),
            phase: Phase::Active,
        }
    }

    /// Record one agent action.
    ///
    /// Registers the id, evolves the fingerprint, and folds if the depth
    /// threshold is reached.
    ///
    /// # Errors
    ///
    /// `Sealed` if the accumulator is sealed; registry errors propagate.
    pub fn update(&mut self, registry: &PrimeRegistry, id: &AgentId) -> Result<()> {
        self.ensure_active()?;
        let prime = registry.register(id)?;
        let next = evolution_step(&self.ctx, &self.fingerprint, self.depth, &prime);
        self.apply(next);
        Ok(())
    }

    /// Like [`update`](Self::update), but verifies the evolved
    /// fingerprint stays inside the working group before applying it.
    ///
    /// # Errors
    ///
    /// `DegenerateState` if `gcd(T', M) ≠ 1` or `T' ≤ 1`; the update is
    /// not applied.
    pub fn update_with_check(&mut self, registry: &PrimeRegistry, id: &AgentId) -> Result<()> {
        self.ensure_active()?;
        let prime = registry.register(id)?;
        let next = evolution_step(&self.ctx, &self.fingerprint, self.depth, &prime);
        if next <= BigUint::one() || !gcd(&next, self.ctx.modulus()).is_one() {
            return Err(SighaError::DegenerateState(format!(
                "evolved fingerprint for {:?} left the working group",
                id.as_str()
            )));
        }
        self.apply(next);
        Ok(())
    }

    /// The current fingerprint `T`.
    pub fn current_t(&self) -> &BigUint {
        &self.fingerprint
    }

    /// Evolution steps since the last fold (or construction).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The archived snapshot chain, oldest first.
    pub fn snapshot_chain(&self) -> &[SnapshotRecord] {
        &self.snapshots
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the accumulator has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.phase == Phase::Sealed
    }

    /// The owning session.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The bound context.
    pub fn context(&self) -> &CryptoContext {
        &self.ctx
    }

    /// Metadata identifying this session and its context.
    pub fn meta(&self) -> HolographicMeta {
        HolographicMeta::new(
            self.session_id.clone(),
            self.ctx.bit_length(),
            self.ctx.digest(),
        )
    }

    /// Export the snapshot chain with session metadata attached.
    pub fn export_snapshots(&self) -> SnapshotBundle {
        SnapshotBundle {
            meta: self.meta(),
            records: self.snapshots.clone(),
        }
    }

    /// Install externally sourced state — the deserialization and test
    /// escape hatch, and the only mutation besides the update methods.
    ///
    /// # Errors
    ///
    /// `WeakParameters` if `t` fails the group-membership check;
    /// `Sealed` on a sealed accumulator.
    pub fn set_state(
        &mut self,
        t: BigUint,
        depth: u32,
        snapshots: Vec<SnapshotRecord>,
    ) -> Result<()> {
        self.ensure_active()?;
        if !self.ctx.verify_in_group(&t) {
            return Err(SighaError::WeakParameters(
                "imported fingerprint is outside the working group".into(),
            ));
        }
        self.fingerprint = t;
        self.depth = depth;
        self.snapshots = snapshots;
        Ok(())
    }

    pub(crate) fn mark_sealed(&mut self) {
        self.phase = Phase::Sealed;
    }

    fn ensure_active(&self) -> Result<()> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Sealed => Err(SighaError::Sealed),
        }
    }

    /// Commit an evolved fingerprint; folding runs after the depth
    /// increment so the archive records the post-update state.
    fn apply(&mut self, next: BigUint) {
        self.fingerprint = next;
        self.depth += 1;
        if self.depth >= self.ctx.max_depth() {
            self.fold();
        }
    }

    fn fold(&mut self) {
        let seed = self.ctx.fold_seed(&self.fingerprint, self.depth);
        self.snapshots.push(SnapshotRecord {
            fingerprint: self.fingerprint.clone(),
            depth: self.depth,
            fold_seed: seed,
        });
        self.fingerprint = restart_fingerprint(&self.ctx, &seed);
        self.depth = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
