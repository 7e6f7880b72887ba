//! # Scope Operators — Hierarchical and Parallel Composition
//!
//! Two ways to compose updates algebraically without touching the parent
//! accumulator:
//!
//! - [`SwarmScope`] runs an *ordered* sub-trace from a value snapshot of
//!   the parent state. Updates are non-commutative, exactly like the
//!   parent's own evolution. The caller installs the committed result
//!   via `SnapshotAccumulator::set_state`.
//!
//! - [`ParallelScope`] models a fan-out/fan-in: every branch is a
//!   one-step evolution from the identical base, and the merge exploits
//!   the abelian multiplication of `Z_M*`, so branch insertion order
//!   cannot affect the result.
//!
//! Scopes hold a value snapshot `(base_T, base_depth)` taken at
//! construction — never a live reference to an accumulator.

use num_bigint::BigUint;

use sigha_core::{AgentId, Result};

use crate::accumulator::evolution_step;
use crate::context::CryptoContext;
use crate::registry::PrimeRegistry;

/// One branch evolution from a shared base: `base_T^p · G^{H_exp(d+1)}`.
///
/// Pure function of its inputs; callers that want parallel branch
/// computation schedule this themselves.
pub fn compute_branch(
    ctx: &CryptoContext,
    base_t: &BigUint,
    base_depth: u32,
    prime: &BigUint,
) -> BigUint {
    evolution_step(ctx, base_t, base_depth, prime)
}

// ---------------------------------------------------------------------------
// SwarmScope
// ---------------------------------------------------------------------------

/// An ordered sub-trace bound to a snapshot of the parent state.
///
/// `record` applies the evolution rule to the scope's private state;
/// the parent is never mutated. Folding is the parent's concern — a
/// committed state at or past the fold threshold folds on the parent's
/// next update.
#[derive(Debug)]
pub struct SwarmScope<'a> {
    ctx: &'a CryptoContext,
    registry: &'a PrimeRegistry,
    fingerprint: BigUint,
    depth: u32,
}

impl<'a> SwarmScope<'a> {
    /// Enter a scope from a value snapshot of the parent state.
    pub fn enter(
        ctx: &'a CryptoContext,
        registry: &'a PrimeRegistry,
        parent_t: &BigUint,
        parent_depth: u32,
    ) -> Self {
        Self {
            ctx,
            registry,
            fingerprint: parent_t.clone(),
            depth: parent_depth,
        }
    }

    /// Record a sub-task on the scope's private state.
    pub fn record(&mut self, id: &AgentId) -> Result<()> {
        let prime = self.registry.register(id)?;
        self.fingerprint = evolution_step(self.ctx, &self.fingerprint, self.depth, &prime);
        self.depth += 1;
        Ok(())
    }

    /// The scope's current fingerprint.
    pub fn current_t(&self) -> &BigUint {
        &self.fingerprint
    }

    /// The scope's current depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Finish the scope, yielding `(T_final, depth_final)` for the caller
    /// to install into the parent.
    pub fn commit(self) -> (BigUint, u32) {
        (self.fingerprint, self.depth)
    }
}

// ---------------------------------------------------------------------------
// ParallelScope
// ---------------------------------------------------------------------------

/// A commutative fan-out/fan-in over a shared base state.
#[derive(Debug)]
pub struct ParallelScope<'a> {
    ctx: &'a CryptoContext,
    registry: &'a PrimeRegistry,
    base_t: BigUint,
    base_depth: u32,
    branch_primes: Vec<BigUint>,
    branch_values: Vec<BigUint>,
}

impl<'a> ParallelScope<'a> {
    /// Snapshot the base state for a fan-out.
    pub fn new(
        ctx: &'a CryptoContext,
        registry: &'a PrimeRegistry,
        base_t: &BigUint,
        base_depth: u32,
    ) -> Self {
        Self {
            ctx,
            registry,
            base_t: base_t.clone(),
            base_depth,
            branch_primes: Vec::new(),
            branch_values: Vec::new(),
        }
    }

    /// Add a branch: a one-step evolution of the base under the agent's
    /// prime.
    pub fn add_branch(&mut self, id: &AgentId) -> Result<()> {
        let prime = self.registry.register(id)?;
        let value = compute_branch(self.ctx, &self.base_t, self.base_depth, &prime);
        self.branch_primes.push(prime);
        self.branch_values.push(value);
        Ok(())
    }

    /// Number of branches added so far.
    pub fn branch_count(&self) -> usize {
        self.branch_primes.len()
    }

    /// The per-branch fingerprints, in insertion order.
    pub fn branch_values(&self) -> &[BigUint] {
        &self.branch_values
    }

    /// Fan-in: `T_merged = base_T^{(Σpᵢ)−(k−1)} · G^{k·H_exp(d+1)}`,
    /// with `new_depth = base_depth + 1`.
    ///
    /// All branches share one logical depth increment, and the exponent
    /// sum makes the result independent of branch insertion order. With
    /// no branches the base state is returned unchanged.
    pub fn merge(&self) -> (BigUint, u32) {
        if self.branch_primes.is_empty() {
            return (self.base_t.clone(), self.base_depth);
        }
        let modulus = self.ctx.modulus();
        let k = self.branch_primes.len() as u32;

        let prime_sum: BigUint = self.branch_primes.iter().sum();
        let exponent = prime_sum - BigUint::from(k - 1);
        let path_term = self.base_t.modpow(&exponent, modulus);

        let h = self.ctx.h_exp(u64::from(self.base_depth) + 1);
        let depth_term = self.ctx.generator().modpow(&(h * k), modulus);

        ((path_term * depth_term) % modulus, self.base_depth + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
