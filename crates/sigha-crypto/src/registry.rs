//! # PrimeRegistry — Identity → Prime Mapping
//!
//! A shared, internally synchronized cache over [`hash_to_prime`]. The
//! mapping is a pure function of `(id, prime_bits)`, so concurrent
//! `register` calls for the same id may race freely: every computation
//! converges to the same prime and the cache insert is atomic.
//!
//! Distinct ids map to distinct primes of the same bit length, which
//! gives the pairwise-coprimality the accumulator's evolution rule
//! depends on.

use dashmap::DashMap;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use sigha_core::{AgentId, Digest32, Result, SighaError};

use crate::bigint::to_decimal;
use crate::context::CryptoContext;
use crate::primes::{hash_to_prime, mr_rounds};

/// Deterministic, cached mapping from agent ids to odd primes.
#[derive(Debug)]
pub struct PrimeRegistry {
    prime_bits: u32,
    cache: DashMap<AgentId, BigUint>,
}

impl PrimeRegistry {
    /// Create a registry producing primes of the context's `prime_bits`.
    pub fn new(ctx: &CryptoContext) -> Self {
        Self {
            prime_bits: ctx.prime_bits(),
            cache: DashMap::new(),
        }
    }

    /// Idempotently map an id to its prime.
    ///
    /// Concurrent callers for the same id either hit the cache or each
    /// compute the (identical) prime; the first atomic insert wins and
    /// all callers observe the same value.
    pub fn register(&self, id: &AgentId) -> Result<BigUint> {
        if let Some(p) = self.cache.get(id) {
            return Ok(p.clone());
        }
        let prime = hash_to_prime(id.as_bytes(), self.prime_bits, mr_rounds())?;
        let entry = self.cache.entry(id.clone()).or_insert(prime);
        Ok(entry.clone())
    }

    /// Read-only lookup.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if the id has never been registered.
    pub fn get(&self, id: &AgentId) -> Result<BigUint> {
        self.cache
            .get(id)
            .map(|p| p.clone())
            .ok_or_else(|| SighaError::NotRegistered(id.as_str().to_string()))
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Snapshot of all `(id, prime)` pairs. Iteration order is
    /// unspecified; [`digest`](Self::digest) sorts internally.
    pub fn iter(&self) -> Vec<(AgentId, BigUint)> {
        self.cache
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Hash over the sorted-by-id `(id, prime)` pairs.
    pub fn digest(&self) -> Digest32 {
        let mut pairs = self.iter();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        hasher.update(b"SIGHA-REG-v1");
        for (id, prime) in &pairs {
            let dec = to_decimal(prime);
            hasher.update((id.as_bytes().len() as u32).to_le_bytes());
            hasher.update(id.as_bytes());
            hasher.update((dec.len() as u32).to_le_bytes());
            hasher.update(dec.as_bytes());
        }
        Digest32::from_bytes(hasher.finalize().into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
