//! # Prime Utilities — Miller–Rabin and Deterministic Prime Synthesis
//!
//! Three layers, bottom up:
//!
//! - A Miller–Rabin composite-witness test with a configurable round
//!   count (`SIGHA_MR_ROUNDS`, default 40, floor 16), fronted by trial
//!   division against the first 256 small primes.
//! - Random prime sampling (`generate_prime`, `generate_safe_prime`) with
//!   a bounded retry budget, used by context generation.
//! - `hash_to_prime`: the deterministic, collision-free mapping from agent
//!   identity bytes to an odd prime of prescribed bit length. Every
//!   candidate — and the Miller–Rabin bases used to test it — is derived
//!   purely from `(id_bytes, counter)`, so the same identity always maps
//!   to the same prime on every host.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use sigha_core::{Result, SighaError};

use crate::bigint::rand_odd_with_bits;

/// Default Miller–Rabin round count.
pub const DEFAULT_MR_ROUNDS: u32 = 40;

/// Minimum accepted value for the `SIGHA_MR_ROUNDS` override.
pub const MIN_MR_ROUNDS: u32 = 16;

/// Retry budget for random prime sampling.
const PRIME_RETRY_CAP: u32 = 1024;

/// Counter budget for `hash_to_prime` regeneration.
const HASH_TO_PRIME_CAP: u64 = 200_000;

/// How many small primes front the Miller–Rabin test.
const TRIAL_DIVISION_PRIMES: usize = 256;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The effective Miller–Rabin round count.
///
/// Reads `SIGHA_MR_ROUNDS` once per process. Values that do not parse or
/// fall below [`MIN_MR_ROUNDS`] are ignored in favor of the default.
pub fn mr_rounds() -> u32 {
    static ROUNDS: OnceLock<u32> = OnceLock::new();
    *ROUNDS.get_or_init(|| {
        std::env::var("SIGHA_MR_ROUNDS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&r| r >= MIN_MR_ROUNDS)
            .unwrap_or(DEFAULT_MR_ROUNDS)
    })
}

fn small_primes() -> &'static [u64] {
    static PRIMES: OnceLock<Vec<u64>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        // Sieve of Eratosthenes; 1620 covers the first 256 primes.
        let limit = 1620usize;
        let mut sieve = vec![true; limit + 1];
        sieve[0] = false;
        sieve[1] = false;
        let mut i = 2;
        while i * i <= limit {
            if sieve[i] {
                let mut j = i * i;
                while j <= limit {
                    sieve[j] = false;
                    j += i;
                }
            }
            i += 1;
        }
        let primes: Vec<u64> = (2..=limit)
            .filter(|&n| sieve[n])
            .map(|n| n as u64)
            .take(TRIAL_DIVISION_PRIMES)
            .collect();
        primes
    })
}

// ---------------------------------------------------------------------------
// Miller–Rabin
// ---------------------------------------------------------------------------

/// Probabilistic primality test: trial division, then `rounds` rounds of
/// Miller–Rabin with bases drawn from `rng`.
///
/// The witness search is randomized but the verdict is stable for any
/// fixed seed, which is what the deterministic paths rely on.
pub fn is_probably_prime(n: &BigUint, rounds: u32, rng: &mut (impl Rng + ?Sized)) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    for &p in small_primes() {
        let p_big = BigUint::from(p);
        if *n == p_big {
            return true;
        }
        if (n % p).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_1 = n - BigUint::one();
    let mut d = n_minus_1.clone();
    let mut s = 0u64;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Random prime sampling
// ---------------------------------------------------------------------------

/// Sample a uniformly random `bits`-bit prime (top and bottom bits set).
///
/// # Errors
///
/// Returns `WeakParameters` if `bits < 2` or no prime is found within the
/// retry budget of 1024 candidates.
pub fn generate_prime(
    bits: u64,
    rounds: u32,
    rng: &mut (impl Rng + ?Sized),
) -> Result<BigUint> {
    if bits < 2 {
        return Err(SighaError::WeakParameters(format!(
            "prime bit length {bits} is too small"
        )));
    }
    for _ in 0..PRIME_RETRY_CAP {
        let candidate = rand_odd_with_bits(rng, bits);
        if is_probably_prime(&candidate, rounds, rng) {
            return Ok(candidate);
        }
    }
    Err(SighaError::WeakParameters(format!(
        "no {bits}-bit prime found within {PRIME_RETRY_CAP} attempts"
    )))
}

/// Sample a `bits`-bit safe prime `p` (both `p` and `(p-1)/2` prime).
///
/// Each attempt draws a Sophie Germain candidate `q` (itself a full
/// `generate_prime` search) and tests `p = 2q + 1`, so the 1024-attempt
/// budget counts only candidates that already passed the first condition.
pub fn generate_safe_prime(
    bits: u64,
    rounds: u32,
    rng: &mut (impl Rng + ?Sized),
) -> Result<BigUint> {
    if bits < 3 {
        return Err(SighaError::WeakParameters(format!(
            "safe prime bit length {bits} is too small"
        )));
    }
    for _ in 0..PRIME_RETRY_CAP {
        let q = generate_prime(bits - 1, rounds, rng)?;
        let p: BigUint = (&q << 1u32) + BigUint::one();
        if p.bits() == bits && is_probably_prime(&p, rounds, rng) {
            return Ok(p);
        }
    }
    Err(SighaError::WeakParameters(format!(
        "no {bits}-bit safe prime found within {PRIME_RETRY_CAP} attempts"
    )))
}

// ---------------------------------------------------------------------------
// hash_to_prime
// ---------------------------------------------------------------------------

/// Deterministically map identity bytes to an odd prime of `bits` bits.
///
/// Candidate derivation for counter `c`:
///
/// 1. `seed = SHA-256(id_bytes)`.
/// 2. Expand to `ceil(bits/256)` blocks: block `i` is
///    `SHA-256(seed || c as u64 LE || i as u32 LE)`.
/// 3. Interpret the concatenation (truncated to `ceil(bits/8)` bytes) as a
///    big-endian integer, mask to `bits` bits, set the top and bottom bits.
/// 4. If the candidate is composite, increment `c` and regenerate.
///
/// The Miller–Rabin bases for each candidate are drawn from a PRNG seeded
/// by the candidate itself, so the whole search is a pure function of
/// `(id_bytes, bits)`.
///
/// # Errors
///
/// Returns `InvalidArgument` for empty input or `bits < 2`, and
/// `WeakParameters` if the counter budget is exhausted.
pub fn hash_to_prime(id_bytes: &[u8], bits: u32, rounds: u32) -> Result<BigUint> {
    if id_bytes.is_empty() {
        return Err(SighaError::InvalidArgument(
            "empty identity bytes".into(),
        ));
    }
    if bits < 2 {
        return Err(SighaError::InvalidArgument(format!(
            "prime bit length {bits} is too small"
        )));
    }

    let seed: [u8; 32] = Sha256::digest(id_bytes).into();
    let byte_len = bits.div_ceil(8) as usize;
    let block_count = bits.div_ceil(256);

    for counter in 0..HASH_TO_PRIME_CAP {
        let mut material = Vec::with_capacity(block_count as usize * 32);
        for i in 0..block_count {
            let mut hasher = Sha256::new();
            hasher.update(seed);
            hasher.update(counter.to_le_bytes());
            hasher.update(i.to_le_bytes());
            material.extend_from_slice(&hasher.finalize());
        }
        material.truncate(byte_len);

        let mut candidate = BigUint::from_bytes_be(&material);
        candidate &= (BigUint::one() << bits) - BigUint::one();
        candidate.set_bit(u64::from(bits) - 1, true);
        candidate.set_bit(0, true);

        let mut base_rng = candidate_base_rng(&candidate);
        if is_probably_prime(&candidate, rounds, &mut base_rng) {
            return Ok(candidate);
        }
    }
    Err(SighaError::WeakParameters(format!(
        "hash_to_prime exhausted {HASH_TO_PRIME_CAP} counters"
    )))
}

/// Derive the deterministic Miller–Rabin base stream for a candidate.
fn candidate_base_rng(candidate: &BigUint) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(b"sigha/mr-bases");
    hasher.update(candidate.to_bytes_be());
    let seed: [u8; 32] = hasher.finalize().into();
    StdRng::from_seed(seed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn test_small_primes_table() {
        let primes = small_primes();
        assert_eq!(primes.len(), 256);
        assert_eq!(primes[0], 2);
        assert_eq!(primes[1], 3);
        assert_eq!(primes[255], 1619);
    }

    #[test]
    fn test_known_primes_accepted() {
        let mut r = rng();
        for p in [2u64, 3, 5, 1619, 7919, 104_729] {
            assert!(
                is_probably_prime(&BigUint::from(p), DEFAULT_MR_ROUNDS, &mut r),
                "{p} should be prime"
            );
        }
    }

    #[test]
    fn test_known_composites_rejected() {
        let mut r = rng();
        // Includes Carmichael numbers 561 and 41041.
        for c in [0u64, 1, 4, 561, 41_041, 104_730, 7919 * 7919] {
            assert!(
                !is_probably_prime(&BigUint::from(c), DEFAULT_MR_ROUNDS, &mut r),
                "{c} should be composite"
            );
        }
    }

    #[test]
    fn test_generate_prime_shape() {
        let mut r = rng();
        let p = generate_prime(128, DEFAULT_MR_ROUNDS, &mut r).unwrap();
        assert_eq!(p.bits(), 128);
        assert!(p.is_odd());
    }

    #[test]
    fn test_generate_prime_too_small() {
        let mut r = rng();
        assert!(matches!(
            generate_prime(1, DEFAULT_MR_ROUNDS, &mut r),
            Err(SighaError::WeakParameters(_))
        ));
    }

    #[test]
    fn test_generate_safe_prime() {
        let mut r = rng();
        let p = generate_safe_prime(64, DEFAULT_MR_ROUNDS, &mut r).unwrap();
        assert_eq!(p.bits(), 64);
        let q: BigUint = (&p - BigUint::one()) >> 1;
        assert!(is_probably_prime(&q, DEFAULT_MR_ROUNDS, &mut r));
    }

    #[test]
    fn test_hash_to_prime_deterministic() {
        let a = hash_to_prime(b"alice", 256, DEFAULT_MR_ROUNDS).unwrap();
        let b = hash_to_prime(b"alice", 256, DEFAULT_MR_ROUNDS).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_to_prime_distinct_ids() {
        let a = hash_to_prime(b"alice", 256, DEFAULT_MR_ROUNDS).unwrap();
        let b = hash_to_prime(b"bob", 256, DEFAULT_MR_ROUNDS).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_to_prime_is_prime() {
        let mut r = rng();
        let p = hash_to_prime(b"carol", 256, DEFAULT_MR_ROUNDS).unwrap();
        assert_eq!(p.bits(), 256);
        assert!(p.is_odd());
        // Independent check with a different witness stream.
        assert!(is_probably_prime(&p, DEFAULT_MR_ROUNDS, &mut r));
    }

    #[test]
    fn test_hash_to_prime_wide_output() {
        let p = hash_to_prime(b"dave", 512, DEFAULT_MR_ROUNDS).unwrap();
        assert_eq!(p.bits(), 512);
    }

    #[test]
    fn test_hash_to_prime_rejects_empty() {
        assert!(matches!(
            hash_to_prime(b"", 256, DEFAULT_MR_ROUNDS),
            Err(SighaError::InvalidArgument(_))
        ));
    }
}
