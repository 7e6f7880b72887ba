//! # CryptoContext — Group Parameters for the Holographic Trace
//!
//! Generates and validates the tuple `(M, G, T₀)` every accumulator,
//! scope, and verifier operates in:
//!
//! - `M = p·q`, an RSA-style composite of unknown order. In safe mode
//!   (the default) `(p−1)/2` and `(q−1)/2` are also prime.
//! - `G` and `T₀` are squares of random units, placing both in `QR_M`,
//!   a subgroup whose order is a large factor of `λ(M)`.
//!
//! The context is immutable after construction and clonable; accumulators
//! and scopes receive it by reference. There is no process-global context.
//!
//! ## Security Invariant
//!
//! The factorization `(p, q)` is a toxic byproduct: anyone holding it can
//! compute the group order and forge fingerprints. Production generation
//! drops both factors inside the generation scope. Test-mode retention
//! (`debug_retain_factors`) stores them behind `Zeroizing` buffers and is
//! visible in the context digest, so a test context can never
//! impersonate a production one.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use sigha_core::{Digest32, Result, SighaError};

use crate::bigint::{gcd, rand_below, to_decimal};
use crate::primes::{generate_prime, generate_safe_prime, mr_rounds};

/// Reduction width for depth-derived exponents: `λ_bound = 2^256`, so a
/// SHA-256 output is used as-is. Hashed into the context digest.
pub const HEXP_WIDTH_BITS: u32 = 256;

/// Smallest accepted modulus size.
pub const MIN_BIT_LENGTH: u32 = 256;

/// Default modulus size.
pub const DEFAULT_BIT_LENGTH: u32 = 2048;

/// Default fold threshold.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Default bit length for registry primes, equal to the exponent width.
pub const DEFAULT_PRIME_BITS: u32 = 256;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Construction parameters for a [`CryptoContext`].
#[derive(Debug, Clone)]
pub struct ContextParams {
    /// Modulus size in bits; must be even and at least [`MIN_BIT_LENGTH`].
    pub bit_length: u32,
    /// Fold threshold for accumulators bound to this context.
    pub max_depth: u32,
    /// Bit length of registry primes.
    pub prime_bits: u32,
    /// Require `(p−1)/2` and `(q−1)/2` to be prime.
    pub safe_primes: bool,
    /// Retain the factorization for test-mode subgroup checks.
    pub debug_retain_factors: bool,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            bit_length: DEFAULT_BIT_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            prime_bits: DEFAULT_PRIME_BITS,
            safe_primes: true,
            debug_retain_factors: false,
        }
    }
}

/// The modulus factorization, kept only in test mode.
#[derive(Debug, Clone)]
struct RetainedFactors {
    p: Zeroizing<Vec<u8>>,
    q: Zeroizing<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// CryptoContext
// ---------------------------------------------------------------------------

/// Immutable group parameters: modulus, generator, initial seed.
#[derive(Debug, Clone)]
pub struct CryptoContext {
    modulus: BigUint,
    generator: BigUint,
    seed: BigUint,
    bit_length: u32,
    max_depth: u32,
    prime_bits: u32,
    safe_primes: bool,
    debug_flag: bool,
    digest: Digest32,
    factors: Option<RetainedFactors>,
}

impl CryptoContext {
    /// Generate a fresh context from the OS entropy source.
    ///
    /// `SIGHA_SAFE_PRIMES=1` in the environment forces safe-prime
    /// generation regardless of `params.safe_primes`.
    ///
    /// # Errors
    ///
    /// `WeakParameters` for undersized or odd `bit_length`, and when the
    /// prime retry budget is exhausted.
    pub fn generate(mut params: ContextParams) -> Result<Self> {
        if std::env::var("SIGHA_SAFE_PRIMES").as_deref() == Ok("1") {
            params.safe_primes = true;
        }
        Self::generate_with_rng(params, &mut OsRng)
    }

    /// Generate a context from a caller-supplied RNG.
    ///
    /// Deterministic for a fixed seed; this is the test-vector entry
    /// point.
    pub fn generate_with_rng(
        params: ContextParams,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<Self> {
        validate_params(&params)?;
        let rounds = mr_rounds();
        let half = u64::from(params.bit_length) / 2;

        let p = sample_factor(half, rounds, params.safe_primes, rng)?;
        let q = loop {
            let q = sample_factor(half, rounds, params.safe_primes, rng)?;
            if q != p {
                break q;
            }
        };
        let modulus = &p * &q;

        let generator = sample_square(&modulus, rng)?;
        let seed = loop {
            let t0 = sample_square(&modulus, rng)?;
            if t0 != generator {
                break t0;
            }
        };

        let digest = compute_digest(
            params.bit_length,
            &modulus,
            &generator,
            &seed,
            params.debug_retain_factors,
        );
        let factors = params.debug_retain_factors.then(|| RetainedFactors {
            p: Zeroizing::new(p.to_bytes_be()),
            q: Zeroizing::new(q.to_bytes_be()),
        });
        // p and q drop here; num-bigint offers no in-place scrubbing, so
        // ownership confines them to this scope.

        Ok(Self {
            modulus,
            generator,
            seed,
            bit_length: params.bit_length,
            max_depth: params.max_depth,
            prime_bits: params.prime_bits,
            safe_primes: params.safe_primes,
            debug_flag: params.debug_retain_factors,
            digest,
            factors,
        })
    }

    /// Rebuild a context from imported parts (the deserialization path).
    ///
    /// `debug_flag` records whether the original context was generated in
    /// factor-retaining test mode — it enters the digest, but the factors
    /// themselves are never importable, so the rebuilt context cannot
    /// answer residue queries.
    ///
    /// # Errors
    ///
    /// `WeakParameters` when the imported values fail the group
    /// invariants: undersized/odd `bit_length`, even or mis-sized
    /// modulus, or `G`/`T₀` outside `Z_M*`.
    pub fn from_parts(
        bit_length: u32,
        max_depth: u32,
        modulus: BigUint,
        generator: BigUint,
        seed: BigUint,
        safe_primes: bool,
        debug_flag: bool,
    ) -> Result<Self> {
        validate_params(&ContextParams {
            bit_length,
            max_depth,
            ..ContextParams::default()
        })?;
        if modulus.is_even() {
            return Err(SighaError::WeakParameters(
                "imported modulus is even".into(),
            ));
        }
        let bits = modulus.bits();
        if bits + 1 < u64::from(bit_length) || bits > u64::from(bit_length) {
            return Err(SighaError::WeakParameters(format!(
                "imported modulus has {bits} bits, expected {bit_length}"
            )));
        }
        if !element_in_group(&generator, &modulus) {
            return Err(SighaError::WeakParameters(
                "imported generator is outside the working group".into(),
            ));
        }
        if !element_in_group(&seed, &modulus) {
            return Err(SighaError::WeakParameters(
                "imported seed is outside the working group".into(),
            ));
        }
        let digest = compute_digest(bit_length, &modulus, &generator, &seed, debug_flag);
        Ok(Self {
            modulus,
            generator,
            seed,
            bit_length,
            max_depth,
            prime_bits: DEFAULT_PRIME_BITS,
            safe_primes,
            debug_flag,
            digest,
            factors: None,
        })
    }

    /// Check `1 < x < M` and `gcd(x, M) = 1`.
    ///
    /// Used to reject crafted group elements on import.
    pub fn verify_in_group(&self, x: &BigUint) -> bool {
        element_in_group(x, &self.modulus)
    }

    /// The canonical 32-byte context digest over
    /// `(bit_length, M, G, T₀, H_exp width, debug flag)`.
    pub fn digest(&self) -> Digest32 {
        self.digest
    }

    /// Depth-derived exponent:
    /// `H_exp(d) = SHA-256(context_digest || "depth:" || decimal(d))`,
    /// interpreted big-endian. The reduction modulo `λ_bound = 2^256` is
    /// the identity on a SHA-256 output.
    pub fn h_exp(&self, depth: u64) -> BigUint {
        let mut hasher = Sha256::new();
        hasher.update(self.digest.as_bytes());
        hasher.update(b"depth:");
        hasher.update(depth.to_string().as_bytes());
        BigUint::from_bytes_be(&hasher.finalize())
    }

    /// Fold seed binding an archived fingerprint to its restart:
    /// `SHA-256(context_digest || "fold:" || T_bytes || decimal(depth))`.
    pub fn fold_seed(&self, t: &BigUint, depth: u32) -> Digest32 {
        let mut hasher = Sha256::new();
        hasher.update(self.digest.as_bytes());
        hasher.update(b"fold:");
        hasher.update(t.to_bytes_be());
        hasher.update(depth.to_string().as_bytes());
        Digest32::from_bytes(hasher.finalize().into())
    }

    /// Quadratic-residue check, available only while the factorization is
    /// retained (test mode). Returns `None` in production contexts.
    pub fn is_quadratic_residue(&self, x: &BigUint) -> Option<bool> {
        let factors = self.factors.as_ref()?;
        let p = BigUint::from_bytes_be(&factors.p);
        let q = BigUint::from_bytes_be(&factors.q);
        Some(legendre_is_one(x, &p) && legendre_is_one(x, &q))
    }

    /// Whether this context retains its factorization (test mode).
    pub fn retains_factors(&self) -> bool {
        self.factors.is_some()
    }

    /// Whether the digest was computed with the factor-retention flag.
    pub fn debug_flagged(&self) -> bool {
        self.debug_flag
    }

    /// The modulus `M`.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The generator `G`.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// The initial seed `T₀`.
    pub fn seed_t0(&self) -> &BigUint {
        &self.seed
    }

    /// Modulus size in bits.
    pub fn bit_length(&self) -> u32 {
        self.bit_length
    }

    /// Fold threshold.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Bit length of registry primes.
    pub fn prime_bits(&self) -> u32 {
        self.prime_bits
    }

    /// Whether the modulus factors are safe primes.
    pub fn safe_primes(&self) -> bool {
        self.safe_primes
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_params(params: &ContextParams) -> Result<()> {
    if params.bit_length < MIN_BIT_LENGTH {
        return Err(SighaError::WeakParameters(format!(
            "bit length {} below the {MIN_BIT_LENGTH}-bit minimum",
            params.bit_length
        )));
    }
    if params.bit_length % 2 != 0 {
        return Err(SighaError::WeakParameters(format!(
            "bit length {} must be even",
            params.bit_length
        )));
    }
    if params.max_depth == 0 {
        return Err(SighaError::InvalidArgument(
            "max depth must be positive".into(),
        ));
    }
    if params.prime_bits < 16 {
        return Err(SighaError::WeakParameters(format!(
            "registry prime bit length {} is too small",
            params.prime_bits
        )));
    }
    Ok(())
}

fn sample_factor(
    bits: u64,
    rounds: u32,
    safe: bool,
    rng: &mut (impl Rng + ?Sized),
) -> Result<BigUint> {
    if safe {
        generate_safe_prime(bits, rounds, rng)
    } else {
        generate_prime(bits, rounds, rng)
    }
}

/// Sample `g² mod M` for a random unit `g`, rejecting trivial elements.
fn sample_square(modulus: &BigUint, rng: &mut (impl Rng + ?Sized)) -> Result<BigUint> {
    let one = BigUint::one();
    let m_minus_1 = modulus - &one;
    loop {
        let g = rand_below(rng, modulus)?;
        if g <= one || g == m_minus_1 {
            continue;
        }
        let square = (&g * &g) % modulus;
        if element_in_group(&square, modulus) {
            return Ok(square);
        }
    }
}

fn element_in_group(x: &BigUint, modulus: &BigUint) -> bool {
    *x > BigUint::one() && x < modulus && gcd(x, modulus).is_one()
}

fn legendre_is_one(x: &BigUint, p: &BigUint) -> bool {
    let exp: BigUint = (p - BigUint::one()) >> 1u32;
    x.modpow(&exp, p).is_one()
}

fn compute_digest(
    bit_length: u32,
    modulus: &BigUint,
    generator: &BigUint,
    seed: &BigUint,
    debug_retain_factors: bool,
) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(b"SIGHA-CTX-v1");
    hasher.update(bit_length.to_le_bytes());
    for n in [modulus, generator, seed] {
        let dec = to_decimal(n);
        hasher.update((dec.len() as u32).to_le_bytes());
        hasher.update(dec.as_bytes());
    }
    hasher.update(HEXP_WIDTH_BITS.to_le_bytes());
    hasher.update([u8::from(debug_retain_factors)]);
    Digest32::from_bytes(hasher.finalize().into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_params() -> ContextParams {
        ContextParams {
            bit_length: 512,
            max_depth: 3,
            prime_bits: 256,
            safe_primes: false,
            debug_retain_factors: true,
        }
    }

    fn test_context() -> CryptoContext {
        let mut rng = StdRng::seed_from_u64(0);
        CryptoContext::generate_with_rng(test_params(), &mut rng).unwrap()
    }

    #[test]
    fn test_generation_invariants() {
        let ctx = test_context();
        let m_bits = ctx.modulus().bits();
        assert!(m_bits == 512 || m_bits == 511);
        assert!(ctx.verify_in_group(ctx.generator()));
        assert!(ctx.verify_in_group(ctx.seed_t0()));
        assert_ne!(ctx.generator(), ctx.seed_t0());
    }

    #[test]
    fn test_generator_and_seed_are_residues() {
        let ctx = test_context();
        assert_eq!(ctx.is_quadratic_residue(ctx.generator()), Some(true));
        assert_eq!(ctx.is_quadratic_residue(ctx.seed_t0()), Some(true));
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let mut rng_a = StdRng::seed_from_u64(0);
        let mut rng_b = StdRng::seed_from_u64(0);
        let a = CryptoContext::generate_with_rng(test_params(), &mut rng_a).unwrap();
        let b = CryptoContext::generate_with_rng(test_params(), &mut rng_b).unwrap();
        assert_eq!(a.modulus(), b.modulus());
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_undersized_bit_length_rejected() {
        let params = ContextParams {
            bit_length: 128,
            ..test_params()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            CryptoContext::generate_with_rng(params, &mut rng),
            Err(SighaError::WeakParameters(_))
        ));
    }

    #[test]
    fn test_odd_bit_length_rejected() {
        let params = ContextParams {
            bit_length: 513,
            ..test_params()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(CryptoContext::generate_with_rng(params, &mut rng).is_err());
    }

    #[test]
    fn test_zero_max_depth_rejected() {
        let params = ContextParams {
            max_depth: 0,
            ..test_params()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            CryptoContext::generate_with_rng(params, &mut rng),
            Err(SighaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_verify_in_group_bounds() {
        let ctx = test_context();
        assert!(!ctx.verify_in_group(&BigUint::from(0u32)));
        assert!(!ctx.verify_in_group(&BigUint::from(1u32)));
        assert!(!ctx.verify_in_group(ctx.modulus()));
        assert!(ctx.verify_in_group(&BigUint::from(4u32)));
    }

    #[test]
    fn test_debug_flag_changes_digest() {
        let mut rng_a = StdRng::seed_from_u64(0);
        let mut rng_b = StdRng::seed_from_u64(0);
        let retained =
            CryptoContext::generate_with_rng(test_params(), &mut rng_a).unwrap();
        let scrubbed = CryptoContext::generate_with_rng(
            ContextParams {
                debug_retain_factors: false,
                ..test_params()
            },
            &mut rng_b,
        )
        .unwrap();
        // Same group parameters, different digest: retention is visible.
        assert_eq!(retained.modulus(), scrubbed.modulus());
        assert_ne!(retained.digest(), scrubbed.digest());
        assert!(scrubbed.is_quadratic_residue(scrubbed.generator()).is_none());
    }

    #[test]
    fn test_h_exp_depends_on_depth() {
        let ctx = test_context();
        assert_ne!(ctx.h_exp(1), ctx.h_exp(2));
        assert_eq!(ctx.h_exp(5), ctx.h_exp(5));
        assert!(ctx.h_exp(1).bits() <= 256);
    }

    #[test]
    fn test_from_parts_round_trip() {
        let ctx = test_context();
        let rebuilt = CryptoContext::from_parts(
            ctx.bit_length(),
            ctx.max_depth(),
            ctx.modulus().clone(),
            ctx.generator().clone(),
            ctx.seed_t0().clone(),
            ctx.safe_primes(),
            ctx.debug_flagged(),
        )
        .unwrap();
        assert_eq!(rebuilt.modulus(), ctx.modulus());
        assert_eq!(rebuilt.digest(), ctx.digest());
        assert!(!rebuilt.retains_factors());
    }

    #[test]
    fn test_from_parts_rejects_crafted_elements() {
        let ctx = test_context();
        let crafted = CryptoContext::from_parts(
            ctx.bit_length(),
            ctx.max_depth(),
            ctx.modulus().clone(),
            BigUint::from(1u32),
            ctx.seed_t0().clone(),
            false,
            false,
        );
        assert!(matches!(crafted, Err(SighaError::WeakParameters(_))));
    }
}
