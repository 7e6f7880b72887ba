//! # BigInt Backend — Arithmetic at the Group Boundary
//!
//! Thin, checked wrappers around `num-bigint` for the operations the
//! accumulator core needs: modular exponentiation, GCD, modular inverse,
//! fair random sampling, and the canonical decimal codec used on every
//! serialization boundary.
//!
//! ## Wire Discipline
//!
//! Big integers cross module and serialization boundaries as **decimal
//! strings** — no sign, no leading zeros except for `"0"`. Hex with a
//! `"0x"` prefix is additionally accepted on import. Internally everything
//! is a `BigUint`; conversion happens only at the edges.
//!
//! ## Timing
//!
//! `modpow` is `num-bigint`'s square-and-multiply. That is acceptable for
//! the accumulator's threat model (the exponents are public path material,
//! not secrets); deployments needing constant-time exponentiation should
//! swap the backend behind this module.

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

use sigha_core::{Result, SighaError};

/// Render a big integer in the canonical decimal form.
///
/// The output has no sign and no leading zeros; zero renders as `"0"`.
pub fn to_decimal(n: &BigUint) -> String {
    n.to_str_radix(10)
}

/// Parse a big integer from the boundary representation.
///
/// Accepts canonical decimal, plus `"0x"`-prefixed hex on import.
///
/// # Errors
///
/// Returns `InvalidArgument` for the empty string, non-digit characters,
/// or non-canonical decimal (leading zeros).
pub fn parse_decimal(s: &str) -> Result<BigUint> {
    if s.is_empty() {
        return Err(SighaError::InvalidArgument(
            "empty big integer string".into(),
        ));
    }
    if let Some(hex) = s.strip_prefix("0x") {
        return BigUint::parse_bytes(hex.as_bytes(), 16)
            .ok_or_else(|| SighaError::InvalidArgument(format!("invalid hex integer: {s:?}")));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SighaError::InvalidArgument(format!(
            "invalid decimal integer: {s:?}"
        )));
    }
    if s.len() > 1 && s.starts_with('0') {
        return Err(SighaError::InvalidArgument(format!(
            "non-canonical decimal (leading zeros): {s:?}"
        )));
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| SighaError::InvalidArgument(format!("invalid decimal integer: {s:?}")))
}

/// Modular exponentiation `base^exp mod modulus`.
///
/// # Errors
///
/// Returns `InvalidArgument` when the modulus is zero.
pub fn pow_mod(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(SighaError::InvalidArgument("zero modulus".into()));
    }
    Ok(base.modpow(exp, modulus))
}

/// Greatest common divisor.
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

/// Modular inverse of `a` modulo `m`, if `gcd(a, m) = 1`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }
    let a = BigInt::from_biguint(Sign::Plus, a.clone());
    let m_signed = BigInt::from_biguint(Sign::Plus, m.clone());
    let ext = a.extended_gcd(&m_signed);
    if !ext.gcd.is_one() {
        return None;
    }
    let inv = ext.x.mod_floor(&m_signed);
    inv.to_biguint()
}

/// Fair uniform sample from `[0, n)`.
///
/// # Errors
///
/// Returns `InvalidArgument` when `n` is zero.
pub fn rand_below(rng: &mut (impl Rng + ?Sized), n: &BigUint) -> Result<BigUint> {
    if n.is_zero() {
        return Err(SighaError::InvalidArgument(
            "empty sampling range".into(),
        ));
    }
    Ok(rng.gen_biguint_below(n))
}

/// Sample a `bits`-bit odd candidate with top and bottom bits set.
pub fn rand_odd_with_bits(rng: &mut (impl Rng + ?Sized), bits: u64) -> BigUint {
    let mut candidate = rng.gen_biguint(bits);
    candidate.set_bit(bits - 1, true);
    candidate.set_bit(0, true);
    candidate
}

/// Serde adapter representing a `BigUint` as its canonical decimal string.
///
/// Used with `#[serde(with = "crate::bigint::serde_decimal")]` on every
/// field that crosses a serialization boundary.
pub mod serde_decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(n: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_decimal(n))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_decimal(&s).map_err(serde::de::Error::custom)
    }
}
