//! # Wire Format — The Serialized State Blob
//!
//! Length-prefixed binary layout for the accumulator state round-trip:
//!
//! ```text
//! HEADER    : magic "SIGHA1" (6) | version u8 | flags u8
//! CONTEXT   : bit_length u32 LE | max_depth u32 LE |
//!             len_M u32 LE | M decimal | len_G u32 LE | G decimal |
//!             len_T0 u32 LE | T0 decimal
//! STATE     : len_T u32 LE | T decimal | depth u32 LE
//! SNAPSHOTS : count u32 LE | { len_T u32 LE | T decimal |
//!             depth u32 LE | fold_seed (32) }
//! FOOTER    : context_digest (32) | state_digest (32)
//! ```
//!
//! Big integers travel as canonical decimal strings (`0x`-hex accepted
//! on import). `state_digest` covers the exact STATE and SNAPSHOTS byte
//! ranges as written, so truncation and splicing are both detectable.

use sha2::{Digest, Sha256};

use sigha_core::{Digest32, Result, SighaError};

use crate::accumulator::{SnapshotAccumulator, SnapshotRecord};
use crate::bigint::{parse_decimal, to_decimal};
use crate::context::CryptoContext;

/// Blob magic.
pub const MAGIC: &[u8; 6] = b"SIGHA1";

/// Current blob version.
pub const VERSION: u8 = 1;

/// Flag bit: the context modulus was generated from safe primes.
pub const FLAG_SAFE_PRIMES: u8 = 0b0000_0001;

/// Flag bit: the accumulator was sealed when exported.
pub const FLAG_SEALED: u8 = 0b0000_0010;

/// Flag bit: the context was generated in factor-retaining test mode.
/// Enters the digest recomputation; the factors themselves never travel.
pub const FLAG_DEBUG_CONTEXT: u8 = 0b0000_0100;

/// Sanity cap on any length-prefixed integer field.
const MAX_INT_LEN: u32 = 65_536;

/// Sanity cap on the snapshot count.
const MAX_SNAPSHOTS: u32 = 65_536;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize an accumulator (context, state, snapshot chain) to a blob.
pub fn encode_state(acc: &SnapshotAccumulator) -> Vec<u8> {
    let ctx = acc.context();
    let mut out = Vec::new();

    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    let mut flags = 0u8;
    if ctx.safe_primes() {
        flags |= FLAG_SAFE_PRIMES;
    }
    if acc.is_sealed() {
        flags |= FLAG_SEALED;
    }
    if ctx.debug_flagged() {
        flags |= FLAG_DEBUG_CONTEXT;
    }
    out.push(flags);

    out.extend_from_slice(&ctx.bit_length().to_le_bytes());
    out.extend_from_slice(&ctx.max_depth().to_le_bytes());
    write_bigint(&mut out, &to_decimal(ctx.modulus()));
    write_bigint(&mut out, &to_decimal(ctx.generator()));
    write_bigint(&mut out, &to_decimal(ctx.seed_t0()));

    let body_start = out.len();
    write_bigint(&mut out, &to_decimal(acc.current_t()));
    out.extend_from_slice(&acc.depth().to_le_bytes());

    out.extend_from_slice(&(acc.snapshot_chain().len() as u32).to_le_bytes());
    for record in acc.snapshot_chain() {
        write_bigint(&mut out, &to_decimal(&record.fingerprint));
        out.extend_from_slice(&record.depth.to_le_bytes());
        out.extend_from_slice(record.fold_seed.as_bytes());
    }
    let body_end = out.len();

    out.extend_from_slice(ctx.digest().as_bytes());
    let state_digest: [u8; 32] = Sha256::digest(&out[body_start..body_end]).into();
    out.extend_from_slice(&state_digest);
    out
}

fn write_bigint(out: &mut Vec<u8>, decimal: &str) {
    out.extend_from_slice(&(decimal.len() as u32).to_le_bytes());
    out.extend_from_slice(decimal.as_bytes());
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Rebuild an accumulator from a blob.
///
/// # Errors
///
/// `Deserialization` for a bad magic, unknown version or flags,
/// truncation, oversized fields, or a footer digest mismatch;
/// `WeakParameters` when the embedded context or fingerprint fails the
/// group invariants.
pub fn decode_state(bytes: &[u8]) -> Result<SnapshotAccumulator> {
    let mut reader = Reader::new(bytes);

    let magic = reader.take(6)?;
    if magic != MAGIC {
        return Err(SighaError::Deserialization("bad magic".into()));
    }
    let version = reader.take_u8()?;
    if version != VERSION {
        return Err(SighaError::Deserialization(format!(
            "unsupported version {version}"
        )));
    }
    let flags = reader.take_u8()?;
    if flags & !(FLAG_SAFE_PRIMES | FLAG_SEALED | FLAG_DEBUG_CONTEXT) != 0 {
        return Err(SighaError::Deserialization(format!(
            "unknown flag bits 0b{flags:08b}"
        )));
    }

    let bit_length = reader.take_u32()?;
    let max_depth = reader.take_u32()?;
    let modulus = reader.take_bigint()?;
    let generator = reader.take_bigint()?;
    let seed = reader.take_bigint()?;
    let ctx = CryptoContext::from_parts(
        bit_length,
        max_depth,
        modulus,
        generator,
        seed,
        flags & FLAG_SAFE_PRIMES != 0,
        flags & FLAG_DEBUG_CONTEXT != 0,
    )?;

    let body_start = reader.offset();
    let fingerprint = reader.take_bigint()?;
    let depth = reader.take_u32()?;

    let count = reader.take_u32()?;
    if count > MAX_SNAPSHOTS {
        return Err(SighaError::Deserialization(format!(
            "snapshot count {count} exceeds cap"
        )));
    }
    let mut snapshots = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let record_fingerprint = reader.take_bigint()?;
        let record_depth = reader.take_u32()?;
        let seed_bytes: [u8; 32] = reader
            .take(32)?
            .try_into()
            .map_err(|_| SighaError::Deserialization("short fold seed".into()))?;
        snapshots.push(SnapshotRecord {
            fingerprint: record_fingerprint,
            depth: record_depth,
            fold_seed: Digest32::from_bytes(seed_bytes),
        });
    }
    let body_end = reader.offset();

    let context_digest = reader.take_digest()?;
    let state_digest = reader.take_digest()?;
    if reader.offset() != bytes.len() {
        return Err(SighaError::Deserialization("trailing bytes".into()));
    }
    if context_digest != ctx.digest() {
        return Err(SighaError::Deserialization("context digest mismatch".into()));
    }
    let computed: [u8; 32] = Sha256::digest(&bytes[body_start..body_end]).into();
    if Digest32::from_bytes(computed) != state_digest {
        return Err(SighaError::Deserialization("state digest mismatch".into()));
    }

    let mut acc = SnapshotAccumulator::new(&ctx);
    acc.set_state(fingerprint, depth, snapshots)?;
    if flags & FLAG_SEALED != 0 {
        acc.mark_sealed();
    }
    Ok(acc)
}

/// Bounds-checked cursor over the blob.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.offset + n > self.bytes.len() {
            return Err(SighaError::Deserialization("truncated blob".into()));
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32> {
        let slice = self.take(4)?;
        Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    fn take_bigint(&mut self) -> Result<num_bigint::BigUint> {
        let len = self.take_u32()?;
        if len > MAX_INT_LEN {
            return Err(SighaError::Deserialization(format!(
                "integer field length {len} exceeds cap"
            )));
        }
        let slice = self.take(len as usize)?;
        let s = std::str::from_utf8(slice)
            .map_err(|_| SighaError::Deserialization("non-UTF-8 integer field".into()))?;
        parse_decimal(s).map_err(|e| SighaError::Deserialization(e.to_string()))
    }

    fn take_digest(&mut self) -> Result<Digest32> {
        let slice: [u8; 32] = self
            .take(32)?
            .try_into()
            .map_err(|_| SighaError::Deserialization("short digest".into()))?;
        Ok(Digest32::from_bytes(slice))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextParams;
    use crate::registry::PrimeRegistry;
    use crate::seal::StateSealer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sigha_core::AgentId;

    fn populated_accumulator() -> SnapshotAccumulator {
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
        for name in ["a", "b", "c", "d"] {
            acc.update(&registry, &AgentId::new(name).unwrap()).unwrap();
        }
        acc
    }

    #[test]
    fn test_round_trip() {
        let acc = populated_accumulator();
        let blob = encode_state(&acc);
        let decoded = decode_state(&blob).unwrap();
        assert_eq!(decoded.current_t(), acc.current_t());
        assert_eq!(decoded.depth(), acc.depth());
        assert_eq!(decoded.snapshot_chain(), acc.snapshot_chain());
        assert_eq!(decoded.context().digest(), acc.context().digest());
        assert!(!decoded.is_sealed());
    }

    #[test]
    fn test_sealed_flag_round_trip() {
        let mut acc = populated_accumulator();
        StateSealer::seal(&mut acc, b"payload").unwrap();
        let decoded = decode_state(&encode_state(&acc)).unwrap();
        assert!(decoded.is_sealed());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut blob = encode_state(&populated_accumulator());
        blob[0] = b'X';
        assert!(matches!(
            decode_state(&blob),
            Err(SighaError::Deserialization(_))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut blob = encode_state(&populated_accumulator());
        blob[6] = 99;
        assert!(decode_state(&blob).is_err());
    }

    #[test]
    fn test_unknown_flags_rejected() {
        let mut blob = encode_state(&populated_accumulator());
        blob[7] |= 0b1000_0000;
        assert!(decode_state(&blob).is_err());
    }

    #[test]
    fn test_truncation_rejected() {
        let blob = encode_state(&populated_accumulator());
        assert!(decode_state(&blob[..blob.len() - 1]).is_err());
        assert!(decode_state(&blob[..20]).is_err());
        assert!(decode_state(b"").is_err());
    }

    #[test]
    fn test_state_tamper_rejected() {
        let acc = populated_accumulator();
        let mut blob = encode_state(&acc);
        // Flip one byte of the fingerprint's decimal encoding.
        let body_start = blob.len() - 64 - mid_section_len(&acc);
        let digit = &mut blob[body_start + 4];
        *digit = if *digit == b'1' { b'2' } else { b'1' };
        assert!(matches!(
            decode_state(&blob),
            Err(SighaError::Deserialization(_))
        ));
    }

    fn mid_section_len(acc: &SnapshotAccumulator) -> usize {
        let mut len = 4 + to_decimal(acc.current_t()).len() + 4 + 4;
        for record in acc.snapshot_chain() {
            len += 4 + to_decimal(&record.fingerprint).len() + 4 + 32;
        }
        len
    }

    #[test]
    fn test_footer_tamper_rejected() {
        let mut blob = encode_state(&populated_accumulator());
        let footer = blob.len() - 1;
        blob[footer] ^= 0xff;
        assert!(decode_state(&blob).is_err());
    }
}
