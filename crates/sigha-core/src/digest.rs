//! # Digest32 — Fixed-Width Digest Currency
//!
//! A 32-byte digest newtype used everywhere a hash value crosses a module
//! boundary: context digests, fold seeds, payload digests, seal anchors.
//!
//! Serde represents a `Digest32` as a 64-character lowercase hex string so
//! that seals and snapshot bundles stay readable on the JSON boundary.

use serde::{Deserialize, Serialize};

/// A 32-byte digest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Digest32([u8; 32]);

impl Digest32 {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string into a digest.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk).ok()?;
            out[i] = u8::from_str_radix(s, 16).ok()?;
        }
        Some(Self(out))
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Digest32> for String {
    fn from(d: Digest32) -> Self {
        d.to_hex()
    }
}

impl TryFrom<String> for Digest32 {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Digest32::from_hex(&s).ok_or_else(|| format!("invalid digest hex: {s:?}"))
    }
}

impl std::fmt::Display for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let d = Digest32::from_bytes([0xab; 32]);
        assert_eq!(d.to_hex().len(), 64);
        assert_eq!(Digest32::from_hex(&d.to_hex()), Some(d));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Digest32::from_hex("zz").is_none());
        assert!(Digest32::from_hex(&"g".repeat(64)).is_none());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let d = Digest32::from_bytes([7u8; 32]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let parsed: Digest32 = serde_json::from_str(&json).unwrap();
        assert_eq!(d, parsed);
    }
}
