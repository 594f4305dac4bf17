// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Content hashing for offers. `OfferHash` is the stable identifier used
//! everywhere an offer is referenced: in the catalog, in gossip messages and
//! in the OP_RETURN commitment of its fee transaction.

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte double-SHA256 digest, displayed and parsed as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OfferHash(pub [u8; 32]);

impl OfferHash {
    pub const fn zero() -> Self {
        OfferHash([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for OfferHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OfferHash({})", self)
    }
}

impl fmt::Display for OfferHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for OfferHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let mut out = [0u8; 32];
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        out.copy_from_slice(&bytes);
        Ok(OfferHash(out))
    }
}

impl Serialize for OfferHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OfferHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        OfferHash::from_str(&s).map_err(DeError::custom)
    }
}

/// A small, append-only byte buffer used to build the canonical encoding of
/// an offer's hashed fields. Strings are length-prefixed (4-byte
/// little-endian) so that no field's content can bleed into its neighbor.
#[derive(Default)]
pub struct CanonicalEncoder(Vec<u8>);

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_bytes(&mut self, b: &[u8]) -> &mut Self {
        self.0.extend_from_slice(&(b.len() as u32).to_le_bytes());
        self.0.extend_from_slice(b);
        self
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.push_bytes(s.as_bytes())
    }

    pub fn push_u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn push_u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn push_u64(&mut self, v: u64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn push_i64(&mut self, v: i64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.0
    }
}

/// Double-SHA256, matching the digest construction used by the chain this
/// subsystem rides on top of (a Bitcoin-descendant UTXO chain).
pub fn double_sha256(data: &[u8]) -> OfferHash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    OfferHash(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrips_through_hex() {
        let h = double_sha256(b"hello offer");
        let s = h.to_string();
        let parsed: OfferHash = s.parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn encoder_is_deterministic() {
        let mut a = CanonicalEncoder::new();
        a.push_str("US").push_str("USD").push_u64(100);
        let mut b = CanonicalEncoder::new();
        b.push_str("US").push_str("USD").push_u64(100);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn length_prefix_prevents_field_bleed() {
        let mut a = CanonicalEncoder::new();
        a.push_str("ab").push_str("c");
        let mut b = CanonicalEncoder::new();
        b.push_str("a").push_str("bc");
        assert_ne!(a.finish(), b.finish());
    }
}
