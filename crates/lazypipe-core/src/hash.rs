//! Stable hashing helpers for plans, manifests, and output digests.

use blake3::Hasher;
use serde::Serialize;

use crate::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }

    /// First `n` hex chars, for log lines.
    pub fn short(&self, n: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(n.min(64));
        hex
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v).map_err(|e| crate::error::Error::Hash(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

/// Incremental digest over an ordered item sequence.
///
/// Each item is framed by its JSON length so `[ab][c]` and `[a][bc]` differ.
pub struct ItemDigest {
    hasher: Hasher,
    count: u64,
}

impl ItemDigest {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
            count: 0,
        }
    }

    pub fn update(&mut self, item: &Item) -> Result<(), crate::error::Error> {
        let bytes = serde_json::to_vec(item)?;
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(&bytes);
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn finish(self) -> Hash256 {
        Hash256(self.hasher.finalize().into())
    }
}

impl Default for ItemDigest {
    fn default() -> Self {
        Self::new()
    }
}
