//! Stable content hashes for plans (blake3 over canonical JSON).

use std::fmt;

use serde::Serialize;

use crate::error::Result;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First 8 bytes as hex; enough to tell plans apart in logs.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.short())
    }
}

/// Hash any serializable value through its JSON encoding.
pub fn hash_serde<T: Serialize>(value: &T) -> Result<Hash256> {
    let bytes = serde_json::to_vec(value)?;
    Ok(Hash256(*blake3::hash(&bytes).as_bytes()))
}
