use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 160-bit hash stored most significant byte first, so the derived
/// ordering matches the numeric ordering of the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash160(pub [u8; 20]);

impl Hash160 {
    pub const ZERO: Hash160 = Hash160([0u8; 20]);

    /// Build a hash whose low-order bytes hold `value` (handy for fixtures).
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Hash160(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash160 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Hash160(bytes))
    }
}

impl Serialize for Hash160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash160 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Where coins (or a reputation vote) point to.
///
/// Variant order matters: destinations sort `None < KeyHash < ScriptHash`,
/// then by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "hash", rename_all = "snake_case")]
pub enum Destination {
    #[default]
    None,
    KeyHash(Hash160),
    ScriptHash(Hash160),
}

impl Destination {
    /// The raw hash used for canonical tie-breaking. `None` hashes to zero.
    pub fn hash(&self) -> Hash160 {
        match self {
            Destination::None => Hash160::ZERO,
            Destination::KeyHash(h) | Destination::ScriptHash(h) => *h,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Destination::None)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::None => f.write_str("none"),
            Destination::KeyHash(h) => write!(f, "key:{h}"),
            Destination::ScriptHash(h) => write!(f, "script:{h}"),
        }
    }
}
