use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a single chain within the braided multi-chain graph.
///
/// Each chain maintains its own header history; a header store instance is
/// bound to exactly one `ChainId`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChainId(u32);

impl ChainId {
    /// Wrap a raw chain number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw chain number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChainId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Protocol version stamped into every block header.
///
/// Headers of different versions never belong to the same history; the
/// version participates in the canonical header encoding.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChainVersion(u32);

impl ChainVersion {
    /// Wrap a raw version number.
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    /// The raw version number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChainVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_roundtrip() {
        let c = ChainId::new(7);
        assert_eq!(c.get(), 7);
        assert_eq!(ChainId::from(7), c);
    }

    #[test]
    fn chain_id_display() {
        assert_eq!(format!("{}", ChainId::new(3)), "3");
    }

    #[test]
    fn chain_id_ordering() {
        assert!(ChainId::new(0) < ChainId::new(1));
    }

    #[test]
    fn version_display() {
        assert_eq!(format!("{}", ChainVersion::new(2)), "v2");
    }
}
