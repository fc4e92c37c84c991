//! Compression algorithm identifiers and the preference ranking.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload compression algorithm.
///
/// The wire names are fixed strings so that both sides agree on the
/// identifier regardless of local enum layout. The declaration order is the
/// preference ranking: earlier variants are preferred during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// RFC 1952 gzip.
    #[serde(rename = "GZIP")]
    Gzip,
    /// Lempel-Ziv-Welch, MSB-first with 8-bit codes.
    #[serde(rename = "LZW")]
    Lzw,
}

impl CompressionAlgorithm {
    /// All known algorithms in preference order.
    pub const RANKED: [Self; 2] = [Self::Gzip, Self::Lzw];

    /// Picks the most preferred algorithm out of a set.
    ///
    /// Returns `None` for the empty set. Deterministic: the ranking is the
    /// fixed declaration order, independent of set iteration order.
    pub fn preferred(set: &BTreeSet<Self>) -> Option<Self> {
        Self::RANKED.into_iter().find(|algo| set.contains(algo))
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gzip => write!(f, "GZIP"),
            Self::Lzw => write!(f, "LZW"),
        }
    }
}
