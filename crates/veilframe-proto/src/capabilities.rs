//! Message capability sets and their negotiation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::compression::CompressionAlgorithm;

/// Capabilities one side advertises for a message exchange.
///
/// Currently this is the set of compression algorithms the side is willing
/// to accept. The set is duplicate-free and order-independent; negotiation
/// over two capability sets is a plain intersection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCapabilities {
    /// Supported compression algorithms.
    pub compression_algorithms: BTreeSet<CompressionAlgorithm>,
}

impl MessageCapabilities {
    /// Capabilities supporting the given algorithms.
    pub fn new<I: IntoIterator<Item = CompressionAlgorithm>>(algorithms: I) -> Self {
        Self { compression_algorithms: algorithms.into_iter().collect() }
    }

    /// Capabilities supporting no compression at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Algorithms supported by both sides.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            compression_algorithms: self
                .compression_algorithms
                .intersection(&other.compression_algorithms)
                .copied()
                .collect(),
        }
    }

    /// Whether the given algorithm is in this capability set.
    pub fn supports(&self, algorithm: CompressionAlgorithm) -> bool {
        self.compression_algorithms.contains(&algorithm)
    }

    /// The most preferred algorithm in this set, if any.
    pub fn preferred_compression(&self) -> Option<CompressionAlgorithm> {
        CompressionAlgorithm::preferred(&self.compression_algorithms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(algos: &[CompressionAlgorithm]) -> MessageCapabilities {
        MessageCapabilities::new(algos.iter().copied())
    }

    #[test]
    fn intersection_keeps_common_algorithms() {
        let local = caps(&[CompressionAlgorithm::Gzip, CompressionAlgorithm::Lzw]);
        let remote = caps(&[CompressionAlgorithm::Lzw]);

        let shared = local.intersect(&remote);
        assert!(shared.supports(CompressionAlgorithm::Lzw));
        assert!(!shared.supports(CompressionAlgorithm::Gzip));
    }

    #[test]
    fn intersection_with_empty_is_empty() {
        let local = caps(&[CompressionAlgorithm::Gzip, CompressionAlgorithm::Lzw]);
        let shared = local.intersect(&MessageCapabilities::none());

        assert_eq!(shared, MessageCapabilities::none());
        assert_eq!(shared.preferred_compression(), None);
    }

    #[test]
    fn preferred_follows_ranking() {
        let both = caps(&[CompressionAlgorithm::Lzw, CompressionAlgorithm::Gzip]);
        assert_eq!(both.preferred_compression(), Some(CompressionAlgorithm::Gzip));
    }

    #[test]
    fn capabilities_serde_roundtrip() {
        let original = caps(&[CompressionAlgorithm::Gzip]);

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&original, &mut bytes).expect("encode");

        let decoded: MessageCapabilities = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(original, decoded);
    }
}
