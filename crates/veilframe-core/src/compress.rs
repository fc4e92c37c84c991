//! Payload compression codecs.
//!
//! Gzip via `flate2`, LZW via `weezl` (MSB bit order, 8-bit codes). The
//! framing engine treats these as opaque transforms; algorithm selection
//! happens in the output stream, never here.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;
use veilframe_proto::CompressionAlgorithm;

/// LZW code size for 8-bit payload bytes.
const LZW_CODE_SIZE: u8 = 8;

/// Errors from compressing or decompressing payload data.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Gzip stream error.
    #[error("gzip error: {0}")]
    Gzip(#[from] std::io::Error),

    /// LZW stream error.
    #[error("LZW error: {0}")]
    Lzw(#[from] weezl::LzwError),
}

/// Compresses `data` with the given algorithm.
pub fn compress(algorithm: CompressionAlgorithm, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    match algorithm {
        CompressionAlgorithm::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        },
        CompressionAlgorithm::Lzw => {
            let compressed =
                weezl::encode::Encoder::new(weezl::BitOrder::Msb, LZW_CODE_SIZE).encode(data)?;
            Ok(compressed)
        },
    }
}

/// Decompresses `data` with the given algorithm.
pub fn decompress(
    algorithm: CompressionAlgorithm,
    data: &[u8],
) -> Result<Vec<u8>, CompressionError> {
    match algorithm {
        CompressionAlgorithm::Gzip => {
            let mut decoder = GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            Ok(decompressed)
        },
        CompressionAlgorithm::Lzw => {
            let decompressed =
                weezl::decode::Decoder::new(weezl::BitOrder::Msb, LZW_CODE_SIZE).decode(data)?;
            Ok(decompressed)
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn compressible() -> Vec<u8> {
        b"we dig, dig, dig, dig, dig, dig, dig in our mine the whole day through".repeat(8)
    }

    #[test]
    fn gzip_roundtrip() {
        let data = compressible();
        let compressed = compress(CompressionAlgorithm::Gzip, &data).unwrap();
        assert!(compressed.len() < data.len());

        let restored = decompress(CompressionAlgorithm::Gzip, &compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn lzw_roundtrip() {
        let data = compressible();
        let compressed = compress(CompressionAlgorithm::Lzw, &data).unwrap();
        assert!(compressed.len() < data.len());

        let restored = decompress(CompressionAlgorithm::Lzw, &compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn gzip_rejects_garbage() {
        assert!(decompress(CompressionAlgorithm::Gzip, b"definitely not gzip").is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_data(
            data in proptest::collection::vec(any::<u8>(), 1..2048),
            algorithm in prop_oneof![
                Just(CompressionAlgorithm::Gzip),
                Just(CompressionAlgorithm::Lzw),
            ],
        ) {
            let compressed = compress(algorithm, &data).unwrap();
            prop_assert_eq!(decompress(algorithm, &compressed).unwrap(), data);
        }
    }
}
