//! Building and opening protected payload chunks.
//!
//! [`seal_chunk`] turns a decoded [`PayloadChunk`] into its wire
//! [`ChunkEnvelope`]: compress (when an algorithm is set and there is data),
//! CBOR-encode the body, AEAD-protect it. [`open_chunk`] is the exact
//! inverse. Neither performs I/O.

use bytes::Bytes;
use thiserror::Error;
use veilframe_crypto::{CryptoError, NONCE_RANDOM_SIZE, PayloadCryptoContext, SealedBlob};
use veilframe_proto::{ChunkBody, ChunkEnvelope, PayloadChunk, ProtoError};

use crate::compress::{self, CompressionError};

/// Errors from building or opening a chunk.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Payload compression or decompression failed.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// AEAD protection failed or the envelope did not authenticate.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The chunk body could not be encoded or decoded.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The decoded body carried an illegal sequence number.
    ///
    /// Sequence numbers start at 1; zero means a malformed sender.
    #[error("invalid chunk sequence number 0")]
    ZeroSequenceNumber,

    /// The envelope authenticated but contained no chunk body.
    #[error("envelope contains no chunk body")]
    EmptyBody,
}

/// Protects a chunk for the wire.
///
/// `nonce_random` must be fresh randomness for every call; the output
/// stream draws it from its [`Environment`](crate::env::Environment).
/// Empty data is legal and never compressed, so the terminal end-of-message
/// marker stays minimal.
pub fn seal_chunk(
    chunk: &PayloadChunk,
    crypto: &PayloadCryptoContext,
    nonce_random: [u8; NONCE_RANDOM_SIZE],
) -> Result<ChunkEnvelope, ChunkError> {
    let (compression, data) = match chunk.compression {
        Some(algorithm) if !chunk.data.is_empty() => {
            let compressed = compress::compress(algorithm, &chunk.data)?;
            (Some(algorithm), Bytes::from(compressed))
        },
        _ => (None, chunk.data.clone()),
    };

    let body = ChunkBody {
        sequence_number: chunk.sequence_number,
        message_id: chunk.message_id,
        end_of_message: chunk.end_of_message,
        compression,
        data,
    };

    let mut plaintext = Vec::new();
    veilframe_proto::encode_object(&body, &mut plaintext)?;

    let sealed = crypto.seal(&plaintext, nonce_random)?;

    Ok(ChunkEnvelope { nonce: sealed.nonce, ciphertext: Bytes::from(sealed.ciphertext) })
}

/// Opens a wire envelope back into a decoded chunk.
///
/// Fails with [`ChunkError::Crypto`] when the envelope does not
/// authenticate, [`ChunkError::Proto`] when the protected body is
/// malformed, and [`ChunkError::Compression`] when the data does not
/// decompress under its advertised algorithm.
pub fn open_chunk(
    envelope: &ChunkEnvelope,
    crypto: &PayloadCryptoContext,
) -> Result<PayloadChunk, ChunkError> {
    let blob = SealedBlob { nonce: envelope.nonce, ciphertext: envelope.ciphertext.to_vec() };
    let plaintext = crypto.open(&blob)?;

    let mut reader = veilframe_proto::WireReader::new(&plaintext);
    let body: ChunkBody = reader.next()?.ok_or(ChunkError::EmptyBody)?;

    if body.sequence_number == 0 {
        return Err(ChunkError::ZeroSequenceNumber);
    }

    let data = match body.compression {
        Some(algorithm) => Bytes::from(compress::decompress(algorithm, &body.data)?),
        None => body.data,
    };

    Ok(PayloadChunk {
        sequence_number: body.sequence_number,
        message_id: body.message_id,
        end_of_message: body.end_of_message,
        compression: body.compression,
        data,
    })
}
