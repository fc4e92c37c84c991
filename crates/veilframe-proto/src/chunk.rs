//! Payload chunk data model.
//!
//! A chunk travels in three forms:
//!
//! 1. [`PayloadChunk`] — the decoded, immutable view an application sees:
//!    sequence number, message id, end-of-message flag, and the
//!    uncompressed data.
//! 2. [`ChunkBody`] — the plaintext wire body, with the data in its
//!    (possibly compressed) transport form. This is what gets protected.
//! 3. [`ChunkEnvelope`] — the outer wire object: an AEAD nonce and the
//!    ciphertext of the CBOR-encoded body.
//!
//! Building and opening envelopes requires compression and cryptography and
//! therefore lives in `veilframe-core`; this module only defines the shapes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::compression::CompressionAlgorithm;

/// AEAD nonce size for chunk envelopes (XChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 24;

/// A decoded payload chunk.
///
/// Immutable once built. Within one stream, sequence numbers are contiguous
/// starting at 1, and exactly one chunk (if any are emitted) carries
/// `end_of_message = true` — always the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadChunk {
    /// Position of this chunk within its message, starting at 1.
    pub sequence_number: u64,
    /// Message id copied from the owning header.
    pub message_id: u64,
    /// True only on the terminal chunk of a message.
    pub end_of_message: bool,
    /// Algorithm the data was compressed with on the wire, if any.
    pub compression: Option<CompressionAlgorithm>,
    /// Payload data, after decompression.
    pub data: Bytes,
}

/// Plaintext wire body of a chunk, prior to AEAD protection.
///
/// `compression` is present only when `data` is actually compressed; a
/// chunk whose data went out uncompressed (including every empty chunk)
/// omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBody {
    /// Position of this chunk within its message, starting at 1.
    pub sequence_number: u64,
    /// Message id copied from the owning header.
    pub message_id: u64,
    /// True only on the terminal chunk of a message.
    pub end_of_message: bool,
    /// Compression applied to `data`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub compression: Option<CompressionAlgorithm>,
    /// Payload data in transport form.
    pub data: Bytes,
}

/// Protected chunk as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEnvelope {
    /// AEAD nonce used to protect the body.
    pub nonce: [u8; NONCE_SIZE],
    /// AEAD ciphertext of the CBOR-encoded [`ChunkBody`].
    pub ciphertext: Bytes,
}
