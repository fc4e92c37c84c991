//! Framing engine error types.

use thiserror::Error;
use veilframe_proto::ProtoError;

use crate::chunk::ChunkError;

/// Errors from message output stream operations.
///
/// Negotiation failure is not represented here: rejecting a compression
/// algorithm is a `false` result from
/// [`set_compression_algorithm`](crate::MessageOutputStream::set_compression_algorithm),
/// not an error. Deadline expiry is likewise kept disjoint, as
/// [`Outcome::TimedOut`](crate::Outcome::TimedOut).
#[derive(Debug, Error)]
pub enum StreamError {
    /// Write attempted on a stream whose header forbids payload.
    ///
    /// Error and handshake messages are header-only; writing to them is a
    /// defect in the calling protocol logic, not a runtime condition.
    #[error("message {message_id} does not accept payload (error or handshake header)")]
    PayloadForbidden {
        /// Message id of the offending stream.
        message_id: u64,
    },

    /// Write attempted after the stream was closed.
    #[error("message output stream already closed")]
    Closed,

    /// A payload-eligible header was given no payload crypto context.
    #[error("payload-eligible message {message_id} requires a crypto context")]
    MissingCryptoContext {
        /// Message id of the offending stream.
        message_id: u64,
    },

    /// Chunk building failed (compression, crypto, or encoding).
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// Header or envelope wire encoding failed.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The destination sink failed.
    #[error("destination write failed: {0}")]
    Io(#[from] std::io::Error),
}
