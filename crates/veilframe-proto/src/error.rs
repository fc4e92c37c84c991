//! Wire encoding error types.

use thiserror::Error;

/// Errors from encoding or decoding wire objects.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// CBOR encoding failed.
    #[error("wire encode error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    /// CBOR decoding failed or the byte stream is malformed.
    #[error("wire decode error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
}
