//! Message and error headers.
//!
//! A header is the first object of every wire message. It is immutable once
//! constructed; the output stream only ever reads it. Header authentication
//! and key material live outside this crate — here a header is plain data.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::capabilities::MessageCapabilities;
use crate::compression::CompressionAlgorithm;
use std::collections::BTreeSet;

/// Ordinary (request/response) message header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Message identifier, constant for the lifetime of the message.
    pub message_id: u64,
    /// True for a header-only handshake step; handshake messages forbid
    /// payload.
    pub handshake: bool,
    /// Whether the sender permits master-token renewal against this message.
    pub renewable: bool,
    /// Capabilities the sender advertises for this message, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub capabilities: Option<MessageCapabilities>,
}

/// Error response code carried by an error header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ErrorCode {
    /// Unrecoverable failure.
    Fail = 1,
    /// Transient failure; the sender may retry the exchange.
    TransientFailure = 2,
    /// The entity must re-authenticate.
    EntityReauth = 3,
    /// The user must re-authenticate.
    UserReauth = 4,
}

/// Error message header.
///
/// Error messages are header-only: they never carry payload chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHeader {
    /// Message identifier of the failed exchange.
    pub message_id: u64,
    /// Machine-readable response code.
    pub code: ErrorCode,
    /// Human-readable error description.
    pub message: String,
}

/// The first object of a wire message.
///
/// A closed union over the two header variants. The output stream consumes
/// the variant distinction exactly once at construction to derive its
/// payload-eligibility flag, rather than re-checking the variant on every
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Header {
    /// Ordinary message header.
    Message(MessageHeader),
    /// Error header.
    Error(ErrorHeader),
}

impl Header {
    /// Whether this is the error variant.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Whether this header belongs to a handshake message.
    ///
    /// Error headers are never handshakes.
    pub fn is_handshake(&self) -> bool {
        match self {
            Self::Message(header) => header.handshake,
            Self::Error(_) => false,
        }
    }

    /// The message identifier.
    pub fn message_id(&self) -> u64 {
        match self {
            Self::Message(header) => header.message_id,
            Self::Error(header) => header.message_id,
        }
    }

    /// Compression algorithms advertised by this header.
    ///
    /// Error headers advertise nothing, as do message headers without
    /// capabilities.
    pub fn compression_algorithms(&self) -> BTreeSet<CompressionAlgorithm> {
        match self {
            Self::Message(header) => header
                .capabilities
                .as_ref()
                .map(|caps| caps.compression_algorithms.clone())
                .unwrap_or_default(),
            Self::Error(_) => BTreeSet::new(),
        }
    }
}

impl From<MessageHeader> for Header {
    fn from(header: MessageHeader) -> Self {
        Self::Message(header)
    }
}

impl From<ErrorHeader> for Header {
    fn from(header: ErrorHeader) -> Self {
        Self::Error(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_header() -> MessageHeader {
        MessageHeader {
            message_id: 1,
            handshake: false,
            renewable: false,
            capabilities: Some(MessageCapabilities::new([
                CompressionAlgorithm::Gzip,
                CompressionAlgorithm::Lzw,
            ])),
        }
    }

    #[test]
    fn message_header_accessors() {
        let header = Header::from(message_header());

        assert!(!header.is_error());
        assert!(!header.is_handshake());
        assert_eq!(header.message_id(), 1);
        assert!(header.compression_algorithms().contains(&CompressionAlgorithm::Gzip));
    }

    #[test]
    fn error_header_advertises_nothing() {
        let header = Header::from(ErrorHeader {
            message_id: 7,
            code: ErrorCode::Fail,
            message: "errormsg".to_string(),
        });

        assert!(header.is_error());
        assert!(!header.is_handshake());
        assert!(header.compression_algorithms().is_empty());
    }

    #[test]
    fn handshake_flag_comes_from_message_variant() {
        let header = Header::from(MessageHeader {
            message_id: 2,
            handshake: true,
            renewable: false,
            capabilities: None,
        });

        assert!(header.is_handshake());
        assert!(header.compression_algorithms().is_empty());
    }

    #[test]
    fn header_serde_roundtrip() {
        let original = Header::from(message_header());

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&original, &mut bytes).expect("encode");

        let decoded: Header = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(original, decoded);
    }

    #[test]
    fn error_code_is_stable_on_the_wire() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&ErrorCode::EntityReauth, &mut bytes).expect("encode");

        let raw: u8 = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(raw, 3);
    }
}
