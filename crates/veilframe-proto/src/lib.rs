//! Veilframe wire types.
//!
//! This crate defines the passive data model of a Veilframe message and the
//! pure negotiation logic over compression capabilities. It performs no I/O
//! and no cryptography; protecting chunk bodies is the job of
//! `veilframe-crypto`, and emitting them belongs to `veilframe-core`.
//!
//! # Wire layout
//!
//! A message on the wire is a sequence of CBOR objects:
//!
//! ```text
//! [ Header ] [ ChunkEnvelope ]*
//! ```
//!
//! Exactly one header, followed by zero or more payload chunk envelopes in
//! ascending sequence-number order. The last envelope (if any exist) carries
//! the end-of-message flag inside its protected body. Error and handshake
//! messages carry no envelopes at all.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capabilities;
pub mod chunk;
pub mod compression;
pub mod error;
pub mod header;
pub mod wire;

pub use capabilities::MessageCapabilities;
pub use chunk::{ChunkBody, ChunkEnvelope, NONCE_SIZE, PayloadChunk};
pub use compression::CompressionAlgorithm;
pub use error::ProtoError;
pub use header::{ErrorCode, ErrorHeader, Header, MessageHeader};
pub use wire::{WireReader, encode_object};
