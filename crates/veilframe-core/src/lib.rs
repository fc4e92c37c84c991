//! Veilframe outbound framing engine.
//!
//! Turns application byte writes into a well-formed, sequenced, optionally
//! compressed, encrypted wire message: one header followed by zero or more
//! protected payload chunks.
//!
//! ## Architecture
//!
//! ```text
//! veilframe-core
//!   ├─ Environment          (entropy seam; SystemEnv in production)
//!   ├─ compress             (gzip / LZW payload codecs)
//!   ├─ chunk                (seal_chunk / open_chunk: compress + AEAD)
//!   └─ MessageOutputStream  (buffering, boundaries, sequencing, caching)
//! ```
//!
//! Wire types live in `veilframe-proto`; the AEAD capability lives in
//! `veilframe-crypto`. The destination seam is any
//! [`tokio::io::AsyncWrite`], and every operation is deadline-bounded with
//! a three-way [`Outcome`] (completed / timed out / failed).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chunk;
pub mod compress;
pub mod env;
pub mod error;
pub mod message_out;
pub mod outcome;

pub use chunk::{ChunkError, open_chunk, seal_chunk};
pub use compress::{CompressionError, compress, decompress};
pub use env::{Environment, SystemEnv};
pub use error::StreamError;
pub use message_out::MessageOutputStream;
pub use outcome::{Outcome, bounded};
