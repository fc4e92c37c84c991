//! Veilframe payload protection primitives.
//!
//! This crate provides the opaque crypto capability the framing engine uses
//! to protect payload chunk bodies.
//!
//! # Design
//!
//! All operations here are pure: they have no side effects and produce
//! deterministic outputs given the same inputs. Random bytes required for
//! encryption must be provided by the caller, enabling:
//!
//! - Deterministic testing with seeded RNG
//! - Sans-IO architecture compatibility
//! - No coupling to application-level abstractions
//!
//! # Security Properties
//!
//! - Confidentiality and integrity: XChaCha20-Poly1305 AEAD over each chunk
//!   body
//! - Key separation: per-message keys are derived from a master secret and
//!   the message id with a domain-separation label

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod sealed;

pub use sealed::{
    CHUNK_KEY_SIZE, CryptoError, NONCE_RANDOM_SIZE, PayloadCryptoContext, SealedBlob,
};
