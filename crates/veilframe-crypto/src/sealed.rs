//! AEAD protection for payload chunk bodies.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

/// Size of a chunk protection key in bytes.
pub const CHUNK_KEY_SIZE: usize = 32;

/// Random bytes the caller must supply per seal operation.
///
/// The full XChaCha20 nonce is caller-supplied randomness; the extended
/// 192-bit nonce space makes random nonces safe without per-key counters.
pub const NONCE_RANDOM_SIZE: usize = 24;

/// Domain separation label for per-message key derivation.
const CHUNK_KEY_LABEL: &[u8] = b"veilframe chunk key v1";

/// Errors from sealing or opening chunk bodies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Ciphertext failed authentication: tampered, truncated, or protected
    /// under a different key.
    #[error("chunk authentication failed")]
    AuthenticationFailed,

    /// Encryption failed.
    #[error("chunk encryption failed")]
    EncryptionFailed,
}

/// A protected chunk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    /// AEAD nonce.
    pub nonce: [u8; NONCE_RANDOM_SIZE],
    /// AEAD ciphertext, including the authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Capability object for protecting and unprotecting payload bytes.
///
/// Holds the symmetric key for one message's payload chunks. Cheap to clone;
/// typically owned by the header on the receive side and by the output
/// stream on the send side.
#[derive(Clone)]
pub struct PayloadCryptoContext {
    key: [u8; CHUNK_KEY_SIZE],
}

impl std::fmt::Debug for PayloadCryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log key material.
        f.debug_struct("PayloadCryptoContext").field("key", &"<redacted>").finish()
    }
}

impl PayloadCryptoContext {
    /// A context using the given key directly.
    pub fn new(key: [u8; CHUNK_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Derives a per-message context from a master secret and message id.
    ///
    /// HKDF-SHA256 with a fixed domain-separation label; the message id is
    /// the salt so distinct messages under one master secret never share a
    /// chunk key.
    pub fn derive(master_secret: &[u8], message_id: u64) -> Self {
        let salt = message_id.to_be_bytes();
        let hkdf = Hkdf::<Sha256>::new(Some(&salt), master_secret);

        let mut key = [0u8; CHUNK_KEY_SIZE];
        // Output length is fixed and valid for SHA-256, expand cannot fail.
        if hkdf.expand(CHUNK_KEY_LABEL, &mut key).is_err() {
            unreachable!("HKDF expand with 32-byte output");
        }

        Self { key }
    }

    /// Encrypts and authenticates `plaintext`.
    ///
    /// `nonce_random` must be fresh caller-supplied randomness for every
    /// call.
    pub fn seal(
        &self,
        plaintext: &[u8],
        nonce_random: [u8; NONCE_RANDOM_SIZE],
    ) -> Result<SealedBlob, CryptoError> {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.key));
        let nonce = XNonce::from_slice(&nonce_random);

        let ciphertext =
            cipher.encrypt(nonce, plaintext).map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(SealedBlob { nonce: nonce_random, ciphertext })
    }

    /// Decrypts and verifies a sealed blob.
    pub fn open(&self, blob: &SealedBlob) -> Result<Vec<u8>, CryptoError> {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.key));
        let nonce = XNonce::from_slice(&blob.nonce);

        cipher
            .decrypt(nonce, blob.ciphertext.as_slice())
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}
