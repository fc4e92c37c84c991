//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the framing engine from system entropy.
//! Chunk nonces come from here, so a seeded test environment makes every
//! emitted envelope byte-for-byte reproducible, while the production
//! implementation draws from the OS entropy pool.

/// Abstract source of randomness for the framing engine.
///
/// # Safety
///
/// Production implementations MUST use cryptographically secure entropy;
/// chunk nonces derived from weak randomness break AEAD security.
/// Deterministic implementations belong in tests only.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Production environment backed by OS entropy.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// A new system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        // OS entropy exhaustion is not a recoverable condition for a
        // crypto nonce source.
        #[allow(clippy::expect_used)]
        getrandom::fill(buffer).expect("OS entropy source unavailable");
    }
}
