//! Test harness for the Veilframe framing engine.
//!
//! Deterministic environment, fault-injecting destination sinks, and wire
//! decoding helpers shared by the integration tests. The helpers decode a
//! destination buffer the way a receiver would: one header object, then
//! every chunk envelope opened against the payload crypto context.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::io::AsyncWrite;
use veilframe_core::{ChunkError, Environment, open_chunk};
use veilframe_crypto::PayloadCryptoContext;
use veilframe_proto::{ChunkEnvelope, Header, PayloadChunk, ProtoError, WireReader};

/// Deterministic environment for reproducible envelopes.
///
/// Each draw seeds a ChaCha8 stream with a per-call counter, so successive
/// nonces differ but runs are identical.
#[derive(Clone, Default)]
pub struct TestEnv {
    counter: Arc<AtomicU64>,
}

impl Environment for TestEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        let draw = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut rng = ChaCha8Rng::seed_from_u64(draw);
        rng.fill_bytes(buffer);
    }
}

/// Seeded random test data, reproducible across runs.
pub fn random_data(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// Errors from decoding a captured destination buffer.
#[derive(Debug)]
pub enum ReadMessageError {
    /// The byte stream did not parse as wire objects.
    Wire(ProtoError),
    /// A chunk envelope failed to open.
    Chunk(ChunkError),
    /// The stream contained no header object.
    MissingHeader,
    /// A chunk envelope was found but no crypto context was supplied.
    MissingCryptoContext,
}

impl From<ProtoError> for ReadMessageError {
    fn from(err: ProtoError) -> Self {
        Self::Wire(err)
    }
}

impl From<ChunkError> for ReadMessageError {
    fn from(err: ChunkError) -> Self {
        Self::Chunk(err)
    }
}

/// Decodes one complete wire message from a captured destination buffer.
///
/// Returns the header and every payload chunk in wire order. `crypto` may
/// be `None` only for messages expected to carry no chunks; a chunk
/// envelope without a context is reported as [`ReadMessageError::Chunk`].
pub fn read_message(
    bytes: &[u8],
    crypto: Option<&PayloadCryptoContext>,
) -> Result<(Header, Vec<PayloadChunk>), ReadMessageError> {
    let mut reader = WireReader::new(bytes);

    let header: Header = reader.next()?.ok_or(ReadMessageError::MissingHeader)?;

    let mut chunks = Vec::new();
    while reader.more() {
        let envelope: ChunkEnvelope = reader.next()?.ok_or(ReadMessageError::MissingHeader)?;
        let context = crypto.ok_or(ReadMessageError::MissingCryptoContext)?;
        chunks.push(open_chunk(&envelope, context)?);
    }

    Ok((header, chunks))
}

/// A destination that is never ready, for timeout injection.
///
/// Every `poll_write` returns `Pending` without registering a wakeup
/// beyond the surrounding timer, so any deadline-bounded write against it
/// elapses.
#[derive(Debug, Default)]
pub struct StallSink;

impl AsyncWrite for StallSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Pending
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Pending
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Pending
    }
}

/// A destination that fails every write with a broken-pipe error.
#[derive(Debug, Default)]
pub struct FailSink;

impl AsyncWrite for FailSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "injected failure")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A destination that accepts the first `budget` writes into an inner
/// buffer, then fails.
///
/// Used to let header serialization succeed while a later chunk commit
/// fails.
#[derive(Debug)]
pub struct BudgetSink {
    /// Bytes accepted so far.
    pub written: Vec<u8>,
    /// Remaining successful `poll_write` calls.
    pub budget: usize,
}

impl BudgetSink {
    /// A sink accepting `budget` writes before failing.
    pub fn new(budget: usize) -> Self {
        Self { written: Vec::new(), budget }
    }
}

impl AsyncWrite for BudgetSink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        if self.budget == 0 {
            return Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "write budget exhausted",
            )));
        }
        self.budget -= 1;
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
