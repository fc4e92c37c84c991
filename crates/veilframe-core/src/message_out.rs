//! Outbound message framing.
//!
//! [`MessageOutputStream`] turns an arbitrary sequence of application byte
//! writes into one well-formed wire message: a header followed by zero or
//! more protected payload chunks. It owns the chunk boundary rules:
//!
//! - writes only accumulate; a chunk is committed by an explicit `flush`,
//!   by `close`, or by switching the compression algorithm
//! - sequence numbers are assigned at commit time, contiguous from 1
//! - exactly one chunk (the last) carries the end-of-message flag; `close`
//!   coalesces any pending bytes into that terminal chunk
//! - error and handshake messages are header-only and never emit chunks
//!
//! The stream is a single-writer object: `&mut self` receivers make
//! overlapping operations unrepresentable. Every operation is bounded by a
//! caller-supplied deadline and reports [`Outcome::TimedOut`] when it
//! elapses; a timed-out stream is not corrupted but its logical position is
//! unspecified, so callers should inspect before reusing it.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use veilframe_crypto::{NONCE_RANDOM_SIZE, PayloadCryptoContext};
use veilframe_proto::{
    CompressionAlgorithm, Header, MessageCapabilities, PayloadChunk, encode_object,
};

use crate::chunk::seal_chunk;
use crate::env::Environment;
use crate::error::StreamError;
use crate::outcome::{Outcome, bounded};

/// Outbound framing engine for one wire message.
///
/// Created once per outbound message; the header is written to the
/// destination during construction. `close` is idempotent and must be
/// called to terminate a payload-bearing message.
pub struct MessageOutputStream<W, E> {
    /// Destination sink for wire bytes.
    destination: W,

    /// Entropy source for chunk nonces.
    env: E,

    /// The message header, written once at construction.
    header: Header,

    /// Crypto capability for payload chunks. `None` only on streams that
    /// can never emit payload.
    crypto: Option<PayloadCryptoContext>,

    /// Derived once at construction: error and handshake messages forbid
    /// payload.
    payload_capable: bool,

    /// Intersection of local and header-advertised capabilities.
    negotiated: MessageCapabilities,

    /// Bytes written but not yet committed to a chunk.
    buffer: BytesMut,

    /// Compression setting for the pending chunk.
    current_algorithm: Option<CompressionAlgorithm>,

    /// Whether a compression setting has been established (explicitly or by
    /// the lazy default on first write) for the pending chunk. While false
    /// the pending chunk is "virgin" and an explicit setting never forces a
    /// boundary.
    algorithm_established: bool,

    /// Sequence number the next committed chunk will carry.
    next_sequence_number: u64,

    /// Committed chunks in emission order; `None` once caching is disabled.
    cache: Option<Vec<PayloadChunk>>,

    /// Set by the first successful `close`.
    closed: bool,
}

impl<W: AsyncWrite + Unpin, E: Environment> MessageOutputStream<W, E> {
    /// Creates a stream and writes the header to `destination`.
    ///
    /// Payload eligibility is derived here, once: error headers and
    /// handshake messages are header-only. A payload-eligible header must
    /// come with a crypto context.
    ///
    /// # Errors
    ///
    /// Fails on header encoding or destination I/O failure, or with
    /// [`StreamError::MissingCryptoContext`] when a payload-eligible header
    /// has no crypto context.
    pub async fn new(
        mut destination: W,
        env: E,
        header: Header,
        crypto: Option<PayloadCryptoContext>,
        local_capabilities: &MessageCapabilities,
        deadline: Duration,
    ) -> Result<Outcome<Self>, StreamError> {
        let message_id = header.message_id();
        let payload_capable = !header.is_error() && !header.is_handshake();

        if payload_capable && crypto.is_none() {
            return Err(StreamError::MissingCryptoContext { message_id });
        }

        let negotiated = local_capabilities
            .intersect(&MessageCapabilities { compression_algorithms: header.compression_algorithms() });

        let mut encoded = Vec::new();
        encode_object(&header, &mut encoded)?;

        let written = bounded(deadline, async {
            destination.write_all(&encoded).await.map_err(StreamError::from)
        })
        .await?;

        if written.is_timed_out() {
            return Ok(Outcome::TimedOut);
        }

        tracing::debug!(message_id, payload_capable, "message header written");

        Ok(Outcome::Completed(Self {
            destination,
            env,
            header,
            crypto,
            payload_capable,
            negotiated,
            buffer: BytesMut::new(),
            current_algorithm: None,
            algorithm_established: false,
            next_sequence_number: 1,
            cache: Some(Vec::new()),
            closed: false,
        }))
    }

    /// The header this stream was created with.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Message id of this stream, constant for its lifetime.
    pub fn message_id(&self) -> u64 {
        self.header.message_id()
    }

    /// Whether `close` has completed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Appends bytes to the pending chunk.
    ///
    /// Never commits a chunk by itself; buffering is unbounded and chunk
    /// emission is driven only by `flush`, `close`, or a compression
    /// switch. Callers wanting a sub-range write a slice
    /// (`&data[from..to]`). On the first write of a pending chunk with no
    /// established compression setting, the most preferred algorithm of the
    /// negotiated intersection becomes the default.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after `close`;
    /// [`StreamError::PayloadForbidden`] on error or handshake streams.
    /// Neither mutates state.
    pub async fn write(
        &mut self,
        data: &[u8],
        deadline: Duration,
    ) -> Result<Outcome<()>, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if !self.payload_capable {
            return Err(StreamError::PayloadForbidden { message_id: self.message_id() });
        }

        bounded(deadline, async {
            if !self.algorithm_established {
                self.current_algorithm = self.negotiated.preferred_compression();
                self.algorithm_established = true;
                tracing::trace!(algorithm = ?self.current_algorithm, "compression defaulted");
            }

            self.buffer.extend_from_slice(data);
            tracing::trace!(buffered = self.buffer.len(), "payload bytes buffered");
            Ok(())
        })
        .await
    }

    /// Adopts a compression setting for subsequent writes.
    ///
    /// `None` means "no compression" and is always acceptable; `Some(algo)`
    /// is accepted only when `algo` is inside the negotiated intersection.
    /// Rejection is reported as `Completed(false)` with no state change —
    /// a negotiation-failure signal, not an error.
    ///
    /// Adopting a setting different from the one established for the
    /// pending chunk first commits that chunk (even when empty) under the
    /// old setting. Re-asserting the current setting, or setting one on a
    /// virgin pending chunk, never forces a boundary.
    pub async fn set_compression_algorithm(
        &mut self,
        algorithm: Option<CompressionAlgorithm>,
        deadline: Duration,
    ) -> Result<Outcome<bool>, StreamError> {
        if let Some(algo) = algorithm {
            if !self.negotiated.supports(algo) {
                tracing::debug!(%algo, "compression algorithm rejected");
                return Ok(Outcome::Completed(false));
            }
        }

        bounded(deadline, async {
            let boundary = self.algorithm_established && self.current_algorithm != algorithm;

            if boundary && self.payload_capable && !self.closed {
                tracing::debug!(
                    old = ?self.current_algorithm,
                    new = ?algorithm,
                    "compression switch forces chunk boundary"
                );
                self.commit_chunk(false).await?;
            }

            self.current_algorithm = algorithm;
            self.algorithm_established = true;
            Ok(true)
        })
        .await
    }

    /// Commits the pending buffer (possibly empty) as a non-terminal chunk.
    ///
    /// The compression setting survives for subsequent writes. A no-op
    /// success on payload-ineligible or already-closed streams.
    pub async fn flush(&mut self, deadline: Duration) -> Result<Outcome<()>, StreamError> {
        if self.closed || !self.payload_capable {
            return Ok(Outcome::Completed(()));
        }

        bounded(deadline, async { self.commit_chunk(false).await }).await
    }

    /// Terminates the message.
    ///
    /// The first effective call on a payload-eligible stream commits any
    /// remaining pending bytes as the single terminal chunk
    /// (`end_of_message = true`), even when the buffer is empty, so every
    /// payload-bearing message ends with an explicit terminator.
    /// Payload-ineligible streams emit nothing. Safe to call repeatedly;
    /// later calls succeed without emitting.
    pub async fn close(&mut self, deadline: Duration) -> Result<Outcome<()>, StreamError> {
        if self.closed {
            return Ok(Outcome::Completed(()));
        }

        if !self.payload_capable {
            self.closed = true;
            tracing::debug!(message_id = self.message_id(), "header-only message closed");
            return Ok(Outcome::Completed(()));
        }

        let outcome = bounded(deadline, async { self.commit_chunk(true).await }).await?;

        if outcome.is_completed() {
            self.closed = true;
            tracing::debug!(
                message_id = self.message_id(),
                chunks = self.next_sequence_number - 1,
                "message closed"
            );
        }

        Ok(outcome)
    }

    /// Chunks committed since creation (or since caching stopped), in
    /// emission order. Empty once caching is disabled.
    pub fn payloads(&self) -> &[PayloadChunk] {
        self.cache.as_deref().unwrap_or(&[])
    }

    /// Discards cached chunks and disables caching for the rest of the
    /// stream's life.
    ///
    /// Immediate and retroactive: [`payloads`](Self::payloads) returns an
    /// empty slice from here on, while writes keep being transmitted.
    pub fn stop_caching(&mut self) {
        self.cache = None;
    }

    /// Consumes the stream and returns its destination sink.
    ///
    /// Useful after a failure for inspecting what reached the wire.
    pub fn into_destination(self) -> W {
        self.destination
    }

    /// Builds, protects, transmits, and records one chunk from the pending
    /// buffer.
    ///
    /// A commit is all-or-nothing: the chunk is fully built and written to
    /// the destination before any observable state (sequence counter,
    /// buffer, cache) changes, so a failed commit leaves the buffered state
    /// untouched for the caller to retry or abandon.
    async fn commit_chunk(&mut self, end_of_message: bool) -> Result<(), StreamError> {
        let message_id = self.message_id();
        let crypto = self
            .crypto
            .as_ref()
            .ok_or(StreamError::MissingCryptoContext { message_id })?;

        // Compression is recorded only when actually applied, so the cached
        // chunk equals what a receiver decodes.
        let compression = if self.buffer.is_empty() { None } else { self.current_algorithm };

        let chunk = PayloadChunk {
            sequence_number: self.next_sequence_number,
            message_id,
            end_of_message,
            compression,
            data: Bytes::copy_from_slice(&self.buffer),
        };

        let mut nonce = [0u8; NONCE_RANDOM_SIZE];
        self.env.random_bytes(&mut nonce);

        let envelope = seal_chunk(&chunk, crypto, nonce)?;

        let mut encoded = Vec::new();
        encode_object(&envelope, &mut encoded)?;

        self.destination.write_all(&encoded).await?;

        tracing::debug!(
            message_id,
            sequence_number = chunk.sequence_number,
            end_of_message,
            bytes = chunk.data.len(),
            compression = ?chunk.compression,
            "payload chunk committed"
        );

        self.next_sequence_number += 1;
        self.buffer.clear();
        if let Some(cache) = &mut self.cache {
            cache.push(chunk);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use veilframe_crypto::CHUNK_KEY_SIZE;
    use veilframe_proto::{ErrorCode, ErrorHeader, MessageHeader};

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(250);

    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            // Deterministic for tests
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
        }
    }

    fn crypto() -> PayloadCryptoContext {
        PayloadCryptoContext::new([0x77; CHUNK_KEY_SIZE])
    }

    fn local_caps() -> MessageCapabilities {
        MessageCapabilities::new([CompressionAlgorithm::Gzip, CompressionAlgorithm::Lzw])
    }

    fn message_header(capabilities: Option<MessageCapabilities>) -> Header {
        Header::Message(MessageHeader {
            message_id: 1,
            handshake: false,
            renewable: false,
            capabilities,
        })
    }

    async fn open_stream(
        destination: &mut Vec<u8>,
        header: Header,
    ) -> MessageOutputStream<&mut Vec<u8>, TestEnv> {
        MessageOutputStream::new(
            destination,
            TestEnv,
            header,
            Some(crypto()),
            &local_caps(),
            TIMEOUT,
        )
        .await
        .unwrap()
        .completed()
        .unwrap()
    }

    #[tokio::test]
    async fn first_write_defaults_to_preferred_algorithm() {
        let mut destination = Vec::new();
        let mut stream = open_stream(&mut destination, message_header(Some(local_caps()))).await;

        stream.write(b"data", TIMEOUT).await.unwrap().completed().unwrap();
        stream.close(TIMEOUT).await.unwrap().completed().unwrap();

        assert_eq!(stream.payloads()[0].compression, Some(CompressionAlgorithm::Gzip));
    }

    #[tokio::test]
    async fn no_shared_capabilities_means_uncompressed_default() {
        let mut destination = Vec::new();
        let mut stream = open_stream(&mut destination, message_header(None)).await;

        stream.write(b"data", TIMEOUT).await.unwrap().completed().unwrap();
        stream.close(TIMEOUT).await.unwrap().completed().unwrap();

        assert_eq!(stream.payloads()[0].compression, None);
    }

    #[tokio::test]
    async fn setting_algorithm_on_virgin_chunk_forces_no_boundary() {
        let mut destination = Vec::new();
        let mut stream = open_stream(&mut destination, message_header(Some(local_caps()))).await;

        let accepted =
            stream.set_compression_algorithm(None, TIMEOUT).await.unwrap().completed().unwrap();
        assert!(accepted);

        stream.write(b"data", TIMEOUT).await.unwrap().completed().unwrap();
        stream.close(TIMEOUT).await.unwrap().completed().unwrap();

        // One combined terminal chunk, no boundary chunk from the set call.
        assert_eq!(stream.payloads().len(), 1);
        assert_eq!(stream.payloads()[0].compression, None);
    }

    #[tokio::test]
    async fn rejected_algorithm_leaves_state_unchanged() {
        let mut destination = Vec::new();
        let header = message_header(Some(MessageCapabilities::new([CompressionAlgorithm::Lzw])));
        let mut stream = open_stream(&mut destination, header).await;

        let accepted = stream
            .set_compression_algorithm(Some(CompressionAlgorithm::Gzip), TIMEOUT)
            .await
            .unwrap()
            .completed()
            .unwrap();
        assert!(!accepted);

        // Unset writes still default to the only shared algorithm.
        stream.write(b"data", TIMEOUT).await.unwrap().completed().unwrap();
        stream.close(TIMEOUT).await.unwrap().completed().unwrap();
        assert_eq!(stream.payloads()[0].compression, Some(CompressionAlgorithm::Lzw));
    }

    #[tokio::test]
    async fn write_after_close_is_an_io_error() {
        let mut destination = Vec::new();
        let mut stream = open_stream(&mut destination, message_header(None)).await;

        stream.close(TIMEOUT).await.unwrap().completed().unwrap();

        let result = stream.write(b"late", TIMEOUT).await;
        assert!(matches!(result, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn write_to_error_stream_is_forbidden() {
        let mut destination = Vec::new();
        let header = Header::Error(ErrorHeader {
            message_id: 9,
            code: ErrorCode::Fail,
            message: "errormsg".to_string(),
        });
        let mut stream = MessageOutputStream::new(
            &mut destination,
            TestEnv,
            header,
            None,
            &local_caps(),
            TIMEOUT,
        )
        .await
        .unwrap()
        .completed()
        .unwrap();

        let result = stream.write(b"", TIMEOUT).await;
        assert!(matches!(result, Err(StreamError::PayloadForbidden { message_id: 9 })));
    }

    #[tokio::test]
    async fn eligible_header_requires_crypto_context() {
        let mut destination = Vec::new();
        let result = MessageOutputStream::new(
            &mut destination,
            TestEnv,
            message_header(None),
            None,
            &local_caps(),
            TIMEOUT,
        )
        .await;

        assert!(matches!(result, Err(StreamError::MissingCryptoContext { message_id: 1 })));
    }

    #[tokio::test]
    async fn sequence_numbers_are_contiguous_from_one() {
        let mut destination = Vec::new();
        let mut stream = open_stream(&mut destination, message_header(None)).await;

        for _ in 0..3 {
            stream.write(b"x", TIMEOUT).await.unwrap().completed().unwrap();
            stream.flush(TIMEOUT).await.unwrap().completed().unwrap();
        }
        stream.close(TIMEOUT).await.unwrap().completed().unwrap();

        let sequence: Vec<u64> =
            stream.payloads().iter().map(|chunk| chunk.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3, 4]);
        assert!(stream.payloads().last().unwrap().end_of_message);
    }
}
