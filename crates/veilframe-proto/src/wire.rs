//! Sequential CBOR object framing.
//!
//! The wire carries a flat sequence of self-delimiting CBOR objects with no
//! outer length prefix. [`encode_object`] appends one object to an output
//! buffer; [`WireReader`] walks a received byte stream object-by-object.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ProtoError;

/// Appends one CBOR object to `out`.
pub fn encode_object<T: Serialize>(value: &T, out: &mut Vec<u8>) -> Result<(), ProtoError> {
    ciborium::ser::into_writer(value, out)?;
    Ok(())
}

/// Reads consecutive CBOR objects from a byte slice.
///
/// CBOR is self-delimiting, so each [`next`](Self::next) call consumes
/// exactly one object and leaves the cursor at the start of the following
/// one.
#[derive(Debug)]
pub struct WireReader<'a> {
    remaining: &'a [u8],
}

impl<'a> WireReader<'a> {
    /// A reader over the given bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { remaining: bytes }
    }

    /// Whether another object follows.
    pub fn more(&self) -> bool {
        !self.remaining.is_empty()
    }

    /// Decodes the next object.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn next<T: DeserializeOwned>(&mut self) -> Result<Option<T>, ProtoError> {
        if self.remaining.is_empty() {
            return Ok(None);
        }
        let value = ciborium::de::from_reader(&mut self.remaining)?;
        Ok(Some(value))
    }
}
