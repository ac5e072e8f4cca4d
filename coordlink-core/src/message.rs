/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Message envelopes and the typed message trait.
//!
//! This module provides:
//! - [`InboundMessage`]: a message delivered by the transport
//! - [`OutboundMessage`]: a message handed to the transport
//! - [`Destination`]: where an outbound message is routed
//! - [`CoordinatorMessage`]: trait implemented by typed message bodies
//! - [`BodyWriter`] / [`BodyReader`]: little-endian helpers for body layouts

use crate::error::CodecError;
use crate::types::{AppId, CorrelationId, TypeCode};
use bytes::{BufMut, Bytes, BytesMut};

/// Routing target of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The coordinator serving the given application.
    Coordinator(AppId),
    /// The client-level service itself (session entry, presence).
    Client,
}

/// A message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Type code of the body.
    pub type_code: TypeCode,
    /// Correlation id echoed back by the peer, or [`CorrelationId::NONE`].
    pub correlation_id: CorrelationId,
    /// Encoded body.
    pub payload: Bytes,
}

impl InboundMessage {
    /// Creates an inbound message.
    #[must_use]
    pub fn new(type_code: TypeCode, correlation_id: CorrelationId, payload: Bytes) -> Self {
        Self {
            type_code,
            correlation_id,
            payload,
        }
    }

    /// Creates an inbound message that answers no request.
    #[must_use]
    pub fn unsolicited(type_code: TypeCode, payload: Bytes) -> Self {
        Self::new(type_code, CorrelationId::NONE, payload)
    }

    /// Decodes the body as `M`.
    ///
    /// # Errors
    /// Returns `CodecError` if the body is not a valid `M`.
    pub fn decode<M: CoordinatorMessage>(&self) -> Result<M, CodecError> {
        M::decode(&self.payload)
    }
}

/// A message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Routing target.
    pub destination: Destination,
    /// Type code of the body.
    pub type_code: TypeCode,
    /// Correlation id the reply should echo, or [`CorrelationId::NONE`].
    pub correlation_id: CorrelationId,
    /// Encoded body.
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Creates an outbound message with no correlation id.
    #[must_use]
    pub fn new(destination: Destination, type_code: TypeCode, payload: Bytes) -> Self {
        Self {
            destination,
            type_code,
            correlation_id: CorrelationId::NONE,
            payload,
        }
    }

    /// Sets the correlation id.
    #[must_use]
    pub const fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = id;
        self
    }
}

/// A typed message body exchanged with the coordinator.
///
/// The wire layout belongs to the protocol schema; implementors only need to
/// round-trip their own fields. [`KIND`](Self::KIND) names the message so a
/// registry can map it to a [`TypeCode`].
pub trait CoordinatorMessage: Default + Send + Sized + 'static {
    /// Stable name of this message kind.
    const KIND: &'static str;

    /// Encodes the body.
    fn encode(&self) -> Bytes;

    /// Decodes a body.
    ///
    /// # Errors
    /// Returns `CodecError` if `bytes` is not a valid body.
    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;
}

const MAX_STR_LEN: usize = u32::MAX as usize;

/// Longest prefix of `value` that is at most `max` bytes and ends on a
/// character boundary.
fn fit_prefix(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Builds a body from little-endian fields.
#[derive(Debug, Default)]
pub struct BodyWriter {
    buf: BytesMut,
}

impl BodyWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `u32`.
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    /// Appends a `u64`.
    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    /// Appends a `bool` as one byte.
    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.buf.put_u8(u8::from(value));
        self
    }

    /// Appends a length-prefixed UTF-8 string.
    ///
    /// The prefix is a `u32`; a longer string is cut at the last character
    /// boundary that fits, so the prefix always matches the bytes written.
    /// Use [`try_put_str`](Self::try_put_str) to reject such strings instead.
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        let value = fit_prefix(value, MAX_STR_LEN);
        self.put_prefixed(value)
    }

    /// Appends a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns `CodecError::InvalidField` if the string is longer than the
    /// `u32` length prefix can describe.
    pub fn try_put_str(&mut self, value: &str) -> Result<&mut Self, CodecError> {
        if value.len() > MAX_STR_LEN {
            return Err(CodecError::InvalidField {
                field: "string",
                reason: format!("{} bytes exceed the u32 length prefix", value.len()),
            });
        }
        Ok(self.put_prefixed(value))
    }

    fn put_prefixed(&mut self, value: &str) -> &mut Self {
        let len = u32::try_from(value.len()).unwrap_or(u32::MAX);
        self.buf.put_u32_le(len);
        self.buf.put_slice(value.as_bytes());
        self
    }

    /// Finishes the body.
    #[must_use]
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reads little-endian fields from a body.
#[derive(Debug)]
pub struct BodyReader<'a> {
    buf: &'a [u8],
}

impl<'a> BodyReader<'a> {
    /// Creates a reader over `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() < len {
            return Err(CodecError::Truncated {
                needed: len,
                available: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Reads a `u32`.
    ///
    /// # Errors
    /// Returns `CodecError::Truncated` if fewer than 4 bytes remain.
    pub fn u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a `u64`.
    ///
    /// # Errors
    /// Returns `CodecError::Truncated` if fewer than 8 bytes remain.
    pub fn u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Reads a one-byte `bool`.
    ///
    /// # Errors
    /// Returns `CodecError` if no byte remains or the byte is not 0 or 1.
    pub fn bool(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidField {
                field,
                reason: format!("expected 0 or 1, found {other}"),
            }),
        }
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns `CodecError` if the body is truncated or not UTF-8.
    pub fn string(&mut self) -> Result<String, CodecError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Ping {
        seq: u64,
        note: String,
    }

    impl CoordinatorMessage for Ping {
        const KIND: &'static str = "Ping";

        fn encode(&self) -> Bytes {
            let mut w = BodyWriter::new();
            w.put_u64(self.seq).put_str(&self.note);
            w.finish()
        }

        fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
            let mut r = BodyReader::new(bytes);
            Ok(Self {
                seq: r.u64()?,
                note: r.string()?,
            })
        }
    }

    #[test]
    fn test_inbound_decode() {
        let body = Ping {
            seq: 9,
            note: "hi".into(),
        }
        .encode();
        let msg = InboundMessage::new(TypeCode::new(1), CorrelationId::new(4), body);
        let ping: Ping = msg.decode().unwrap();
        assert_eq!(ping.seq, 9);
        assert_eq!(ping.note, "hi");
    }

    #[test]
    fn test_reader_truncated() {
        let mut r = BodyReader::new(&[1, 2, 3]);
        assert_eq!(
            r.u32(),
            Err(CodecError::Truncated {
                needed: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_reader_rejects_bad_bool() {
        let mut r = BodyReader::new(&[2]);
        assert!(matches!(
            r.bool("blocked"),
            Err(CodecError::InvalidField {
                field: "blocked",
                ..
            })
        ));
    }

    #[test]
    fn test_fit_prefix_respects_char_boundary() {
        assert_eq!(fit_prefix("radiant", 16), "radiant");
        assert_eq!(fit_prefix("radiant", 3), "rad");
        // 'é' is two bytes; cutting inside it backs off to the boundary.
        assert_eq!(fit_prefix("dé", 2), "d");
    }

    #[test]
    fn test_prefix_matches_written_bytes() {
        let mut w = BodyWriter::new();
        w.try_put_str("dire").unwrap().put_str("");
        let body = w.finish();
        let mut r = BodyReader::new(&body);
        assert_eq!(r.string().unwrap(), "dire");
        assert_eq!(r.string().unwrap(), "");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_unsolicited_has_no_correlation() {
        let msg = InboundMessage::unsolicited(TypeCode::new(3), Bytes::new());
        assert!(!msg.correlation_id.is_some());
    }

    #[test]
    fn test_outbound_with_correlation_id() {
        let msg = OutboundMessage::new(
            Destination::Coordinator(AppId::new(570)),
            TypeCode::new(7095),
            Bytes::new(),
        )
        .with_correlation_id(CorrelationId::new(11));
        assert_eq!(msg.correlation_id, CorrelationId::new(11));
        assert_eq!(msg.destination, Destination::Coordinator(AppId::new(570)));
    }
}
