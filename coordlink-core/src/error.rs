/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Error types for the coordlink coordinator bridge.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across transport, session and request operations.

use crate::types::{CorrelationId, TypeCode};
use thiserror::Error;

/// Result type alias using [`LinkError`] as the error type.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Top-level error type for all coordlink operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Error reported by the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error in session lifecycle operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error while issuing a correlated request.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Error while encoding or decoding a message body.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error from the surrounding application.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a transport implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has no live connection.
    #[error("not connected")]
    NotConnected,

    /// The transport refused to accept an outbound message.
    #[error("send rejected for type code {type_code}: {reason}")]
    SendRejected {
        /// Type code of the rejected message.
        type_code: TypeCode,
        /// Why the message was rejected.
        reason: String,
    },

    /// The transport has been shut down.
    #[error("transport closed")]
    Closed,
}

/// Errors in session lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The driver thread could not be spawned.
    #[error("failed to spawn driver thread: {0}")]
    Spawn(String),

    /// The driver thread panicked.
    #[error("driver thread panicked")]
    DriverPanicked,

    /// Invalid controller configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors returned to the caller of a correlated request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The reply carried a type code other than the expected response type.
    #[error(
        "protocol mismatch for correlation id {correlation_id}: expected type {expected}, received {received}"
    )]
    ProtocolMismatch {
        /// Correlation id of the request.
        correlation_id: CorrelationId,
        /// Expected response type code.
        expected: TypeCode,
        /// Type code actually received.
        received: TypeCode,
    },

    /// Every send attempt timed out without a matching reply.
    #[error("request {correlation_id} timed out after {attempts} attempts")]
    TimedOut {
        /// Correlation id of the request.
        correlation_id: CorrelationId,
        /// Number of send attempts made.
        attempts: u32,
    },

    /// A live request already uses the correlation id.
    #[error("correlation id {0} is already in use")]
    CorrelationInUse(CorrelationId),

    /// No type code is registered for the message kind.
    #[error("no type code registered for message kind {0}")]
    UnknownKind(&'static str),

    /// The reply body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// The request could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors that occur while encoding or decoding a message body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The body ended before a complete value was read.
    #[error("truncated body: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes needed to complete the value.
        needed: usize,
        /// Bytes remaining in the body.
        available: usize,
    },

    /// A field held a value the message type does not allow.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in a string field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
