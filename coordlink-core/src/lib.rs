/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # coordlink Core
//!
//! Core types, messages, and error definitions shared by every coordlink crate.
//!
//! This crate provides:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Identifiers**: `CorrelationId`, `TypeCode`, `AppId`
//! - **Session data**: `ResultCode`, `ReturnReason`, `Credential`, `PersonaState`
//! - **Messages**: inbound/outbound envelopes and the `CoordinatorMessage` trait

pub mod error;
pub mod message;
pub mod types;

pub use error::{CodecError, LinkError, RequestError, Result, SessionError, TransportError};
pub use message::{
    BodyReader, BodyWriter, CoordinatorMessage, Destination, InboundMessage, OutboundMessage,
};
pub use types::{
    AppId, CorrelationId, CorrelationIdAllocator, Credential, PersonaState, ResultCode,
    ReturnReason, TypeCode,
};
