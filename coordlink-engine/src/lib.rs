/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # Coordlink Engine
//!
//! Correlated request/reply on top of a coordinator session.
//!
//! This crate provides:
//! - **MessageBridge**: blocking `send_request` matched by correlation id
//! - **Handlers**: fan-out of inbound messages to registered callbacks
//! - **Session entry**: declaring the application active before requests
//! - **KindRegistry**: mapping of message kinds to wire type codes

pub mod bridge;
pub mod config;
pub mod entry;
pub mod handlers;
pub mod kinds;
pub mod pending;

pub use bridge::MessageBridge;
pub use config::BridgeConfig;
pub use entry::{CLIENT_OS_TYPE, DECLARE_ACTIVE, DeclareActive};
pub use handlers::{HandlerRegistry, MessageHandler, Spawner};
pub use kinds::KindRegistry;
pub use pending::PendingRequests;
