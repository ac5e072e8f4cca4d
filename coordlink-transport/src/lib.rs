/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # coordlink Transport
//!
//! Transport contract consumed by the coordlink session and bridge.
//!
//! This crate provides:
//! - **Transport trait**: connect, log-on, send and event polling
//! - **Events**: the lifecycle and message events a transport emits
//! - **MemoryTransport**: channel-backed transport with a scriptable peer

pub mod memory;
pub mod traits;

pub use memory::{MemoryTransport, TransportCall};
pub use traits::{Transport, TransportEvent};
