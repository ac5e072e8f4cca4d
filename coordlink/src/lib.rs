/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # Coordlink
//!
//! Synchronous request/reply and a self-healing session over a
//! callback-driven coordinator transport.
//!
//! A [`SessionController`](session::SessionController) drives the transport
//! through connect and log-on, retrying within fixed budgets and returning
//! rejected credentials to their source. A [`MessageBridge`](engine::MessageBridge)
//! on the same dispatcher turns the asynchronous message stream into blocking
//! calls matched by correlation id, and fans unsolicited messages out to
//! registered handlers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coordlink::prelude::*;
//!
//! let controller = SessionController::new(transport, credentials, ControllerConfig::new())?;
//! let bridge = MessageBridge::new(controller.dispatcher(), kinds, BridgeConfig::new(AppId::new(570)))?;
//!
//! controller.start()?;
//! controller.wait_ready();
//! bridge.enter_session();
//!
//! let details: MatchDetailsResponse = bridge.send_request(|req: &mut MatchDetailsRequest| {
//!     req.match_id = 834391254;
//! })?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Core types, message envelopes, and error definitions
//! - [`transport`]: Transport contract and the in-memory transport
//! - [`session`]: Connection and login lifecycle
//! - [`engine`]: Correlated request/reply bridge

pub mod core {
    //! Core types, message envelopes, and error definitions.
    pub use coordlink_core::*;
}

pub mod transport {
    //! Transport contract and the in-memory transport.
    pub use coordlink_transport::*;
}

pub mod session {
    //! Connection and login lifecycle.
    pub use coordlink_session::*;
}

pub mod engine {
    //! Correlated request/reply bridge.
    pub use coordlink_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use coordlink_core::{
        AppId, BodyReader, BodyWriter, CodecError, CoordinatorMessage, CorrelationId, Credential,
        Destination, InboundMessage, LinkError, OutboundMessage, PersonaState, RequestError,
        Result, ResultCode, ReturnReason, SessionError, TransportError, TypeCode,
    };

    // Transport
    pub use coordlink_transport::{MemoryTransport, Transport, TransportCall, TransportEvent};

    // Session
    pub use coordlink_session::{
        AbortReason, ControllerConfig, CredentialSource, SessionController, SessionEvent,
        SessionState, StaticCredentials,
    };

    // Engine
    pub use coordlink_engine::{BridgeConfig, KindRegistry, MessageBridge};
}
