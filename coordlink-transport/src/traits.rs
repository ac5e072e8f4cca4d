/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Transport trait definition.
//!
//! The transport owns the connection, its handshake and encryption. coordlink
//! only tells it what to do and drains the events it produces.

use coordlink_core::error::TransportError;
use coordlink_core::message::{InboundMessage, OutboundMessage};
use coordlink_core::types::{
    AppId, CorrelationId, CorrelationIdAllocator, Credential, PersonaState, ResultCode,
};
use std::time::Duration;

/// Job ids handed out by transports that do not allocate their own.
static JOB_IDS: CorrelationIdAllocator = CorrelationIdAllocator::new();

/// Lifecycle and message events emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connect attempt finished.
    Connected(ResultCode),
    /// The connection dropped or was closed.
    Disconnected {
        /// Whether the disconnect was requested locally.
        user_initiated: bool,
    },
    /// A log-on attempt finished.
    LoggedOn(ResultCode),
    /// The account was logged off by the remote side.
    LoggedOff(ResultCode),
    /// Account information arrived after log-on.
    AccountInfo,
    /// A coordinator message arrived.
    Message(InboundMessage),
    /// The remote side reported which application the account is active in.
    PlayingSessionState {
        /// Whether another session elsewhere blocks this one.
        playing_blocked: bool,
        /// Application currently declared active.
        app_id: AppId,
    },
}

/// Abstract interface for the callback-driven transport.
///
/// Implementations queue events internally; [`poll_event`](Self::poll_event)
/// is called continuously by a single driver thread.
pub trait Transport: Send + Sync {
    /// Starts connecting. The outcome arrives as [`TransportEvent::Connected`].
    fn connect(&self);

    /// Closes the connection.
    fn disconnect(&self);

    /// Starts a log-on with `credential`. The outcome arrives as
    /// [`TransportEvent::LoggedOn`].
    ///
    /// # Errors
    /// Returns `TransportError` if the request could not be issued.
    fn log_on(&self, credential: &Credential) -> Result<(), TransportError>;

    /// Sets the account's visible presence.
    ///
    /// # Errors
    /// Returns `TransportError` if the request could not be issued.
    fn set_persona_state(&self, state: PersonaState) -> Result<(), TransportError>;

    /// Sends a message.
    ///
    /// # Errors
    /// Returns `TransportError` if the message was not accepted.
    fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;

    /// Allocates a job id to use as a correlation id.
    ///
    /// Defaults to a process-wide counter shared by every transport that
    /// does not override it.
    fn next_job_id(&self) -> CorrelationId {
        JOB_IDS.allocate()
    }

    /// Waits up to `timeout` for the next queued event.
    fn poll_event(&self, timeout: Duration) -> Option<TransportEvent>;
}
