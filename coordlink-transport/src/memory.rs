/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! In-memory transport implementation.
//!
//! [`MemoryTransport`] keeps its event queue in a channel and records every
//! call made on it. An optional responder plays the remote side: it sees each
//! call and returns the events the peer would produce. Suitable for tests and
//! demos; nothing leaves the process.

use crate::traits::{Transport, TransportEvent};
use coordlink_core::error::TransportError;
use coordlink_core::message::OutboundMessage;
use coordlink_core::types::{
    CorrelationId, CorrelationIdAllocator, Credential, PersonaState, ResultCode,
};
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::trace;

/// A call made on a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `connect()`.
    Connect,
    /// `disconnect()`.
    Disconnect,
    /// `log_on(credential)`.
    LogOn(Credential),
    /// `set_persona_state(state)`.
    SetPersonaState(PersonaState),
    /// `send(message)`.
    Send(OutboundMessage),
}

type Responder = Box<dyn Fn(&TransportCall) -> Vec<TransportEvent> + Send + Sync>;

/// In-memory transport.
pub struct MemoryTransport {
    /// Producer side of the event queue.
    events_tx: Sender<TransportEvent>,
    /// Consumer side of the event queue.
    events_rx: Receiver<TransportEvent>,
    /// Every call made, in order.
    calls: Mutex<Vec<TransportCall>>,
    /// Scripted remote peer.
    responder: RwLock<Option<Responder>>,
    /// Job id source.
    job_ids: CorrelationIdAllocator,
    /// Set by [`close`](Self::close).
    closed: AtomicBool,
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("queued", &self.events_rx.len())
            .field("calls", &self.calls.lock().len())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl MemoryTransport {
    /// Creates a transport with no responder. Nothing happens unless events
    /// are injected.
    #[must_use]
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            events_tx,
            events_rx,
            calls: Mutex::new(Vec::new()),
            responder: RwLock::new(None),
            job_ids: CorrelationIdAllocator::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a transport whose peer accepts every connect and log-on and
    /// follows a successful log-on with account info.
    #[must_use]
    pub fn accepting() -> Self {
        Self::new().with_responder(|call| match call {
            TransportCall::Connect => vec![TransportEvent::Connected(ResultCode::Ok)],
            TransportCall::LogOn(_) => vec![
                TransportEvent::LoggedOn(ResultCode::Ok),
                TransportEvent::AccountInfo,
            ],
            _ => Vec::new(),
        })
    }

    /// Sets the responder.
    #[must_use]
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&TransportCall) -> Vec<TransportEvent> + Send + Sync + 'static,
    {
        self.set_responder(responder);
        self
    }

    /// Replaces the responder.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&TransportCall) -> Vec<TransportEvent> + Send + Sync + 'static,
    {
        *self.responder.write() = Some(Box::new(responder));
    }

    /// Queues an event as if the peer had produced it.
    pub fn inject(&self, event: TransportEvent) {
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.events_tx.send(event);
    }

    /// Returns a snapshot of every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Returns every message passed to `send`.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Send(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// Counts calls matching `pred`.
    #[must_use]
    pub fn count_calls(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    /// Returns the number of queued events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events_rx.len()
    }

    /// Makes every later `send`, `log_on` and `set_persona_state` fail with
    /// [`TransportError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: TransportCall) {
        trace!(?call, "memory transport call");
        self.calls.lock().push(call.clone());
        let events = match self.responder.read().as_ref() {
            Some(responder) => responder(&call),
            None => Vec::new(),
        };
        for event in events {
            self.inject(event);
        }
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn connect(&self) {
        self.record(TransportCall::Connect);
    }

    fn disconnect(&self) {
        self.record(TransportCall::Disconnect);
    }

    fn log_on(&self, credential: &Credential) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.record(TransportCall::LogOn(credential.clone()));
        Ok(())
    }

    fn set_persona_state(&self, state: PersonaState) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.record(TransportCall::SetPersonaState(state));
        Ok(())
    }

    fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.record(TransportCall::Send(message));
        Ok(())
    }

    fn next_job_id(&self) -> CorrelationId {
        self.job_ids.allocate()
    }

    fn poll_event(&self, timeout: Duration) -> Option<TransportEvent> {
        self.events_rx.recv_timeout(timeout).ok()
    }
}
