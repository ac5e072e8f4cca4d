/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Synchronous request/reply bridge.
//!
//! [`MessageBridge`] turns the transport's asynchronous message stream into a
//! blocking call: every request carries a fresh correlation id and the caller
//! waits until a reply echoing that id arrives. The id, not the individual send
//! attempt, is the unit of correlation, so a late reply to an earlier attempt
//! satisfies a later wait.
//!
//! Every inbound message is first offered to the pending request with its
//! correlation id and then, independently, fanned out to the handlers
//! registered for its type code.

use crate::config::BridgeConfig;
use crate::entry::{DECLARE_ACTIVE, DeclareActive, SessionEntry};
use crate::handlers::{HandlerRegistry, Spawner};
use crate::kinds::KindRegistry;
use crate::pending::PendingRequests;
use coordlink_core::error::{RequestError, SessionError};
use coordlink_core::message::{CoordinatorMessage, Destination, InboundMessage, OutboundMessage};
use coordlink_core::types::TypeCode;
use coordlink_session::{Dispatcher, EventHandler};
use coordlink_transport::{Transport, TransportEvent};
use crossbeam_channel::RecvTimeoutError;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct BridgeCore {
    transport: Arc<dyn Transport>,
    kinds: KindRegistry,
    config: BridgeConfig,
    pending: PendingRequests,
    handlers: HandlerRegistry,
    spawner: Spawner,
    entry: SessionEntry,
}

impl EventHandler for BridgeCore {
    fn on_event(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Message(message) => {
                self.pending.resolve(message);
                self.handlers.dispatch(message, &self.spawner);
            }
            TransportEvent::PlayingSessionState {
                playing_blocked,
                app_id,
            } => self.entry.on_state(*playing_blocked, *app_id),
            TransportEvent::Disconnected { .. } | TransportEvent::LoggedOff(_) => {
                self.entry.set_active(false);
            }
            _ => {}
        }
    }
}

/// Blocking request/reply and message subscription over a transport.
///
/// Cloning is cheap; clones share pending requests and handlers.
#[derive(Clone)]
pub struct MessageBridge {
    core: Arc<BridgeCore>,
}

impl std::fmt::Debug for MessageBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBridge")
            .field("app_id", &self.core.config.app_id)
            .field("pending", &self.core.pending.len())
            .field("in_session", &self.core.entry.is_active())
            .finish()
    }
}

impl MessageBridge {
    /// Creates a bridge and attaches it to `dispatcher`.
    ///
    /// Handlers are scheduled on the tokio runtime current at construction,
    /// or on dedicated threads when there is none.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if `config` is invalid.
    pub fn new(
        dispatcher: &Dispatcher,
        kinds: KindRegistry,
        config: BridgeConfig,
    ) -> Result<Self, SessionError> {
        Self::with_spawner(dispatcher, kinds, config, Spawner::current())
    }

    /// Creates a bridge that schedules handlers on `spawner`.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if `config` is invalid.
    pub fn with_spawner(
        dispatcher: &Dispatcher,
        kinds: KindRegistry,
        config: BridgeConfig,
        spawner: Spawner,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let core = Arc::new(BridgeCore {
            transport: Arc::clone(dispatcher.transport()),
            kinds,
            entry: SessionEntry::new(config.app_id),
            config,
            pending: PendingRequests::new(),
            handlers: HandlerRegistry::new(),
            spawner,
        });
        dispatcher.register(core.clone());
        Ok(Self { core })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.core.config
    }

    /// Sends a `Req` and blocks until the matching `Resp` arrives.
    ///
    /// `init` fills in the request body. The request is sent up to
    /// `max_send_attempts` times, each followed by a wait of up to
    /// `request_timeout`; every attempt reuses the same correlation id.
    ///
    /// # Errors
    /// - `RequestError::UnknownKind` if `Req` or `Resp` has no type code
    /// - `RequestError::ProtocolMismatch` if the reply has another type code
    /// - `RequestError::TimedOut` if no attempt got a reply
    /// - `RequestError::Decode` if the reply body is not a valid `Resp`
    /// - `RequestError::Transport` if the transport refused the request
    pub fn send_request<Req, Resp, F>(&self, init: F) -> Result<Resp, RequestError>
    where
        Req: CoordinatorMessage,
        Resp: CoordinatorMessage,
        F: FnOnce(&mut Req),
    {
        let core = &self.core;
        let request_code = core.kinds.type_code_of::<Req>()?;
        let expected = core.kinds.type_code_of::<Resp>()?;

        let mut body = Req::default();
        init(&mut body);

        let id = core.transport.next_job_id();
        let message = OutboundMessage::new(
            Destination::Coordinator(core.config.app_id),
            request_code,
            body.encode(),
        )
        .with_correlation_id(id);
        let reply = core.pending.register(id, expected)?;

        let attempts = core.config.max_send_attempts;
        for attempt in 1..=attempts {
            if let Err(err) = core.transport.send(message.clone()) {
                core.pending.remove(id);
                return Err(err.into());
            }
            match reply.recv_timeout(core.config.request_timeout) {
                Ok(response) => return decode_reply(response, expected),
                Err(RecvTimeoutError::Timeout) => {
                    debug!(correlation_id = %id, attempt, attempts, "request timed out");
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if !core.pending.remove(id) {
            // Resolved between the last timeout and the removal.
            if let Ok(response) = reply.try_recv() {
                return decode_reply(response, expected);
            }
        }
        warn!(correlation_id = %id, attempts, kind = Req::KIND, "request abandoned");
        Err(RequestError::TimedOut {
            correlation_id: id,
            attempts,
        })
    }

    /// Declares the configured application active and waits for confirmation.
    ///
    /// Returns true immediately, without sending, if already active. Otherwise
    /// sends up to `max_send_attempts` declarations, each followed by a wait of
    /// up to `request_timeout`, and returns whether one was confirmed.
    pub fn enter_session(&self) -> bool {
        let core = &self.core;
        let _entering = core.entry.lock();
        if core.entry.is_active() {
            return true;
        }
        core.entry.clear_stale();

        let process_id = rand::thread_rng().gen_range(0..10_000);
        let body = DeclareActive::new(core.config.app_id, process_id).encode();
        let message = OutboundMessage::new(Destination::Client, DECLARE_ACTIVE, body)
            .with_correlation_id(core.transport.next_job_id());

        for attempt in 1..=core.config.max_send_attempts {
            if let Err(err) = core.transport.send(message.clone()) {
                warn!(error = %err, attempt, "declare-active not sent");
            }
            if core
                .entry
                .confirmations()
                .recv_timeout(core.config.request_timeout)
                .is_ok()
            {
                info!(app_id = %core.config.app_id, "entered application session");
                core.entry.set_active(true);
                return true;
            }
        }

        warn!(app_id = %core.config.app_id, "application session not confirmed");
        core.entry.set_active(false);
        false
    }

    /// Returns whether the configured application is active.
    #[must_use]
    pub fn in_session(&self) -> bool {
        self.core.entry.is_active()
    }

    /// Subscribes `callback` to every inbound `Msg`.
    ///
    /// The callback runs off the dispatch thread, once per message, whether or
    /// not the message also answered a pending request. Bodies that fail to
    /// decode are logged and skipped.
    ///
    /// # Errors
    /// Returns `RequestError::UnknownKind` if `Msg` has no type code.
    pub fn register_handler<Msg, F>(&self, callback: F) -> Result<(), RequestError>
    where
        Msg: CoordinatorMessage,
        F: Fn(Msg) + Send + Sync + 'static,
    {
        let code = self.core.kinds.type_code_of::<Msg>()?;
        self.core.handlers.add(
            code,
            Arc::new(move |message: &InboundMessage| match message.decode::<Msg>() {
                Ok(body) => callback(body),
                Err(err) => warn!(error = %err, kind = Msg::KIND, "dropping undecodable message"),
            }),
        );
        Ok(())
    }

    /// Returns the number of requests awaiting a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.core.pending.len()
    }
}

fn decode_reply<Resp: CoordinatorMessage>(
    response: InboundMessage,
    expected: TypeCode,
) -> Result<Resp, RequestError> {
    if response.type_code != expected {
        warn!(
            correlation_id = %response.correlation_id,
            %expected,
            received = %response.type_code,
            "reply type mismatch"
        );
        return Err(RequestError::ProtocolMismatch {
            correlation_id: response.correlation_id,
            expected,
            received: response.type_code,
        });
    }
    Ok(response.decode()?)
}
