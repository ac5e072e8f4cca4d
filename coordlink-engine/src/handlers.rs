/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Unsolicited message handlers and their fan-out.
//!
//! Handlers run off the dispatch thread. Each invocation is scheduled on its
//! own and never awaited, so handlers for the same message may run in any
//! order and concurrently with later dispatch.

use coordlink_core::message::InboundMessage;
use coordlink_core::types::TypeCode;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Handle;
use tracing::warn;

/// A handler for inbound messages of one type code.
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Runs handler jobs without waiting for them.
#[derive(Debug, Clone)]
pub enum Spawner {
    /// Blocking pool of a tokio runtime.
    Tokio(Handle),
    /// A fresh OS thread per job.
    Thread,
}

impl Spawner {
    /// Uses the current tokio runtime if there is one, threads otherwise.
    #[must_use]
    pub fn current() -> Self {
        Handle::try_current().map_or(Self::Thread, Self::Tokio)
    }

    /// Schedules `job`.
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Tokio(handle) => {
                drop(handle.spawn_blocking(job));
            }
            Self::Thread => {
                if let Err(err) = thread::Builder::new()
                    .name("coordlink-handler".to_string())
                    .spawn(job)
                {
                    warn!(error = %err, "failed to spawn message handler");
                }
            }
        }
    }
}

/// Handlers registered per type code.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<TypeCode, Vec<MessageHandler>>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("type_codes", &self.handlers.read().len())
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for `code`.
    pub fn add(&self, code: TypeCode, handler: MessageHandler) {
        self.handlers.write().entry(code).or_default().push(handler);
    }

    /// Returns a snapshot of the handlers for `code`.
    #[must_use]
    pub fn handlers_for(&self, code: TypeCode) -> Vec<MessageHandler> {
        self.handlers
            .read()
            .get(&code)
            .map(|handlers| handlers.to_vec())
            .unwrap_or_default()
    }

    /// Schedules every handler for `message` on `spawner`.
    ///
    /// Returns the number of handlers scheduled.
    pub fn dispatch(&self, message: &InboundMessage, spawner: &Spawner) -> usize {
        let handlers = self.handlers_for(message.type_code);
        for handler in &handlers {
            let handler = Arc::clone(handler);
            let message = message.clone();
            spawner.spawn(move || handler(&message));
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn message(code: u32) -> InboundMessage {
        InboundMessage::unsolicited(TypeCode::new(code), Bytes::new())
    }

    #[test]
    fn test_spawner_outside_runtime_uses_threads() {
        assert!(matches!(Spawner::current(), Spawner::Thread));
    }

    #[test]
    fn test_dispatch_invokes_each_handler_once() {
        let registry = HandlerRegistry::new();
        let (tx, rx) = unbounded();
        for tag in ["a", "b"] {
            let tx = tx.clone();
            registry.add(
                TypeCode::new(7),
                Arc::new(move |_msg: &InboundMessage| {
                    let _ = tx.send(tag);
                }),
            );
        }

        assert_eq!(registry.dispatch(&message(7), &Spawner::Thread), 2);

        let mut seen = vec![
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
        ];
        seen.sort_unstable();
        assert_eq!(seen, vec!["a", "b"]);
        assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
    }

    #[test]
    fn test_dispatch_ignores_other_codes() {
        let registry = HandlerRegistry::new();
        registry.add(TypeCode::new(1), Arc::new(|_msg: &InboundMessage| {}));
        assert_eq!(registry.dispatch(&message(2), &Spawner::Thread), 0);
        assert_eq!(registry.handlers_for(TypeCode::new(1)).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_tokio_spawner_runs_job() {
        let spawner = Spawner::current();
        assert!(matches!(spawner, Spawner::Tokio(_)));

        let (tx, rx) = tokio::sync::oneshot::channel();
        spawner.spawn(move || {
            let _ = tx.send(42);
        });
        assert_eq!(rx.await.unwrap(), 42);
    }
}
