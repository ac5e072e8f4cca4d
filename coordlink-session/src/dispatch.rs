/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Dispatch loop plumbing.
//!
//! A [`Dispatcher`] drains the transport's event queue and hands every event
//! to each registered [`EventHandler`], inline, on the thread that drives it.
//! Handlers run in registration order.

use coordlink_transport::{Transport, TransportEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Receives transport events on the dispatch thread.
pub trait EventHandler: Send + Sync {
    /// Handles one event. Must not block for long.
    fn on_event(&self, event: &TransportEvent);
}

/// Polls a transport and fans events out to handlers.
///
/// Cloning is cheap; clones share the transport and the handler list.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.read().len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over `transport` with no handlers.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Adds a handler. It sees every event dispatched from now on.
    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().push(handler);
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Waits up to `timeout` for one event and dispatches it.
    ///
    /// Returns whether an event was dispatched.
    pub fn run_once(&self, timeout: Duration) -> bool {
        let Some(event) = self.transport.poll_event(timeout) else {
            return false;
        };
        self.dispatch(&event);
        true
    }

    /// Hands `event` to every handler.
    pub fn dispatch(&self, event: &TransportEvent) {
        // Snapshot so a handler may register another without deadlocking.
        let handlers: Vec<_> = self.handlers.read().iter().cloned().collect();
        for handler in handlers {
            handler.on_event(event);
        }
    }

    /// Returns the transport being polled.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordlink_core::types::ResultCode;
    use coordlink_transport::MemoryTransport;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<TransportEvent>>,
    }

    impl EventHandler for Recorder {
        fn on_event(&self, event: &TransportEvent) {
            self.seen.lock().push(event.clone());
        }
    }

    #[test]
    fn test_run_once_without_events() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryTransport::new()));
        assert!(!dispatcher.run_once(Duration::from_millis(1)));
    }

    #[test]
    fn test_every_handler_sees_event() {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Dispatcher::new(transport.clone());
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        dispatcher.register(a.clone());
        dispatcher.register(b.clone());

        transport.inject(TransportEvent::Connected(ResultCode::Ok));
        assert!(dispatcher.run_once(Duration::from_millis(10)));

        assert_eq!(
            *a.seen.lock(),
            vec![TransportEvent::Connected(ResultCode::Ok)]
        );
        assert_eq!(*b.seen.lock(), *a.seen.lock());
        assert_eq!(dispatcher.handler_count(), 2);
    }
}
