/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Pending request table.
//!
//! Each outstanding request owns a single-slot channel. The dispatch thread
//! resolves a request by removing its entry and pushing the reply into the
//! slot; the waiting caller receives from the other end with a timeout.
//! Removal happens under the table lock, so a reply and a final timeout can
//! never both claim the same entry.

use coordlink_core::error::RequestError;
use coordlink_core::message::InboundMessage;
use coordlink_core::types::{CorrelationId, TypeCode};
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

/// An in-flight request awaiting its reply.
#[derive(Debug)]
struct PendingRequest {
    /// Type code the caller expects back.
    expected: TypeCode,
    /// Single-resolution result slot.
    slot: Sender<InboundMessage>,
}

/// Thread-safe table of pending requests keyed by correlation id.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: Mutex<HashMap<CorrelationId, PendingRequest>>,
}

impl PendingRequests {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request and returns the receiving end of its slot.
    ///
    /// # Errors
    /// Returns `RequestError::CorrelationInUse` if `id` is still pending.
    pub fn register(
        &self,
        id: CorrelationId,
        expected: TypeCode,
    ) -> Result<Receiver<InboundMessage>, RequestError> {
        let mut entries = self.entries.lock();
        match entries.entry(id) {
            Entry::Occupied(_) => Err(RequestError::CorrelationInUse(id)),
            Entry::Vacant(vacant) => {
                let (slot, reply) = bounded(1);
                vacant.insert(PendingRequest { expected, slot });
                Ok(reply)
            }
        }
    }

    /// Resolves the request `message` answers, if any.
    ///
    /// Returns whether a pending request was resolved.
    pub fn resolve(&self, message: &InboundMessage) -> bool {
        if !message.correlation_id.is_some() {
            return false;
        }
        let Some(pending) = self.entries.lock().remove(&message.correlation_id) else {
            return false;
        };
        trace!(
            correlation_id = %message.correlation_id,
            expected = %pending.expected,
            received = %message.type_code,
            "resolving pending request"
        );
        // The caller may have stopped waiting; a dropped receiver is fine.
        let _ = pending.slot.try_send(message.clone());
        true
    }

    /// Removes a request without resolving it.
    ///
    /// Returns false if the request had already been resolved or removed.
    pub fn remove(&self, id: CorrelationId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    /// Returns whether `id` is pending.
    #[must_use]
    pub fn contains(&self, id: CorrelationId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Returns the number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn reply(id: u64, code: u32) -> InboundMessage {
        InboundMessage::new(
            TypeCode::new(code),
            CorrelationId::new(id),
            Bytes::from_static(b"x"),
        )
    }

    #[test]
    fn test_resolve_matches_only_its_id() {
        let pending = PendingRequests::new();
        let first = pending
            .register(CorrelationId::new(1), TypeCode::new(10))
            .unwrap();
        let second = pending
            .register(CorrelationId::new(2), TypeCode::new(10))
            .unwrap();

        assert!(pending.resolve(&reply(2, 10)));
        assert!(first.try_recv().is_err());
        assert_eq!(second.try_recv().unwrap().correlation_id, CorrelationId::new(2));
        assert!(pending.contains(CorrelationId::new(1)));
        assert!(!pending.contains(CorrelationId::new(2)));
    }

    #[test]
    fn test_resolve_is_single_shot() {
        let pending = PendingRequests::new();
        let rx = pending
            .register(CorrelationId::new(5), TypeCode::new(1))
            .unwrap();

        assert!(pending.resolve(&reply(5, 1)));
        assert!(!pending.resolve(&reply(5, 1)));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let pending = PendingRequests::new();
        let _rx = pending
            .register(CorrelationId::new(3), TypeCode::new(1))
            .unwrap();
        assert_eq!(
            pending
                .register(CorrelationId::new(3), TypeCode::new(1))
                .unwrap_err(),
            RequestError::CorrelationInUse(CorrelationId::new(3))
        );
    }

    #[test]
    fn test_uncorrelated_message_ignored() {
        let pending = PendingRequests::new();
        let msg = InboundMessage::unsolicited(TypeCode::new(1), Bytes::new());
        assert!(!pending.resolve(&msg));
    }

    #[test]
    fn test_remove_after_resolve() {
        let pending = PendingRequests::new();
        let _rx = pending
            .register(CorrelationId::new(8), TypeCode::new(1))
            .unwrap();
        pending.resolve(&reply(8, 1));
        assert!(!pending.remove(CorrelationId::new(8)));
        assert_eq!(pending.len(), 0);
    }
}
