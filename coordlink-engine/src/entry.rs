/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Entering the application context.
//!
//! Before the coordinator answers, the account declares the application
//! active. The service confirms with a playing-session notification naming
//! the application and saying whether another session elsewhere blocks it.

use bytes::Bytes;
use coordlink_core::error::CodecError;
use coordlink_core::message::{BodyReader, BodyWriter, CoordinatorMessage};
use coordlink_core::types::{AppId, TypeCode};
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

/// Type code of the declare-active client message.
pub const DECLARE_ACTIVE: TypeCode = TypeCode::new(742);

/// Operating system code reported when declaring an application active.
pub const CLIENT_OS_TYPE: u32 = 14;

/// Declares an application active for the logged-on account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclareActive {
    /// Reported client operating system.
    pub client_os_type: u32,
    /// Application being declared.
    pub app_id: u32,
    /// Reported local process id.
    pub process_id: u32,
}

impl DeclareActive {
    /// Creates a declaration for `app_id`.
    #[must_use]
    pub fn new(app_id: AppId, process_id: u32) -> Self {
        Self {
            client_os_type: CLIENT_OS_TYPE,
            app_id: app_id.value(),
            process_id,
        }
    }
}

impl CoordinatorMessage for DeclareActive {
    const KIND: &'static str = "DeclareActive";

    fn encode(&self) -> Bytes {
        let mut w = BodyWriter::new();
        w.put_u32(self.client_os_type)
            .put_u32(self.app_id)
            .put_u32(self.process_id);
        w.finish()
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = BodyReader::new(bytes);
        Ok(Self {
            client_os_type: r.u32()?,
            app_id: r.u32()?,
            process_id: r.u32()?,
        })
    }
}

/// Tracks whether the configured application is active.
///
/// Confirmations are an auto-reset signal: each one releases at most one
/// waiting attempt.
#[derive(Debug)]
pub(crate) struct SessionEntry {
    app_id: AppId,
    active: Mutex<bool>,
    confirmed_tx: Sender<()>,
    confirmed_rx: Receiver<()>,
    /// Serializes entry attempts.
    entering: Mutex<()>,
}

impl SessionEntry {
    pub(crate) fn new(app_id: AppId) -> Self {
        let (confirmed_tx, confirmed_rx) = bounded(1);
        Self {
            app_id,
            active: Mutex::new(false),
            confirmed_tx,
            confirmed_rx,
            entering: Mutex::new(()),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        *self.active.lock()
    }

    pub(crate) fn set_active(&self, active: bool) {
        *self.active.lock() = active;
    }

    /// Applies a playing-session notification.
    pub(crate) fn on_state(&self, playing_blocked: bool, app_id: AppId) {
        if playing_blocked || app_id != self.app_id {
            self.set_active(false);
            return;
        }
        let _ = self.confirmed_tx.try_send(());
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.entering.lock()
    }

    /// Drops a confirmation that arrived while nobody was entering.
    pub(crate) fn clear_stale(&self) {
        while self.confirmed_rx.try_recv().is_ok() {}
    }

    pub(crate) fn confirmations(&self) -> &Receiver<()> {
        &self.confirmed_rx
    }
}
