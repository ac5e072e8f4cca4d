/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Credential source contract.
//!
//! The controller never owns accounts. It borrows one from a
//! [`CredentialSource`] and hands it back with a [`ReturnReason`] once it is
//! done with it.

use coordlink_core::types::{Credential, ReturnReason};
use parking_lot::Mutex;

/// Supplies credentials and takes them back.
pub trait CredentialSource: Send + Sync {
    /// Lends an account, or `None` if the pool is empty.
    fn get_account(&self) -> Option<Credential>;

    /// Takes back a lent account.
    ///
    /// # Arguments
    /// * `credential` - The account being returned
    /// * `reason` - Whether the account is still usable
    fn return_account(&self, credential: Credential, reason: ReturnReason);
}

/// A source that lends the same account every time and records returns.
///
/// Accounts returned as [`ReturnReason::Banned`] or [`ReturnReason::Invalid`]
/// are not lent again.
#[derive(Debug)]
pub struct StaticCredentials {
    credential: Credential,
    returns: Mutex<Vec<ReturnReason>>,
}

impl StaticCredentials {
    /// Creates a source lending `credential`.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            returns: Mutex::new(Vec::new()),
        }
    }

    /// Returns the reasons of every return so far.
    #[must_use]
    pub fn returns(&self) -> Vec<ReturnReason> {
        self.returns.lock().clone()
    }
}

impl CredentialSource for StaticCredentials {
    fn get_account(&self) -> Option<Credential> {
        let retired = self
            .returns
            .lock()
            .iter()
            .any(|reason| *reason != ReturnReason::None);
        (!retired).then(|| self.credential.clone())
    }

    fn return_account(&self, _credential: Credential, reason: ReturnReason) {
        self.returns.lock().push(reason);
    }
}
