/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Message bridge configuration.

use coordlink_core::error::SessionError;
use coordlink_core::types::AppId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wait for a reply after each send attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default number of send attempts per request.
pub const DEFAULT_MAX_SEND_ATTEMPTS: u32 = 3;

/// Configuration for a message bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Application whose coordinator receives requests.
    pub app_id: AppId,
    /// Wait for a reply after each send attempt.
    pub request_timeout: Duration,
    /// Send attempts per request and per session entry.
    pub max_send_attempts: u32,
}

impl BridgeConfig {
    /// Creates a configuration for `app_id` with default timings.
    #[must_use]
    pub const fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_send_attempts: DEFAULT_MAX_SEND_ATTEMPTS,
        }
    }

    /// Sets the per-attempt reply timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the number of send attempts.
    #[must_use]
    pub const fn with_max_send_attempts(mut self, attempts: u32) -> Self {
        self.max_send_attempts = attempts;
        self
    }

    /// Returns the longest a request can block, saturating at `Duration::MAX`.
    #[must_use]
    pub fn worst_case_wait(&self) -> Duration {
        self.request_timeout
            .checked_mul(self.max_send_attempts)
            .unwrap_or(Duration::MAX)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if no send attempt is allowed.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.max_send_attempts == 0 {
            return Err(SessionError::Configuration(
                "max_send_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(AppId::default())
    }
}
