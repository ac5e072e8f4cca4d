/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session controller configuration.

use coordlink_core::error::SessionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of login retries before aborting.
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Default number of reconnects before aborting.
pub const DEFAULT_MAX_CONNECTION_ATTEMPTS: u32 = 3;

/// Default time the driver waits for each event.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Login failures tolerated before the session aborts.
    pub max_login_attempts: u32,
    /// Connection failures tolerated before the session aborts.
    pub max_connection_attempts: u32,
    /// How long each driver poll waits for an event. Also bounds how long
    /// `stop()` takes to be noticed.
    pub poll_interval: Duration,
    /// Announce the account as online once account info arrives.
    pub show_as_online: bool,
}

impl ControllerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            max_connection_attempts: DEFAULT_MAX_CONNECTION_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            show_as_online: false,
        }
    }

    /// Sets the login retry budget.
    #[must_use]
    pub const fn with_max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    /// Sets the connection retry budget.
    #[must_use]
    pub const fn with_max_connection_attempts(mut self, attempts: u32) -> Self {
        self.max_connection_attempts = attempts;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets whether to announce the account as online.
    #[must_use]
    pub const fn with_show_as_online(mut self, show: bool) -> Self {
        self.show_as_online = show;
        self
    }

    /// Checks the configuration for values the driver cannot run with.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if the poll interval is zero.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.poll_interval.is_zero() {
            return Err(SessionError::Configuration(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for controller configuration.
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    max_login_attempts: Option<u32>,
    max_connection_attempts: Option<u32>,
    poll_interval: Option<Duration>,
    show_as_online: bool,
}

impl ControllerConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the login retry budget.
    #[must_use]
    pub const fn max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = Some(attempts);
        self
    }

    /// Sets the connection retry budget.
    #[must_use]
    pub const fn max_connection_attempts(mut self, attempts: u32) -> Self {
        self.max_connection_attempts = Some(attempts);
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets whether to announce the account as online.
    #[must_use]
    pub const fn show_as_online(mut self, show: bool) -> Self {
        self.show_as_online = show;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if validation fails.
    pub fn build(self) -> Result<ControllerConfig, SessionError> {
        let mut config = ControllerConfig::new().with_show_as_online(self.show_as_online);

        if let Some(attempts) = self.max_login_attempts {
            config.max_login_attempts = attempts;
        }
        if let Some(attempts) = self.max_connection_attempts {
            config.max_connection_attempts = attempts;
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_config_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.max_login_attempts, 3);
        assert_eq!(config.max_connection_attempts, 3);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(!config.show_as_online);
    }

    #[test]
    fn test_controller_config_builder() {
        let config = ControllerConfigBuilder::new()
            .max_login_attempts(5)
            .max_connection_attempts(1)
            .poll_interval(Duration::from_millis(10))
            .show_as_online(true)
            .build()
            .unwrap();

        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.max_connection_attempts, 1);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert!(config.show_as_online);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = ControllerConfigBuilder::new()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }
}
