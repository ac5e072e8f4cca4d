/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session lifecycle states and the events published on state changes.
//!
//! ```text
//! Disconnected -> Connecting -> ConnectedUnauthenticated -> LoggingOn -> Ready
//!       ^             |                    ^                   |          |
//!       +-------------+ (retry)            +---- failure ------+          |
//!                                          +------- logged off -----------+
//! any state --disconnect--> Disconnected --budget exhausted--> Aborted
//! ```

use std::fmt;

/// Lifecycle state of a session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connect issued, waiting for the result.
    Connecting,
    /// Connected but not logged on.
    ConnectedUnauthenticated,
    /// Log-on issued, waiting for the result.
    LoggingOn,
    /// Logged on; requests may be sent.
    Ready,
    /// Shutting down on request.
    LoggingOff,
    /// A retry budget ran out. Terminal until restarted.
    Aborted,
}

impl SessionState {
    /// Returns true in [`SessionState::Ready`].
    #[inline]
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true in [`SessionState::Aborted`].
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns true while a connection is believed to exist.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(
            self,
            Self::ConnectedUnauthenticated | Self::LoggingOn | Self::Ready
        )
    }

    /// Returns a static name for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::ConnectedUnauthenticated => "connected-unauthenticated",
            Self::LoggingOn => "logging-on",
            Self::Ready => "ready",
            Self::LoggingOff => "logging-off",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session moved to [`SessionState::Aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// More consecutive connection failures than allowed.
    ConnectionExhausted,
    /// More login failures than allowed.
    LoginExhausted,
    /// The credential source had no account to lend.
    CredentialsUnavailable,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectionExhausted => "connection attempts exhausted",
            Self::LoginExhausted => "login attempts exhausted",
            Self::CredentialsUnavailable => "no credentials available",
        })
    }
}

/// Notification published by a controller to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The readiness gate was set.
    Ready,
    /// The readiness gate was cleared by a log-off or disconnect.
    NotReady,
    /// The session gave up.
    Aborted(AbortReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        assert_eq!(SessionState::default(), SessionState::Disconnected);
    }

    #[test]
    fn test_state_predicates() {
        assert!(SessionState::Ready.is_ready());
        assert!(!SessionState::LoggingOn.is_ready());
        assert!(SessionState::Aborted.is_terminal());
        assert!(!SessionState::Disconnected.is_terminal());
        assert!(SessionState::LoggingOn.is_connected());
        assert!(!SessionState::Connecting.is_connected());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            SessionState::ConnectedUnauthenticated.to_string(),
            "connected-unauthenticated"
        );
        assert_eq!(
            AbortReason::LoginExhausted.to_string(),
            "login attempts exhausted"
        );
    }
}
