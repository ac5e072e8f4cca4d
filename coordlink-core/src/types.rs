/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Core types shared by every coordlink crate.
//!
//! - [`CorrelationId`]: tag matching a request to its eventual reply
//! - [`CorrelationIdAllocator`]: monotonic, lock-free id source
//! - [`TypeCode`] and [`AppId`]: protocol-level identifiers
//! - [`ResultCode`] and [`ReturnReason`]: login outcomes and their classification
//! - [`Credential`] and [`PersonaState`]: account data handled by the session

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlation identifier attached to an outbound request.
///
/// Unique among outstanding requests. Replies echo it back so the waiting
/// caller can be found again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Marker for messages that carry no correlation.
    pub const NONE: Self = Self(u64::MAX);

    /// Creates a correlation id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns true unless this is [`CorrelationId::NONE`].
    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u64::MAX
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out correlation ids.
///
/// Uses a single atomic counter so ids can be allocated from any thread
/// without locking. [`CorrelationId::NONE`] is never returned.
#[derive(Debug)]
pub struct CorrelationIdAllocator {
    next: AtomicU64,
}

impl CorrelationIdAllocator {
    /// Creates an allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an allocator whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocates the next id.
    #[inline]
    pub fn allocate(&self) -> CorrelationId {
        loop {
            let id = self.next.fetch_add(1, Ordering::SeqCst);
            if id != u64::MAX {
                return CorrelationId(id);
            }
        }
    }

    /// Returns the id the next call to [`allocate`](Self::allocate) will hand out.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> CorrelationId {
        CorrelationId(self.next.load(Ordering::SeqCst))
    }
}

impl Default for CorrelationIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-defined message type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct TypeCode(u32);

impl TypeCode {
    /// Creates a type code.
    #[inline]
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for TypeCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the application context the coordinator serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct AppId(u32);

impl AppId {
    /// Creates an application id.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result code reported by the transport for connect and login attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    /// Success.
    Ok,
    /// Generic failure.
    Fail,
    /// No connection to the remote service.
    NoConnection,
    /// Wrong password.
    InvalidPassword,
    /// Unknown account name.
    InvalidName,
    /// Invalid e-mail address on record.
    InvalidEmail,
    /// Account disabled by the service.
    AccountDisabled,
    /// Account locked.
    AccountLocked,
    /// Logon denied, usually pending a guard code.
    AccountLogonDenied,
    /// Account banned.
    Banned,
    /// Remote service temporarily unavailable.
    ServiceUnavailable,
    /// Remote service timed out.
    Timeout,
    /// Any other code, carried verbatim.
    Other(u32),
}

impl ResultCode {
    /// Returns true for [`ResultCode::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Other({code})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// Disposition attached to a credential handed back to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnReason {
    /// Still usable.
    #[default]
    None,
    /// Banned, disabled or locked.
    Banned,
    /// Rejected credentials.
    Invalid,
}

impl ReturnReason {
    /// Classifies a failed login result.
    #[must_use]
    pub const fn classify(result: ResultCode) -> Self {
        match result {
            ResultCode::AccountDisabled
            | ResultCode::AccountLocked
            | ResultCode::AccountLogonDenied
            | ResultCode::Banned => Self::Banned,
            ResultCode::InvalidName | ResultCode::InvalidEmail | ResultCode::InvalidPassword => {
                Self::Invalid
            }
            _ => Self::None,
        }
    }
}

/// Account credential leased from a credential source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Presence state visible to the account's friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PersonaState {
    /// Shown as offline.
    #[default]
    Offline,
    /// Online.
    Online,
    /// Busy.
    Busy,
    /// Away.
    Away,
    /// Snooze.
    Snooze,
    /// Looking to trade.
    LookingToTrade,
    /// Looking to play.
    LookingToPlay,
    /// Online but hidden.
    Invisible,
}
