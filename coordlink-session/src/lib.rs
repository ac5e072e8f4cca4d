/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # coordlink Session
//!
//! Connection and login lifecycle for the coordlink coordinator bridge.
//!
//! This crate provides:
//! - **Session controller**: connect, log on, detect disconnects, retry, abort
//! - **Dispatch loop**: single-threaded transport polling with handler fan-out
//! - **Readiness gate**: blocking wait until the session can send requests
//! - **Credential source**: borrow and return accounts with a disposition
//! - **Configuration**: retry budgets, poll interval, presence

pub mod config;
pub mod controller;
pub mod credentials;
pub mod dispatch;
pub mod readiness;
pub mod retry;
pub mod state;

pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use controller::SessionController;
pub use credentials::{CredentialSource, StaticCredentials};
pub use dispatch::{Dispatcher, EventHandler};
pub use readiness::ReadinessGate;
pub use retry::{RetryBudget, RetryOutcome};
pub use state::{AbortReason, SessionEvent, SessionState};
