/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session controller.
//!
//! Owns the connect, log-on and recovery lifecycle. A dedicated driver thread
//! polls the transport through a [`Dispatcher`]; the controller's own
//! [`EventHandler`] runs there and is the only code that mutates the session
//! state, the credential lease and the retry counters. The credential source
//! is called with the lifecycle lock released, so a slow pool does not block
//! readers such as [`SessionController::state`].
//!
//! Exhausting a retry budget moves the session to [`SessionState::Aborted`],
//! stops the driver loop and publishes [`SessionEvent::Aborted`]. Nothing is
//! returned to callers blocked in [`SessionController::wait_ready`].

use crate::config::ControllerConfig;
use crate::credentials::CredentialSource;
use crate::dispatch::{Dispatcher, EventHandler};
use crate::readiness::ReadinessGate;
use crate::retry::{RetryBudget, RetryOutcome};
use crate::state::{AbortReason, SessionEvent, SessionState};
use coordlink_core::error::SessionError;
use coordlink_core::types::{Credential, PersonaState, ResultCode, ReturnReason};
use coordlink_transport::{Transport, TransportEvent};
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// State owned by the dispatch thread.
#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    lease: Option<Credential>,
    connection: RetryBudget,
    login: RetryBudget,
    abort_reason: Option<AbortReason>,
}

impl Lifecycle {
    fn new(config: &ControllerConfig) -> Self {
        Self {
            state: SessionState::Disconnected,
            lease: None,
            connection: RetryBudget::new(config.max_connection_attempts),
            login: RetryBudget::new(config.max_login_attempts),
            abort_reason: None,
        }
    }
}

type LifecycleGuard<'a> = MutexGuard<'a, Lifecycle>;

struct ControllerCore {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialSource>,
    config: ControllerConfig,
    lifecycle: Mutex<Lifecycle>,
    gate: ReadinessGate,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

impl ControllerCore {
    fn state(&self) -> SessionState {
        self.lifecycle.lock().state
    }

    fn publish(&self, event: SessionEvent) {
        self.subscribers.lock().retain(|tx| tx.send(event).is_ok());
    }

    fn clear_ready(&self) {
        if self.gate.reset() {
            self.publish(SessionEvent::NotReady);
        }
    }

    /// Prepares for a fresh run after `start()`.
    fn rearm(&self) {
        let mut lc = self.lifecycle.lock();
        let lease = lc.lease.take();
        *lc = Lifecycle::new(&self.config);
        lc.lease = lease;
    }

    /// First step of a driver run.
    fn begin(&self) {
        let mut lc = self.lifecycle.lock();
        lc.state = SessionState::Connecting;
        info!("connecting");
        self.transport.connect();
    }

    /// Last step of a driver run.
    fn finish(&self) {
        let mut lc = self.lifecycle.lock();
        if lc.state.is_terminal() {
            self.transport.disconnect();
            return;
        }
        lc.state = SessionState::LoggingOff;
        self.clear_ready();
        self.transport.disconnect();
        lc.state = SessionState::Disconnected;
        info!("session stopped");
    }

    fn on_connected(&self, lc: &mut LifecycleGuard<'_>) {
        debug!("connected");
        lc.state = SessionState::ConnectedUnauthenticated;
        self.attempt_login(lc);
    }

    fn on_connection_lost(&self, lc: &mut LifecycleGuard<'_>) {
        self.clear_ready();
        lc.state = SessionState::Disconnected;

        match lc.connection.record() {
            RetryOutcome::Exhausted => self.abort(lc, AbortReason::ConnectionExhausted),
            RetryOutcome::Retry(attempt) => {
                warn!(
                    attempt,
                    max = lc.connection.max(),
                    "connection lost, reconnecting"
                );
                lc.state = SessionState::Connecting;
                self.transport.connect();
            }
        }
    }

    fn attempt_login(&self, lc: &mut LifecycleGuard<'_>) {
        if lc.lease.is_none() {
            let leased = MutexGuard::unlocked(lc, || self.credentials.get_account());
            match leased {
                Some(credential) => lc.lease = Some(credential),
                None => {
                    self.abort(lc, AbortReason::CredentialsUnavailable);
                    return;
                }
            }
        }

        let Some(credential) = lc.lease.as_ref() else {
            return;
        };
        debug!(username = credential.username(), "logging on");
        match self.transport.log_on(credential) {
            Ok(()) => lc.state = SessionState::LoggingOn,
            Err(err) => {
                // The disconnect that usually follows drives recovery.
                warn!(error = %err, "log-on could not be issued");
                lc.state = SessionState::ConnectedUnauthenticated;
            }
        }
    }

    fn on_logged_on(&self, lc: &mut LifecycleGuard<'_>) {
        lc.state = SessionState::Ready;
        if self.gate.set() {
            info!("session ready");
            self.publish(SessionEvent::Ready);
        }
    }

    fn on_login_failed(&self, lc: &mut LifecycleGuard<'_>, result: ResultCode) {
        let reason = ReturnReason::classify(result);
        warn!(%result, ?reason, "log-on failed");

        if let Some(credential) = lc.lease.take() {
            MutexGuard::unlocked(lc, || self.credentials.return_account(credential, reason));
        }
        lc.state = SessionState::ConnectedUnauthenticated;

        match lc.login.record() {
            RetryOutcome::Exhausted => self.abort(lc, AbortReason::LoginExhausted),
            RetryOutcome::Retry(_) => self.attempt_login(lc),
        }
    }

    fn on_logged_off(&self, lc: &mut LifecycleGuard<'_>, result: ResultCode) {
        info!(%result, "logged off, logging on again");
        self.clear_ready();
        lc.state = SessionState::ConnectedUnauthenticated;
        self.attempt_login(lc);
    }

    fn on_account_info(&self) {
        if !self.config.show_as_online {
            return;
        }
        if let Err(err) = self.transport.set_persona_state(PersonaState::Online) {
            warn!(error = %err, "failed to announce presence");
        }
    }

    fn abort(&self, lc: &mut LifecycleGuard<'_>, reason: AbortReason) {
        error!(%reason, "session aborted");
        lc.state = SessionState::Aborted;
        lc.abort_reason = Some(reason);
        self.clear_ready();
        self.publish(SessionEvent::Aborted(reason));
    }

    fn release_lease(&self) {
        let lease = self.lifecycle.lock().lease.take();
        if let Some(credential) = lease {
            self.credentials.return_account(credential, ReturnReason::None);
        }
    }
}

impl EventHandler for ControllerCore {
    fn on_event(&self, event: &TransportEvent) {
        let mut lc = self.lifecycle.lock();
        if matches!(lc.state, SessionState::Aborted | SessionState::LoggingOff) {
            return;
        }

        match event {
            TransportEvent::Connected(result) if result.is_ok() => self.on_connected(&mut lc),
            TransportEvent::Connected(result) => {
                warn!(%result, "connect failed");
                self.on_connection_lost(&mut lc);
            }
            // Echo of the disconnect issued when the previous run finished.
            TransportEvent::Disconnected {
                user_initiated: true,
            } if !lc.state.is_connected() => {
                debug!(state = %lc.state, "ignoring disconnect from a previous run");
            }
            TransportEvent::Disconnected { user_initiated } => {
                debug!(user_initiated, "disconnected");
                self.on_connection_lost(&mut lc);
            }
            TransportEvent::LoggedOn(result) if result.is_ok() => self.on_logged_on(&mut lc),
            TransportEvent::LoggedOn(result) => self.on_login_failed(&mut lc, *result),
            TransportEvent::LoggedOff(result) => self.on_logged_off(&mut lc, *result),
            TransportEvent::AccountInfo => self.on_account_info(),
            TransportEvent::Message(_) | TransportEvent::PlayingSessionState { .. } => {}
        }
    }
}

struct Driver {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Drives the connect and log-on lifecycle on a background thread.
pub struct SessionController {
    core: Arc<ControllerCore>,
    dispatcher: Dispatcher,
    driver: Mutex<Option<Driver>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("ready", &self.is_ready())
            .field("running", &self.is_running())
            .finish()
    }
}

impl SessionController {
    /// Creates a stopped controller.
    ///
    /// The controller registers itself as the first handler of its
    /// dispatcher; other components attach through [`dispatcher`](Self::dispatcher).
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if `config` is invalid.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialSource>,
        config: ControllerConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let core = Arc::new(ControllerCore {
            transport: Arc::clone(&transport),
            credentials,
            lifecycle: Mutex::new(Lifecycle::new(&config)),
            config,
            gate: ReadinessGate::new(),
            subscribers: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(transport);
        dispatcher.register(core.clone());

        Ok(Self {
            core,
            dispatcher,
            driver: Mutex::new(None),
        })
    }

    /// Returns the dispatcher driven by this controller.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.core.config
    }

    /// Spawns the driver thread, which connects and then polls the transport.
    ///
    /// Does nothing if a driver is already running or has aborted without
    /// being stopped. Starting after [`stop`](Self::stop) begins a fresh
    /// lifecycle with zeroed retry counters.
    ///
    /// # Errors
    /// Returns `SessionError::Spawn` if the thread cannot be created.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut driver = self.driver.lock();
        if driver.is_some() {
            return Ok(());
        }

        self.core.rearm();
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = {
            let core = Arc::clone(&self.core);
            let dispatcher = self.dispatcher.clone();
            let cancel = Arc::clone(&cancel);
            thread::Builder::new()
                .name("coordlink-driver".to_string())
                .spawn(move || run(&core, &dispatcher, &cancel))
                .map_err(|err| SessionError::Spawn(err.to_string()))?
        };

        *driver = Some(Driver { cancel, handle });
        Ok(())
    }

    /// Signals the driver to stop, waits for it and disconnects the transport.
    ///
    /// Takes effect within one poll interval. Callers blocked in
    /// [`wait_ready`](Self::wait_ready) are not woken. Does nothing if the
    /// driver is not running.
    ///
    /// # Errors
    /// Returns `SessionError::DriverPanicked` if the driver thread panicked.
    pub fn stop(&self) -> Result<(), SessionError> {
        let Some(driver) = self.driver.lock().take() else {
            return Ok(());
        };
        driver.cancel.store(true, Ordering::SeqCst);
        driver
            .handle
            .join()
            .map_err(|_| SessionError::DriverPanicked)
    }

    /// Returns whether a driver thread has been started and not stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.driver.lock().is_some()
    }

    /// Blocks until the session is ready.
    ///
    /// There is no timeout: if the session never becomes ready, for example
    /// because it aborted, this never returns. Use
    /// [`wait_ready_timeout`](Self::wait_ready_timeout) or
    /// [`subscribe`](Self::subscribe) to bound the wait.
    pub fn wait_ready(&self) {
        self.core.gate.wait();
    }

    /// Blocks until the session is ready or `timeout` elapses.
    ///
    /// Returns whether the session became ready.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        self.core.gate.wait_timeout(timeout)
    }

    /// Returns whether the readiness gate is set.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.core.gate.is_set()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.core.state()
    }

    /// Returns why the session aborted, if it did.
    #[must_use]
    pub fn abort_reason(&self) -> Option<AbortReason> {
        self.core.lifecycle.lock().abort_reason
    }

    /// Returns the connection failures counted so far.
    #[must_use]
    pub fn connection_attempts(&self) -> u32 {
        self.core.lifecycle.lock().connection.attempts()
    }

    /// Returns the login failures counted so far.
    #[must_use]
    pub fn login_attempts(&self) -> u32 {
        self.core.lifecycle.lock().login.attempts()
    }

    /// Returns a channel receiving every later [`SessionEvent`].
    #[must_use]
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.core.subscribers.lock().push(tx);
        rx
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "driver did not stop cleanly");
        }
        self.core.release_lease();
    }
}

fn run(core: &ControllerCore, dispatcher: &Dispatcher, cancel: &AtomicBool) {
    core.begin();
    while !cancel.load(Ordering::SeqCst) && !core.state().is_terminal() {
        dispatcher.run_once(core.config.poll_interval);
    }
    core.finish();
}
