//! Lifecycle tests for the session controller against the in-memory transport.

use coordlink_core::types::{Credential, PersonaState, ResultCode, ReturnReason};
use coordlink_session::{
    AbortReason, ControllerConfig, CredentialSource, SessionController, SessionEvent,
    SessionState, StaticCredentials,
};
use coordlink_transport::{MemoryTransport, TransportCall, TransportEvent};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
enum PoolOp {
    Get(String),
    Return(String, ReturnReason),
}

/// Hands out `user0`, `user1`, ... and logs every operation.
#[derive(Default)]
struct PoolCredentials {
    next: Mutex<u32>,
    ops: Mutex<Vec<PoolOp>>,
    exhausted: bool,
}

impl PoolCredentials {
    fn empty() -> Self {
        Self {
            exhausted: true,
            ..Self::default()
        }
    }

    fn ops(&self) -> Vec<PoolOp> {
        self.ops.lock().clone()
    }
}

impl CredentialSource for PoolCredentials {
    fn get_account(&self) -> Option<Credential> {
        if self.exhausted {
            return None;
        }
        let mut next = self.next.lock();
        let name = format!("user{}", *next);
        *next += 1;
        self.ops.lock().push(PoolOp::Get(name.clone()));
        Some(Credential::new(name, "secret"))
    }

    fn return_account(&self, credential: Credential, reason: ReturnReason) {
        self.ops
            .lock()
            .push(PoolOp::Return(credential.username().to_string(), reason));
    }
}

fn config() -> ControllerConfig {
    ControllerConfig::new().with_poll_interval(Duration::from_millis(5))
}

fn next_event(events: &Receiver<SessionEvent>) -> SessionEvent {
    events.recv_timeout(WAIT).expect("session event")
}

fn count(transport: &MemoryTransport, pred: impl Fn(&TransportCall) -> bool) -> usize {
    transport.count_calls(pred)
}

#[test]
fn test_connect_and_login_sets_ready_once() {
    let transport = Arc::new(MemoryTransport::accepting());
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(transport.clone(), credentials, config()).unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    controller.wait_ready();

    assert_eq!(next_event(&events), SessionEvent::Ready);
    assert_eq!(controller.state(), SessionState::Ready);
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::LogOn(_))), 1);

    thread::sleep(Duration::from_millis(30));
    assert!(events.try_recv().is_err(), "ready published more than once");
    controller.stop().unwrap();
}

#[test]
fn test_disconnects_retry_then_abort() {
    let transport = Arc::new(MemoryTransport::new().with_responder(|call| match call {
        TransportCall::Connect => vec![TransportEvent::Disconnected {
            user_initiated: false,
        }],
        _ => Vec::new(),
    }));
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(
        transport.clone(),
        credentials,
        config().with_max_connection_attempts(3),
    )
    .unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(
        next_event(&events),
        SessionEvent::Aborted(AbortReason::ConnectionExhausted)
    );

    // Initial connect plus one reconnect per tolerated disconnect.
    thread::sleep(Duration::from_millis(30));
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::Connect)), 4);
    assert_eq!(controller.state(), SessionState::Aborted);
    assert_eq!(
        controller.abort_reason(),
        Some(AbortReason::ConnectionExhausted)
    );
    assert!(!controller.wait_ready_timeout(Duration::from_millis(20)));

    controller.stop().unwrap();
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::Connect)), 4);
}

#[test]
fn test_failed_connect_counts_as_connection_failure() {
    let transport = Arc::new(MemoryTransport::new().with_responder(|call| match call {
        TransportCall::Connect => vec![TransportEvent::Connected(ResultCode::ServiceUnavailable)],
        _ => Vec::new(),
    }));
    let controller = SessionController::new(
        transport.clone(),
        Arc::new(PoolCredentials::default()),
        config().with_max_connection_attempts(1),
    )
    .unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(
        next_event(&events),
        SessionEvent::Aborted(AbortReason::ConnectionExhausted)
    );
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::Connect)), 2);
    controller.stop().unwrap();
}

#[test]
fn test_banned_login_returns_before_next_account() {
    let transport = Arc::new(MemoryTransport::new().with_responder(|call| match call {
        TransportCall::Connect => vec![TransportEvent::Connected(ResultCode::Ok)],
        TransportCall::LogOn(_) => vec![TransportEvent::LoggedOn(ResultCode::Banned)],
        _ => Vec::new(),
    }));
    let pool = Arc::new(PoolCredentials::default());
    let controller = SessionController::new(
        transport.clone(),
        pool.clone(),
        config().with_max_login_attempts(2),
    )
    .unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(
        next_event(&events),
        SessionEvent::Aborted(AbortReason::LoginExhausted)
    );
    controller.stop().unwrap();

    assert_eq!(
        pool.ops(),
        vec![
            PoolOp::Get("user0".into()),
            PoolOp::Return("user0".into(), ReturnReason::Banned),
            PoolOp::Get("user1".into()),
            PoolOp::Return("user1".into(), ReturnReason::Banned),
            PoolOp::Get("user2".into()),
            PoolOp::Return("user2".into(), ReturnReason::Banned),
        ]
    );
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::LogOn(_))), 3);
    assert_eq!(controller.login_attempts(), 3);
}

#[test]
fn test_invalid_login_then_success() {
    let attempts = Arc::new(Mutex::new(0u32));
    let transport = Arc::new(MemoryTransport::new().with_responder({
        let attempts = Arc::clone(&attempts);
        move |call| match call {
            TransportCall::Connect => vec![TransportEvent::Connected(ResultCode::Ok)],
            TransportCall::LogOn(_) => {
                let mut n = attempts.lock();
                *n += 1;
                if *n == 1 {
                    vec![TransportEvent::LoggedOn(ResultCode::InvalidPassword)]
                } else {
                    vec![TransportEvent::LoggedOn(ResultCode::Ok)]
                }
            }
            _ => Vec::new(),
        }
    }));
    let pool = Arc::new(PoolCredentials::default());
    let controller = SessionController::new(transport, pool.clone(), config()).unwrap();

    controller.start().unwrap();
    assert!(controller.wait_ready_timeout(WAIT));
    controller.stop().unwrap();

    assert_eq!(
        pool.ops()[..3],
        [
            PoolOp::Get("user0".into()),
            PoolOp::Return("user0".into(), ReturnReason::Invalid),
            PoolOp::Get("user1".into()),
        ]
    );
    assert_eq!(controller.login_attempts(), 1);
}

#[test]
fn test_logged_off_logs_on_again() {
    let transport = Arc::new(MemoryTransport::accepting());
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(transport.clone(), credentials, config()).unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(next_event(&events), SessionEvent::Ready);

    transport.inject(TransportEvent::LoggedOff(ResultCode::ServiceUnavailable));
    assert_eq!(next_event(&events), SessionEvent::NotReady);
    assert_eq!(next_event(&events), SessionEvent::Ready);
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::LogOn(_))), 2);
    // Only failed log-ons spend the login budget.
    assert_eq!(controller.login_attempts(), 0);
    controller.stop().unwrap();
}

#[test]
fn test_counters_survive_successful_reconnect() {
    let transport = Arc::new(MemoryTransport::accepting());
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(transport.clone(), credentials, config()).unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(next_event(&events), SessionEvent::Ready);

    transport.inject(TransportEvent::Disconnected {
        user_initiated: false,
    });
    assert_eq!(next_event(&events), SessionEvent::NotReady);
    assert_eq!(next_event(&events), SessionEvent::Ready);
    assert_eq!(controller.connection_attempts(), 1);

    // A restart is the only thing that clears the counters.
    controller.stop().unwrap();
    assert_eq!(next_event(&events), SessionEvent::NotReady);
    controller.start().unwrap();
    assert_eq!(next_event(&events), SessionEvent::Ready);
    assert_eq!(controller.connection_attempts(), 0);
    controller.stop().unwrap();
}

#[test]
fn test_show_as_online_sets_presence() {
    let transport = Arc::new(MemoryTransport::accepting());
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(
        transport.clone(),
        credentials,
        config().with_show_as_online(true),
    )
    .unwrap();

    controller.start().unwrap();
    assert!(controller.wait_ready_timeout(WAIT));
    // Account info is queued right behind the log-on result.
    thread::sleep(Duration::from_millis(50));
    controller.stop().unwrap();

    assert_eq!(
        count(&transport, |c| {
            *c == TransportCall::SetPersonaState(PersonaState::Online)
        }),
        1
    );
}

#[test]
fn test_presence_untouched_by_default() {
    let transport = Arc::new(MemoryTransport::accepting());
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(transport.clone(), credentials, config()).unwrap();

    controller.start().unwrap();
    assert!(controller.wait_ready_timeout(WAIT));
    thread::sleep(Duration::from_millis(50));
    controller.stop().unwrap();

    assert_eq!(
        count(&transport, |c| matches!(c, TransportCall::SetPersonaState(_))),
        0
    );
}

#[test]
fn test_empty_pool_aborts() {
    let transport = Arc::new(MemoryTransport::accepting());
    let controller =
        SessionController::new(transport, Arc::new(PoolCredentials::empty()), config()).unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(
        next_event(&events),
        SessionEvent::Aborted(AbortReason::CredentialsUnavailable)
    );
    controller.stop().unwrap();
}

#[test]
fn test_drop_returns_lease_unspecified() {
    let transport = Arc::new(MemoryTransport::accepting());
    let pool = Arc::new(PoolCredentials::default());
    {
        let controller = SessionController::new(transport, pool.clone(), config()).unwrap();
        controller.start().unwrap();
        assert!(controller.wait_ready_timeout(WAIT));
    }

    assert_eq!(
        pool.ops(),
        vec![
            PoolOp::Get("user0".into()),
            PoolOp::Return("user0".into(), ReturnReason::None),
        ]
    );
}

#[test]
fn test_restart_ignores_disconnect_from_previous_stop() {
    let transport = Arc::new(MemoryTransport::new().with_responder(|call| match call {
        TransportCall::Connect => vec![TransportEvent::Connected(ResultCode::Ok)],
        TransportCall::LogOn(_) => vec![TransportEvent::LoggedOn(ResultCode::Ok)],
        TransportCall::Disconnect => vec![TransportEvent::Disconnected {
            user_initiated: true,
        }],
        _ => Vec::new(),
    }));
    let credentials = Arc::new(StaticCredentials::new(Credential::new("u", "p")));
    let controller = SessionController::new(
        transport.clone(),
        credentials,
        config().with_max_connection_attempts(0),
    )
    .unwrap();
    let events = controller.subscribe();

    controller.start().unwrap();
    assert_eq!(next_event(&events), SessionEvent::Ready);
    controller.stop().unwrap();
    assert_eq!(next_event(&events), SessionEvent::NotReady);

    controller.start().unwrap();
    assert_eq!(next_event(&events), SessionEvent::Ready);
    thread::sleep(Duration::from_millis(50));

    assert_eq!(controller.state(), SessionState::Ready);
    assert_eq!(controller.abort_reason(), None);
    assert_eq!(controller.connection_attempts(), 0);
    assert_eq!(count(&transport, |c| matches!(c, TransportCall::Connect)), 2);
    controller.stop().unwrap();
}

/// Holds every `get_account` until the test releases it.
struct GatedCredentials {
    entered: crossbeam_channel::Sender<()>,
    release: Receiver<()>,
}

impl CredentialSource for GatedCredentials {
    fn get_account(&self) -> Option<Credential> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        Some(Credential::new("u", "p"))
    }

    fn return_account(&self, _credential: Credential, _reason: ReturnReason) {}
}

#[test]
fn test_slow_credential_source_does_not_block_readers() {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    let credentials = Arc::new(GatedCredentials {
        entered: entered_tx,
        release: release_rx,
    });
    let controller = Arc::new(
        SessionController::new(Arc::new(MemoryTransport::accepting()), credentials, config())
            .unwrap(),
    );

    controller.start().unwrap();
    entered_rx.recv_timeout(WAIT).unwrap();

    let (state_tx, state_rx) = crossbeam_channel::unbounded();
    {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            let _ = state_tx.send((controller.state(), controller.abort_reason()));
        });
    }
    assert_eq!(
        state_rx.recv_timeout(WAIT).unwrap(),
        (SessionState::ConnectedUnauthenticated, None)
    );

    release_tx.send(()).unwrap();
    assert!(controller.wait_ready_timeout(WAIT));
    controller.stop().unwrap();
}
