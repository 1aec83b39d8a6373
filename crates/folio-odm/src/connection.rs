//! Connection lifecycle management
//!
//! One manager owns one connection's state. `open`/`close` are serialized
//! behind an async mutex, so a transition is never observed half-applied and
//! concurrent calls queue rather than interleave. Readiness changes fan out
//! to subscribers in subscription order and to an internal watch channel
//! that store operations race against for cancellation.

use crate::storage::StorageHook;
use folio_common::{FolioError, Result};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::debug;

// ============================================================================
// Connection State
// ============================================================================

/// Lifecycle state of a connection
///
/// Transitions: `Disconnected → Connecting → {Connected | Error} →
/// Disconnecting → Disconnected`. There is no built-in reconnection; after
/// `close` or a failed establishment the caller opens again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection and none being established
    Disconnected,
    /// Establishment in progress
    Connecting,
    /// Ready for store operations
    Connected,
    /// Teardown in progress; pending operations fail from here on
    Disconnecting,
    /// Establishment failed; a new `open` is required
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// Connect Options
// ============================================================================

/// Options applied while establishing a connection
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Bound on the establishment handshake (default: 10s).
    /// Store operations themselves are never timed out here.
    pub connect_timeout: Option<Duration>,
    /// Application name passed to the backend for its logs
    pub app_name: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            app_name: None,
        }
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Handle returned by [`ConnectionManager::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type SubscriberFn = Arc<dyn Fn(ConnectionState) + Send + Sync>;

// ============================================================================
// Connection Manager
// ============================================================================

/// Owns a connection's state machine and gates store operations on it.
pub struct ConnectionManager {
    hook: Arc<dyn StorageHook>,
    state_tx: watch::Sender<ConnectionState>,
    // Held across a whole transition, establishment included: this is the
    // queue that serializes concurrent open/close calls.
    transition: Mutex<()>,
    subscribers: StdMutex<Vec<(u64, SubscriberFn)>>,
    next_subscription: AtomicU64,
}

impl ConnectionManager {
    /// Create a manager over a storage hook, starting disconnected
    pub fn new(hook: Arc<dyn StorageHook>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            hook,
            state_tx,
            transition: Mutex::new(()),
            subscribers: StdMutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Whether the manager is ready for store operations
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Establish the connection.
    ///
    /// A no-op when already connected. When another caller is mid-open, this
    /// call queues behind it and returns once that establishment settles -
    /// exactly one underlying connect attempt is made. From `Disconnected`
    /// or `Error`, transitions through `Connecting` to `Connected`, or to
    /// `Error` when the handshake fails or times out.
    pub async fn open(&self, address: &str, options: ConnectOptions) -> Result<()> {
        let _guard = self.transition.lock().await;

        match self.state() {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Disconnected | ConnectionState::Error => {}
            // Transitions settle while the lock is held; a mid-flight state
            // here means a prior open/close future was dropped mid-transition
            state => {
                return Err(FolioError::Internal(format!(
                    "open called in transitional state '{}'",
                    state
                )))
            }
        }

        self.set_state(ConnectionState::Connecting);

        let attempt = self.hook.connect(address, &options);
        let outcome = match options.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(FolioError::Connection(format!(
                    "connect to {} timed out after {:?}",
                    address, limit
                ))),
            },
            None => attempt.await,
        };

        match outcome {
            Ok(()) => {
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(error) => {
                self.set_state(ConnectionState::Error);
                Err(error)
            }
        }
    }

    /// Tear the connection down.
    ///
    /// Valid from `Connected` or `Error`; transitions through
    /// `Disconnecting` to `Disconnected`. Idempotent from `Disconnected`:
    /// no error, no transition events. Operations in flight observe
    /// `Disconnecting` and fail with `ConnectionClosed`.
    pub async fn close(&self) -> Result<()> {
        let _guard = self.transition.lock().await;

        match self.state() {
            ConnectionState::Disconnected => return Ok(()),
            ConnectionState::Connected | ConnectionState::Error => {}
            state => {
                return Err(FolioError::Internal(format!(
                    "close called in transitional state '{}'",
                    state
                )))
            }
        }

        self.set_state(ConnectionState::Disconnecting);
        let outcome = self.hook.disconnect().await;
        self.set_state(ConnectionState::Disconnected);
        outcome
    }

    /// Register a readiness subscriber.
    ///
    /// Subscribers are invoked once per transition, in subscription order,
    /// inline on the transitioning task - keep them light.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .push((id, Arc::new(subscriber)));
        SubscriptionId(id)
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber registry poisoned");
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id.0);
        subscribers.len() != before
    }

    /// Wait until the manager reaches the given state
    pub async fn wait_for(&self, target: ConnectionState) -> Result<()> {
        let mut rx = self.state_tx.subscribe();
        rx.wait_for(|state| *state == target)
            .await
            .map_err(|_| FolioError::Internal("connection manager dropped".to_string()))?;
        Ok(())
    }

    /// The storage hook this manager drives
    pub(crate) fn hook(&self) -> &Arc<dyn StorageHook> {
        &self.hook
    }

    /// Run a store operation gated on the connection state.
    ///
    /// Fails immediately with `NotConnected` unless currently connected,
    /// and with `ConnectionClosed` if the state leaves `Connected` (close
    /// begins, or establishment is torn down) before the operation
    /// completes.
    pub(crate) async fn run_guarded<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.is_connected() {
            return Err(FolioError::NotConnected);
        }

        let mut rx = self.state_tx.subscribe();
        tokio::select! {
            result = operation => result,
            changed = rx.wait_for(|state| *state != ConnectionState::Connected) => {
                let _ = changed;
                Err(FolioError::ConnectionClosed)
            }
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state_tx.send_replace(next);
        debug!(from = %previous, to = %next, "connection state transition");

        // Snapshot under the lock, invoke outside it, so a subscriber may
        // register or remove subscriptions without deadlocking
        let snapshot: Vec<SubscriberFn> = self
            .subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        for subscriber in snapshot {
            subscriber(next);
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn manager() -> ConnectionManager {
        ConnectionManager::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_starts_disconnected() {
        let conn = manager();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_open_reaches_connected() {
        tokio_test::block_on(async {
            let conn = manager();
            conn.open("memory://test", ConnectOptions::default())
                .await
                .unwrap();
            assert!(conn.is_connected());
        });
    }

    #[test]
    fn test_open_when_connected_is_noop() {
        tokio_test::block_on(async {
            let store = Arc::new(MemoryStore::new());
            let conn = ConnectionManager::new(Arc::clone(&store) as Arc<dyn StorageHook>);

            conn.open("memory://test", ConnectOptions::default())
                .await
                .unwrap();
            conn.open("memory://test", ConnectOptions::default())
                .await
                .unwrap();

            assert_eq!(store.connect_calls(), 1);
        });
    }

    #[test]
    fn test_close_walks_through_disconnecting() {
        tokio_test::block_on(async {
            let conn = manager();
            let seen = Arc::new(StdMutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            conn.subscribe(move |state| sink.lock().unwrap().push(state));

            conn.open("memory://test", ConnectOptions::default())
                .await
                .unwrap();
            conn.close().await.unwrap();

            assert_eq!(
                *seen.lock().unwrap(),
                vec![
                    ConnectionState::Connecting,
                    ConnectionState::Connected,
                    ConnectionState::Disconnecting,
                    ConnectionState::Disconnected,
                ]
            );
        });
    }

    #[test]
    fn test_close_when_disconnected_emits_nothing() {
        tokio_test::block_on(async {
            let conn = manager();
            let seen = Arc::new(StdMutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            conn.subscribe(move |state| sink.lock().unwrap().push(state));

            conn.close().await.unwrap();

            assert_eq!(conn.state(), ConnectionState::Disconnected);
            assert!(seen.lock().unwrap().is_empty());
        });
    }

    #[test]
    fn test_subscribers_run_in_subscription_order() {
        tokio_test::block_on(async {
            let conn = manager();
            let seen = Arc::new(StdMutex::new(Vec::new()));

            let sink = Arc::clone(&seen);
            conn.subscribe(move |state| sink.lock().unwrap().push(("first", state)));
            let sink = Arc::clone(&seen);
            conn.subscribe(move |state| sink.lock().unwrap().push(("second", state)));

            conn.open("memory://test", ConnectOptions::default())
                .await
                .unwrap();

            let seen = seen.lock().unwrap();
            assert_eq!(
                *seen,
                vec![
                    ("first", ConnectionState::Connecting),
                    ("second", ConnectionState::Connecting),
                    ("first", ConnectionState::Connected),
                    ("second", ConnectionState::Connected),
                ]
            );
        });
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        tokio_test::block_on(async {
            let conn = manager();
            let seen = Arc::new(StdMutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let id = conn.subscribe(move |state| sink.lock().unwrap().push(state));

            assert!(conn.unsubscribe(id));
            assert!(!conn.unsubscribe(id));

            conn.open("memory://test", ConnectOptions::default())
                .await
                .unwrap();
            assert!(seen.lock().unwrap().is_empty());
        });
    }

    #[test]
    fn test_run_guarded_requires_connected() {
        tokio_test::block_on(async {
            let conn = manager();
            let result = conn.run_guarded(async { Ok(42) }).await;
            assert!(matches!(result, Err(FolioError::NotConnected)));
        });
    }

    #[test]
    fn test_default_options() {
        let options = ConnectOptions::default();
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(10)));
        assert!(options.app_name.is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Disconnecting.to_string(), "disconnecting");
    }
}
