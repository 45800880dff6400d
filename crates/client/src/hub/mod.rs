//! Realtime hub clients.
//!
//! One [`HubConnection`] per hub (chat, friends). The connection owns a
//! dispatch table keyed by event name, so handler re-registration never
//! requires a reconnect, and a state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!                  Connected -> Reconnecting{n} -> Connected
//!                  any state -> Disconnected        (stop / unrecoverable)
//! ```
//!
//! The transport is a WebSocket: `web_sys` on wasm, tokio-tungstenite
//! natively. Both implementations feed inbound frames through
//! [`dispatch_frame`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_channel::mpsc::UnboundedSender;
use motorbay_shared::{HubInvocation, HubMessage};
use serde_json::Value;

use crate::platform::Callback;

mod manager;
pub use manager::HubManager;

#[cfg(target_arch = "wasm32")]
mod connection_wasm;
#[cfg(not(target_arch = "wasm32"))]
mod connection_native;

/// Connection state for a hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }
}

/// Retry delay before reconnect attempt `attempt` (0-based).
///
/// The 0s/2s/10s/30s ladder is part of the contract with the backend:
/// fast recovery for blips, bounded load when it is down. Retries are
/// unbounded.
pub fn reconnect_delay_ms(attempt: u32) -> u64 {
    match attempt {
        0 => 0,
        1 => 2_000,
        2 => 10_000,
        _ => 30_000,
    }
}

/// Errors surfaced by [`HubConnection::invoke`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("hub is not connected")]
    NotConnected,
    #[error("hub send failed: {0}")]
    Send(String),
}

/// Produces the connection URL (token included as a query parameter),
/// or `None` when no valid session is available.
#[cfg(target_arch = "wasm32")]
pub type UrlBuilder = std::rc::Rc<dyn Fn() -> Option<String>>;
#[cfg(not(target_arch = "wasm32"))]
pub type UrlBuilder = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub fn url_builder<F: Fn() -> Option<String> + 'static>(f: F) -> UrlBuilder {
    std::rc::Rc::new(f)
}
#[cfg(not(target_arch = "wasm32"))]
pub fn url_builder<F: Fn() -> Option<String> + Send + Sync + 'static>(f: F) -> UrlBuilder {
    Arc::new(f)
}

pub(crate) struct HubInner {
    name: &'static str,
    url_builder: UrlBuilder,
    state: Mutex<ConnectionState>,
    handlers: Mutex<HashMap<String, Callback<Value>>>,
    on_error: Mutex<Option<Callback<String>>>,
    /// Present exactly while a socket is open; `invoke` refuses to
    /// queue into anything else.
    sender: Mutex<Option<UnboundedSender<String>>>,
    /// Collapses concurrent connect attempts into one drive loop.
    connect_in_flight: AtomicBool,
    /// Bumped by `stop()`; a drive loop exits when its generation is
    /// no longer current.
    generation: AtomicU64,
}

impl HubInner {
    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.lock_state() = state;
    }

    pub(crate) fn install_sender(&self, tx: UnboundedSender<String>) {
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
    }

    pub(crate) fn clear_sender(&self) {
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn report_error(&self, message: String) {
        crate::log_warn!("{} hub: {}", self.name, message);
        let callback = self
            .on_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(message);
        }
    }
}

/// Dispatch one inbound frame to the handler registered for its event
/// name. Unknown events and malformed frames are logged and forwarded
/// to the error callback; they never tear the connection down.
pub(crate) fn dispatch_frame(inner: &HubInner, text: &str) {
    let msg: HubMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            inner.report_error(format!("unreadable frame: {e}"));
            return;
        }
    };

    let handler = inner
        .handlers
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&msg.target)
        .cloned();

    match handler {
        Some(handler) => handler(msg.data),
        None => inner.report_error(format!("unhandled event {}", msg.target)),
    }
}

/// Sleep `total_ms` in short slices so a `stop()` mid-backoff is
/// noticed promptly. Returns false when the generation went stale.
pub(crate) async fn backoff_sleep(inner: &HubInner, generation: u64, total_ms: u64) -> bool {
    let mut remaining = total_ms;
    loop {
        if inner.current_generation() != generation {
            return false;
        }
        if remaining == 0 {
            return true;
        }
        let slice = remaining.min(250);
        crate::platform::sleep_ms(slice).await;
        remaining -= slice;
    }
}

/// A client for one realtime hub.
#[derive(Clone)]
pub struct HubConnection {
    inner: Arc<HubInner>,
}

impl HubConnection {
    /// Create a disconnected client. `url_builder` is consulted on
    /// every connection attempt so a refreshed token is picked up
    /// without re-creating the client.
    pub fn new(name: &'static str, url_builder: UrlBuilder) -> Self {
        Self {
            inner: Arc::new(HubInner {
                name,
                url_builder,
                state: Mutex::new(ConnectionState::Disconnected),
                handlers: Mutex::new(HashMap::new()),
                on_error: Mutex::new(None),
                sender: Mutex::new(None),
                connect_in_flight: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock_state().clone()
    }

    /// Register (or replace) the handler for one event name. Takes
    /// effect immediately; no reconnect involved.
    pub fn on(&self, event: impl Into<String>, handler: Callback<Value>) {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event.into(), handler);
    }

    /// Register the callback receiving unknown/`Error` events and
    /// invocation failures.
    pub fn on_hub_error(&self, handler: Callback<String>) {
        *self
            .inner
            .on_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Start a connect cycle.
    ///
    /// Returns `false` without doing anything when the hub is already
    /// Connected/Connecting, another connect is in flight, or there is
    /// no valid session token to connect with.
    pub fn connect(&self) -> bool {
        {
            let state = self.inner.lock_state();
            if state.is_connected() || state.is_connecting() {
                crate::log_debug!("{} hub: connect ignored, state {:?}", self.inner.name, *state);
                return false;
            }
        }

        if self
            .inner
            .connect_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            crate::log_debug!("{} hub: connect already in flight", self.inner.name);
            return false;
        }

        if (self.inner.url_builder)().is_none() {
            crate::log_info!("{} hub: no valid session, connect skipped", self.inner.name);
            self.inner.connect_in_flight.store(false, Ordering::SeqCst);
            return false;
        }

        self.inner.set_state(ConnectionState::Connecting);
        let generation = self.inner.current_generation();

        #[cfg(target_arch = "wasm32")]
        crate::platform::spawn(connection_wasm::drive(self.inner.clone(), generation));
        #[cfg(not(target_arch = "wasm32"))]
        crate::platform::spawn(connection_native::drive(self.inner.clone(), generation));

        true
    }

    /// Invoke a server procedure.
    ///
    /// Fails fast when not Connected: one background connect cycle is
    /// kicked off, the error callback fires, and the call reports
    /// [`HubError::NotConnected`]. Nothing is queued for later.
    pub fn invoke(&self, target: &str, arguments: Vec<Value>) -> Result<(), HubError> {
        if !self.state().is_connected() {
            self.connect();
            self.inner
                .report_error(format!("cannot invoke {target} while disconnected"));
            return Err(HubError::NotConnected);
        }

        let invocation = HubInvocation {
            id: uuid::Uuid::new_v4().to_string(),
            target: target.to_string(),
            arguments,
        };
        let json = serde_json::to_string(&invocation).map_err(|e| HubError::Send(e.to_string()))?;

        let sender = self
            .inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match sender {
            Some(tx) => tx.unbounded_send(json).map_err(|e| {
                let err = HubError::Send(e.to_string());
                self.inner.report_error(format!("invoke {target} failed: {e}"));
                err
            }),
            None => {
                self.inner
                    .report_error(format!("cannot invoke {target}: socket gone"));
                Err(HubError::NotConnected)
            }
        }
    }

    /// Stop the connection. Safe to call at any time, repeatedly.
    pub fn stop(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_sender();
        self.inner.set_state(ConnectionState::Disconnected);
        crate::log_info!("{} hub: stopped", self.inner.name);
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::platform::callback;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn backoff_ladder_is_fixed() {
        assert_eq!(reconnect_delay_ms(0), 0);
        assert_eq!(reconnect_delay_ms(1), 2_000);
        assert_eq!(reconnect_delay_ms(2), 10_000);
        assert_eq!(reconnect_delay_ms(3), 30_000);
        assert_eq!(reconnect_delay_ms(100), 30_000);
    }

    #[tokio::test]
    async fn concurrent_connects_collapse_into_one_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let hub = HubConnection::new(
            "test",
            url_builder(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Some("ws://127.0.0.1:1/hubs/test".to_string())
            }),
        );

        // Both calls run back-to-back on the current thread; the drive
        // loop cannot have produced a second attempt in between.
        assert!(hub.connect());
        assert!(!hub.connect(), "second connect is a no-op");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(hub.state().is_connecting());

        hub.stop();
        assert_eq!(hub.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_without_session_is_a_no_op() {
        let hub = HubConnection::new("test", url_builder(|| None));
        assert!(!hub.connect());
        assert_eq!(hub.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn invoke_while_disconnected_fails_fast() {
        let hub = HubConnection::new("test", url_builder(|| None));

        let errors = Arc::new(AtomicUsize::new(0));
        let counter = errors.clone();
        hub.on_hub_error(callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let result = hub.invoke("SendMessage", vec![serde_json::json!("u-2")]);
        assert_eq!(result, Err(HubError::NotConnected));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_registration_replaces_without_reconnect() {
        let hub = HubConnection::new("test", url_builder(|| None));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        hub.on("ReceiveMessage", callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = second.clone();
        hub.on("ReceiveMessage", callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        dispatch_frame(&hub.inner, r#"{"target":"ReceiveMessage","data":{}}"#);
        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced handler never fires");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_events_go_to_the_error_callback() {
        let hub = HubConnection::new("test", url_builder(|| None));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let sink = errors.clone();
        hub.on_hub_error(callback(move |msg: String| {
            sink.lock().unwrap().push(msg);
        }));

        dispatch_frame(&hub.inner, r#"{"target":"Mystery","data":null}"#);
        dispatch_frame(&hub.inner, "not json");

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Mystery"));
    }
}
