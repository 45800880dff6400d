//! Application event bus.
//!
//! An explicit publish/subscribe service passed by reference to the
//! components that need it. It decouples the session store, the hub
//! manager and the resource stores without ambient globals: publishers
//! fire-and-forget, listeners tolerate repeated delivery, and an event
//! with zero listeners is dropped silently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use motorbay_shared::ChatMessage;

use crate::platform::Callback;

/// Cross-cutting signals carried by the bus. Payloads are part of the
/// event; the bus itself does not interpret them.
#[derive(Debug, Clone)]
pub enum AppEvent {
    AuthStateChanged,
    UserDataUpdated,
    ImpersonationStopped,
    FriendRequestSent,
    FriendRequestRejected { request_id: String },
    FriendRemoved { user_id: String },
    MessageReceived(ChatMessage),
    MessagesRead { message_id: String },
    MessageRequestAccepted { user_id: String },
}

/// Subscription key for [`AppEvent`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AuthStateChanged,
    UserDataUpdated,
    ImpersonationStopped,
    FriendRequestSent,
    FriendRequestRejected,
    FriendRemoved,
    MessageReceived,
    MessagesRead,
    MessageRequestAccepted,
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::AuthStateChanged => EventKind::AuthStateChanged,
            AppEvent::UserDataUpdated => EventKind::UserDataUpdated,
            AppEvent::ImpersonationStopped => EventKind::ImpersonationStopped,
            AppEvent::FriendRequestSent => EventKind::FriendRequestSent,
            AppEvent::FriendRequestRejected { .. } => EventKind::FriendRequestRejected,
            AppEvent::FriendRemoved { .. } => EventKind::FriendRemoved,
            AppEvent::MessageReceived(_) => EventKind::MessageReceived,
            AppEvent::MessagesRead { .. } => EventKind::MessagesRead,
            AppEvent::MessageRequestAccepted { .. } => EventKind::MessageRequestAccepted,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]; pass it back to
/// [`EventBus::unsubscribe`] to drop the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct BusInner {
    listeners: HashMap<EventKind, Vec<(u64, Callback<AppEvent>)>>,
}

/// Tab-wide publish/subscribe keyed by event kind.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener for one event kind.
    pub fn subscribe(&self, kind: EventKind, listener: Callback<AppEvent>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .listeners
            .entry(kind)
            .or_default()
            .push((id, listener));
        SubscriptionId(id)
    }

    /// Drop a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.lock();
        for listeners in inner.listeners.values_mut() {
            listeners.retain(|(lid, _)| *lid != id.0);
        }
    }

    /// Broadcast an event to every listener registered for its kind.
    ///
    /// Listeners run after the bus lock is released, so a listener may
    /// publish or (un)subscribe without deadlocking.
    pub fn emit(&self, event: AppEvent) {
        let listeners: Vec<Callback<AppEvent>> = {
            let inner = self.lock();
            inner
                .listeners
                .get(&event.kind())
                .map(|ls| ls.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };

        crate::log_debug!("bus: {:?} -> {} listener(s)", event.kind(), listeners.len());

        for listener in listeners {
            listener(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::callback;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emit_with_zero_listeners_is_a_no_op() {
        let bus = EventBus::new();
        bus.emit(AppEvent::AuthStateChanged);
    }

    #[test]
    fn listeners_receive_matching_kind_only() {
        let bus = EventBus::new();
        let auth_hits = Arc::new(AtomicUsize::new(0));

        let hits = auth_hits.clone();
        bus.subscribe(
            EventKind::AuthStateChanged,
            callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(AppEvent::AuthStateChanged);
        bus.emit(AppEvent::UserDataUpdated);
        bus.emit(AppEvent::AuthStateChanged);

        assert_eq!(auth_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let id = bus.subscribe(
            EventKind::FriendRemoved,
            callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(AppEvent::FriendRemoved { user_id: "u-1".into() });
        bus.unsubscribe(id);
        bus.emit(AppEvent::FriendRemoved { user_id: "u-1".into() });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_emit_without_deadlock() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        bus.subscribe(
            EventKind::MessagesRead,
            callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        bus.subscribe(
            EventKind::MessageReceived,
            callback(move |_| {
                inner_bus.emit(AppEvent::MessagesRead { message_id: "m-1".into() });
            }),
        );

        bus.emit(AppEvent::MessageReceived(sample_message()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    fn sample_message() -> ChatMessage {
        ChatMessage {
            id: "m-1".into(),
            sender_id: "u-1".into(),
            receiver_id: "u-2".into(),
            content: "hi".into(),
            sent_at: chrono::Utc::now(),
            read_at: None,
        }
    }
}
