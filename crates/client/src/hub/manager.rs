//! Hub wiring.
//!
//! Owns the two hub connections and is the only module that connects
//! realtime events to the rest of the client: chat events are
//! translated onto the bus, friend events trigger the (throttled)
//! friends reconciliation, and session changes restart the connections
//! with a fresh token.

use motorbay_shared::{
    chat_events, chat_procedures, friend_events, ChatMessage, FriendRemovedPayload,
    HubErrorPayload, MessageReadPayload, RequestCancelledPayload, CHAT_HUB_PATH, FRIEND_HUB_PATH,
};
use serde_json::json;

use super::{url_builder, HubConnection, HubError};
use crate::bus::{AppEvent, EventKind};
use crate::config;
use crate::platform::{callback, task};
use crate::session::SessionStore;
use crate::stores::{ConversationsStore, FriendsStore};
use crate::throttle::{RefetchThrottle, REFETCH_WINDOW_MS};

#[derive(Clone)]
pub struct HubManager {
    pub chat: HubConnection,
    pub friends: HubConnection,
    session: SessionStore,
}

impl HubManager {
    pub fn new(session: SessionStore) -> Self {
        let base = config::api_base_url();

        let chat = HubConnection::new("chat", {
            let session = session.clone();
            let base = base.clone();
            url_builder(move || {
                session
                    .access_token()
                    .map(|token| config::hub_url(&base, CHAT_HUB_PATH, &token))
            })
        });
        let friends = HubConnection::new("friends", {
            let session = session.clone();
            url_builder(move || {
                session
                    .access_token()
                    .map(|token| config::hub_url(&base, FRIEND_HUB_PATH, &token))
            })
        });

        let manager = Self { chat, friends, session };
        manager.wire_chat_events();
        manager.wire_error_events();
        manager.wire_session_changes();
        manager
    }

    /// Connect both hubs if a valid session exists.
    pub fn start(&self) {
        if !self.session.is_valid() {
            crate::log_info!("hubs: no valid session, not connecting");
            return;
        }
        self.chat.connect();
        self.friends.connect();
    }

    /// Stop both hubs. Idempotent.
    pub fn shutdown(&self) {
        self.chat.stop();
        self.friends.stop();
    }

    /// Invoke `SendMessage` on the chat hub. Fails fast when offline;
    /// the message is not queued.
    pub fn send_message(&self, receiver_id: &str, content: &str) -> Result<(), HubError> {
        self.chat.invoke(
            chat_procedures::SEND_MESSAGE,
            vec![json!(receiver_id), json!(content)],
        )
    }

    /// Invoke `MarkAsRead` on the chat hub.
    pub fn mark_as_read(&self, message_id: &str) -> Result<(), HubError> {
        self.chat
            .invoke(chat_procedures::MARK_AS_READ, vec![json!(message_id)])
    }

    /// Route friend-hub pushes into the store's throttled
    /// reconciliation. The push itself carries no authoritative state;
    /// the snapshot fetch does.
    pub fn attach_friends(&self, store: &FriendsStore) {
        let throttle = reconcile_throttle(store.clone());
        for event in [
            friend_events::REQUEST_RECEIVED,
            friend_events::REQUEST_ACCEPTED,
            friend_events::REQUEST_REJECTED,
        ] {
            let throttle = throttle.clone();
            self.friends.on(event, callback(move |_| throttle.trigger()));
        }

        // Cancellations and removals carry the affected id; log it so a
        // row that disappears on the next snapshot can be traced back to
        // its push.
        let t = throttle.clone();
        self.friends.on(
            friend_events::REQUEST_CANCELLED,
            callback(move |data| {
                match serde_json::from_value::<RequestCancelledPayload>(data) {
                    Ok(payload) => {
                        crate::log_debug!("friend hub: request {} cancelled", payload.request_id)
                    }
                    Err(e) => {
                        crate::log_warn!("friend hub: bad FriendRequestCancelled payload: {}", e)
                    }
                }
                t.trigger();
            }),
        );
        let t = throttle;
        self.friends.on(
            friend_events::FRIEND_REMOVED,
            callback(move |data| {
                match serde_json::from_value::<FriendRemovedPayload>(data) {
                    Ok(payload) => {
                        crate::log_debug!("friend hub: friend {} removed", payload.user_id)
                    }
                    Err(e) => crate::log_warn!("friend hub: bad FriendRemoved payload: {}", e),
                }
                t.trigger();
            }),
        );
    }

    /// Subscribe the conversations store to the chat bus events: open
    /// threads are patched in place, the conversation list re-fetches
    /// through the throttle.
    pub fn attach_conversations(&self, store: &ConversationsStore) {
        let bus = self.session.bus();
        let throttle = {
            let store = store.clone();
            RefetchThrottle::new(
                REFETCH_WINDOW_MS,
                task(move || {
                    let store = store.clone();
                    crate::platform::spawn(async move {
                        store.reconcile().await;
                    });
                }),
            )
        };

        bus.subscribe(EventKind::MessageReceived, {
            let store = store.clone();
            let throttle = throttle.clone();
            callback(move |event| {
                if let AppEvent::MessageReceived(message) = &event {
                    store.apply_incoming(message);
                }
                throttle.trigger();
            })
        });
        bus.subscribe(EventKind::MessagesRead, {
            let store = store.clone();
            let throttle = throttle.clone();
            callback(move |event| {
                if let AppEvent::MessagesRead { message_id } = &event {
                    store.apply_read(message_id);
                }
                throttle.trigger();
            })
        });
        bus.subscribe(EventKind::MessageRequestAccepted, {
            callback(move |_| throttle.trigger())
        });
    }

    fn wire_chat_events(&self) {
        let bus = self.session.bus().clone();
        self.chat.on(
            chat_events::RECEIVE_MESSAGE,
            callback(move |data| match serde_json::from_value::<ChatMessage>(data) {
                Ok(message) => bus.emit(AppEvent::MessageReceived(message)),
                Err(e) => crate::log_warn!("chat hub: bad ReceiveMessage payload: {}", e),
            }),
        );

        // The echo of the user's own send (possibly from another tab);
        // it lands in the same conversation, so it rides the same event.
        let bus = self.session.bus().clone();
        self.chat.on(
            chat_events::MESSAGE_SENT,
            callback(move |data| match serde_json::from_value::<ChatMessage>(data) {
                Ok(message) => bus.emit(AppEvent::MessageReceived(message)),
                Err(e) => crate::log_warn!("chat hub: bad MessageSent payload: {}", e),
            }),
        );

        let bus = self.session.bus().clone();
        self.chat.on(
            chat_events::MESSAGE_READ,
            callback(move |data| {
                match serde_json::from_value::<MessageReadPayload>(data) {
                    Ok(payload) => bus.emit(AppEvent::MessagesRead {
                        message_id: payload.message_id,
                    }),
                    Err(e) => crate::log_warn!("chat hub: bad MessageRead payload: {}", e),
                }
            }),
        );
    }

    /// Server-pushed `Error` frames are app-level failures (a rejected
    /// procedure, a bad payload on the server side); they are logged
    /// and never close the connection.
    fn wire_error_events(&self) {
        let targets = [
            (&self.chat, chat_events::ERROR),
            (&self.friends, friend_events::ERROR),
        ];
        for (hub, event) in targets {
            let name = hub.name();
            hub.on(
                event,
                callback(move |data| match serde_json::from_value::<HubErrorPayload>(data) {
                    Ok(payload) => crate::log_warn!("{} hub: server error: {}", name, payload.message),
                    Err(e) => crate::log_warn!("{} hub: bad Error payload: {}", name, e),
                }),
            );
        }
    }

    /// Restart the connections whenever the session changes: a login
    /// or impersonation switch means the old token is the wrong
    /// identity, a logout means there is nothing to connect with.
    fn wire_session_changes(&self) {
        let session = self.session.clone();
        let chat = self.chat.clone();
        let friends = self.friends.clone();
        self.session.bus().subscribe(
            EventKind::AuthStateChanged,
            callback(move |_| {
                chat.stop();
                friends.stop();
                if !session.is_valid() {
                    return;
                }
                // Give the old drive loops a moment to wind down before
                // reconnecting with the new token.
                let chat = chat.clone();
                let friends = friends.clone();
                crate::platform::spawn(async move {
                    crate::platform::sleep_ms(300).await;
                    chat.connect();
                    friends.connect();
                });
            }),
        );
    }
}

fn reconcile_throttle(store: FriendsStore) -> RefetchThrottle {
    RefetchThrottle::new(
        REFETCH_WINDOW_MS,
        task(move || {
            let store = store.clone();
            crate::platform::spawn(async move {
                store.reconcile().await;
            });
        }),
    )
}
