//! Conversation list and message threads.
//!
//! The conversation list is derived state: it is rebuilt wholesale
//! from the REST snapshot and never synthesized from push events;
//! pushes only trigger a (throttled) re-fetch. Open threads are the
//! one place incoming messages are patched in directly, deduplicated
//! by id and kept sorted by send time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use motorbay_shared::{ApiError, ChatMessage, ConversationSummary};

use super::ChangeNotifier;
use crate::platform::TaskFn;
use crate::session::SessionStore;

#[derive(Default)]
pub struct ConversationsState {
    pub loading: bool,
    pub error: Option<String>,
    pub conversations: Vec<ConversationSummary>,
    /// Loaded threads keyed by counterpart user id.
    pub threads: HashMap<String, Vec<ChatMessage>>,
}

#[derive(Clone)]
pub struct ConversationsStore {
    session: SessionStore,
    inner: Arc<Mutex<ConversationsState>>,
    changed: ChangeNotifier,
}

impl ConversationsStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(ConversationsState::default())),
            changed: ChangeNotifier::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConversationsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
        self.changed.notify();
    }

    /// Register the callback run after every state change.
    pub fn on_change(&self, f: TaskFn) {
        self.changed.set(f);
    }

    pub fn clear_on_change(&self) {
        self.changed.clear();
    }

    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.lock().conversations.clone()
    }

    pub fn thread(&self, user_id: &str) -> Vec<ChatMessage> {
        self.lock().threads.get(user_id).cloned().unwrap_or_default()
    }

    pub fn unread_total(&self) -> u32 {
        self.lock().conversations.iter().map(|c| c.unread_count).sum()
    }

    /// User-initiated snapshot fetch; shows the loading state.
    pub async fn refresh(&self) -> bool {
        self.fetch(true).await
    }

    /// Background reconciliation (realtime-triggered); no loading
    /// state, failures are logged rather than surfaced.
    pub async fn reconcile(&self) -> bool {
        self.fetch(false).await
    }

    async fn fetch(&self, user_initiated: bool) -> bool {
        if user_initiated {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }

        match self.session.client().list_conversations().await {
            Ok(conversations) => {
                let mut state = self.lock();
                state.conversations = conversations;
                state.loading = false;
                drop(state);
                self.changed.notify();
                true
            }
            Err(e) => {
                self.fail(user_initiated, &e);
                false
            }
        }
    }

    /// Fetch the message history with one counterpart.
    pub async fn load_thread(&self, user_id: &str) -> bool {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        match self.session.client().chat_history(user_id).await {
            Ok(mut messages) => {
                messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
                let mut state = self.lock();
                state.threads.insert(user_id.to_string(), messages);
                state.loading = false;
                drop(state);
                self.changed.notify();
                true
            }
            Err(e) => {
                self.fail(true, &e);
                false
            }
        }
    }

    /// Patch a pushed message into its thread, if that thread is
    /// loaded. The conversation list itself is reconciled separately.
    pub fn apply_incoming(&self, message: &ChatMessage) {
        let me = self.session.user().map(|u| u.id).unwrap_or_default();
        let counterpart = if message.sender_id == me {
            message.receiver_id.clone()
        } else {
            message.sender_id.clone()
        };

        let inserted = {
            let mut state = self.lock();
            match state.threads.get_mut(&counterpart) {
                Some(thread) => add_message(thread, message.clone()),
                None => false,
            }
        };
        if inserted {
            self.changed.notify();
        }
    }

    /// Mark a message read in whatever thread holds it.
    pub fn apply_read(&self, message_id: &str) {
        let mut state = self.lock();
        for thread in state.threads.values_mut() {
            if let Some(message) = thread.iter_mut().find(|m| m.id == message_id) {
                if message.read_at.is_none() {
                    message.read_at = Some(Utc::now());
                }
            }
        }
        drop(state);
        self.changed.notify();
    }

    fn fail(&self, user_initiated: bool, err: &ApiError) {
        crate::log_warn!("conversations: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        if user_initiated {
            state.error = Some(err.user_message());
        }
        drop(state);
        self.changed.notify();
    }
}

/// Insert a message into a thread, maintaining sort order by send
/// time. Returns false if a message with the same id already exists.
pub(crate) fn add_message(thread: &mut Vec<ChatMessage>, message: ChatMessage) -> bool {
    if thread.iter().any(|m| m.id == message.id) {
        return false;
    }

    let pos = thread
        .binary_search_by(|m| m.sent_at.cmp(&message.sent_at))
        .unwrap_or_else(|pos| pos);
    thread.insert(pos, message);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn message(id: &str, offset_secs: i64) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            sender_id: "u-1".into(),
            receiver_id: "u-2".into(),
            content: format!("message {id}"),
            sent_at: Utc::now() + Duration::seconds(offset_secs),
            read_at: None,
        }
    }

    #[test]
    fn add_message_keeps_send_order() {
        let mut thread = Vec::new();
        assert!(add_message(&mut thread, message("m-2", 10)));
        assert!(add_message(&mut thread, message("m-1", 0)));
        assert!(add_message(&mut thread, message("m-3", 20)));

        let ids: Vec<_> = thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m-1", "m-2", "m-3"]);
    }

    #[test]
    fn add_message_deduplicates_by_id() {
        let mut thread = Vec::new();
        assert!(add_message(&mut thread, message("m-1", 0)));
        assert!(!add_message(&mut thread, message("m-1", 5)));
        assert_eq!(thread.len(), 1);
    }
}
