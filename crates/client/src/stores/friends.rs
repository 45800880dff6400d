//! Friends and friend-request store.
//!
//! Holds the three collections a friends page renders: confirmed
//! friends, pending requests addressed to the user, pending requests
//! the user sent. Mutations patch the collections optimistically; hub
//! pushes arrive as (throttled) `reconcile` calls wired up by the hub
//! manager, which rebuild all three from a snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use motorbay_shared::{
    ApiError, Friend, FriendRequest, FriendRequestStatus, SendFriendRequestRequest,
};

use super::collection::{insert_head, remove_by_key};
use super::ChangeNotifier;
use crate::bus::AppEvent;
use crate::platform::TaskFn;
use crate::session::SessionStore;

#[derive(Default)]
pub struct FriendsState {
    pub loading: bool,
    pub error: Option<String>,
    pub friends: Vec<Friend>,
    pub pending_received: Vec<FriendRequest>,
    pub pending_sent: Vec<FriendRequest>,
}

#[derive(Clone)]
pub struct FriendsStore {
    session: SessionStore,
    inner: Arc<Mutex<FriendsState>>,
    changed: ChangeNotifier,
}

impl FriendsStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(FriendsState::default())),
            changed: ChangeNotifier::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FriendsState> {
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

    pub fn friends(&self) -> Vec<Friend> {
        self.lock().friends.clone()
    }

    pub fn pending_received(&self) -> Vec<FriendRequest> {
        self.lock().pending_received.clone()
    }

    pub fn pending_sent(&self) -> Vec<FriendRequest> {
        self.lock().pending_sent.clone()
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

        let me = self.session.user().map(|u| u.id).unwrap_or_default();
        let client = self.session.client();
        let friends = client.list_friends().await;
        let requests = client.list_friend_requests().await;

        match (friends, requests) {
            (Ok(friends), Ok(requests)) => {
                let mut state = self.lock();
                state.friends = friends;
                state.pending_received = requests
                    .iter()
                    .filter(|r| r.status == FriendRequestStatus::Pending && r.addressee_id == me)
                    .cloned()
                    .collect();
                state.pending_sent = requests
                    .into_iter()
                    .filter(|r| r.status == FriendRequestStatus::Pending && r.requester_id == me)
                    .collect();
                state.loading = false;
                drop(state);
                self.changed.notify();
                true
            }
            (Err(e), _) | (_, Err(e)) => {
                self.fail(user_initiated, &e);
                false
            }
        }
    }

    pub async fn send_request(&self, addressee_id: &str) -> Option<FriendRequest> {
        self.begin();
        let req = SendFriendRequestRequest {
            addressee_id: addressee_id.to_string(),
        };
        match self.session.client().send_friend_request(&req).await {
            Ok(request) => {
                let mut state = self.lock();
                insert_head(&mut state.pending_sent, request.clone());
                state.loading = false;
                drop(state);
                self.session.bus().emit(AppEvent::FriendRequestSent);
                self.changed.notify();
                Some(request)
            }
            Err(e) => {
                self.fail(true, &e);
                None
            }
        }
    }

    /// Accept a request addressed to the user. The pending entry moves
    /// to the friends list immediately.
    pub async fn accept(&self, request_id: &str) -> Option<Friend> {
        self.begin();
        match self.session.client().accept_friend_request(request_id).await {
            Ok(request) => {
                let friend = {
                    let mut state = self.lock();
                    let friend = apply_accepted(&mut state, &request);
                    state.loading = false;
                    friend
                };
                self.session.bus().emit(AppEvent::MessageRequestAccepted {
                    user_id: friend.user_id.clone(),
                });
                self.changed.notify();
                Some(friend)
            }
            Err(e) => {
                self.fail(true, &e);
                None
            }
        }
    }

    pub async fn reject(&self, request_id: &str) -> bool {
        self.begin();
        match self.session.client().reject_friend_request(request_id).await {
            Ok(_) => {
                let mut state = self.lock();
                remove_by_key(&mut state.pending_received, request_id);
                state.loading = false;
                drop(state);
                self.session.bus().emit(AppEvent::FriendRequestRejected {
                    request_id: request_id.to_string(),
                });
                self.changed.notify();
                true
            }
            Err(e) => {
                self.fail(true, &e);
                false
            }
        }
    }

    /// Cancel a request the user sent. Deletes the pending request
    /// outright; there is no Cancelled status.
    pub async fn cancel(&self, request_id: &str) -> bool {
        self.begin();
        match self.session.client().cancel_friend_request(request_id).await {
            Ok(()) => {
                let mut state = self.lock();
                remove_by_key(&mut state.pending_sent, request_id);
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

    pub async fn remove_friend(&self, user_id: &str) -> bool {
        self.begin();
        match self.session.client().remove_friend(user_id).await {
            Ok(()) => {
                let mut state = self.lock();
                remove_by_key(&mut state.friends, user_id);
                state.loading = false;
                drop(state);
                self.session.bus().emit(AppEvent::FriendRemoved {
                    user_id: user_id.to_string(),
                });
                self.changed.notify();
                true
            }
            Err(e) => {
                self.fail(true, &e);
                false
            }
        }
    }

    fn begin(&self) {
        let mut state = self.lock();
        state.loading = true;
        state.error = None;
        drop(state);
        self.changed.notify();
    }

    fn fail(&self, user_initiated: bool, err: &ApiError) {
        crate::log_warn!("friends: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        if user_initiated {
            state.error = Some(err.user_message());
        }
        drop(state);
        self.changed.notify();
    }
}

/// Move an accepted request out of the pending list and materialize
/// the friendship. `friends_since` comes from the server's response
/// timestamp when present.
pub(crate) fn apply_accepted(state: &mut FriendsState, request: &FriendRequest) -> Friend {
    remove_by_key(&mut state.pending_received, &request.id);
    let friend = Friend {
        user_id: request.requester_id.clone(),
        user: request.requester.clone(),
        friends_since: request.responded_at.unwrap_or_else(Utc::now),
    };
    insert_head(&mut state.friends, friend.clone());
    friend
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use motorbay_shared::UserSummary;

    fn summary(id: &str) -> UserSummary {
        UserSummary {
            id: id.to_string(),
            first_name: "Test".into(),
            last_name: id.to_uppercase(),
            avatar_url: None,
        }
    }

    fn pending_request(id: &str, requester: &str, addressee: &str) -> FriendRequest {
        FriendRequest {
            id: id.to_string(),
            requester_id: requester.to_string(),
            addressee_id: addressee.to_string(),
            requester: summary(requester),
            addressee: summary(addressee),
            status: FriendRequestStatus::Pending,
            created_at: Utc::now() - Duration::minutes(5),
            responded_at: None,
        }
    }

    #[test]
    fn accepting_moves_request_into_friends_with_timestamp() {
        let mut state = FriendsState::default();
        state.pending_received.push(pending_request("r-1", "u-alice", "u-bob"));

        let mut accepted = pending_request("r-1", "u-alice", "u-bob");
        accepted.status = FriendRequestStatus::Accepted;
        accepted.responded_at = Some(Utc::now());

        let friend = apply_accepted(&mut state, &accepted);

        assert!(state.pending_received.is_empty());
        assert_eq!(state.friends.len(), 1);
        assert_eq!(friend.user_id, "u-alice");
        assert_eq!(Some(friend.friends_since), accepted.responded_at);
    }

    #[test]
    fn accepting_twice_keeps_a_single_friend_entry() {
        let mut state = FriendsState::default();
        let mut accepted = pending_request("r-1", "u-alice", "u-bob");
        accepted.status = FriendRequestStatus::Accepted;

        apply_accepted(&mut state, &accepted);
        apply_accepted(&mut state, &accepted);

        assert_eq!(state.friends.len(), 1);
    }
}
