//! Session store: token bundle persistence and impersonation.
//!
//! The session store exclusively owns the persisted session and the
//! impersonation snapshot. Everything else holds derived, in-memory
//! copies treated as caches invalidated by the `AuthStateChanged` /
//! `UserDataUpdated` broadcasts.

use chrono::{DateTime, Utc};
use motorbay_shared::{AuthResponse, RefreshRequest, UserProfile};
use serde::{Deserialize, Serialize};

use crate::api_client::ApiClient;
use crate::bus::{AppEvent, EventBus};
use crate::{config, storage};

/// The bundle identifying the current authenticated actor. Always
/// replaced as a unit; there is no refresh-in-place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            expires_at: auth.expires_at,
            refresh_token_expires_at: auth.refresh_token_expires_at,
            user: auth.user,
        }
    }
}

/// Persistent session storage plus change broadcasts.
#[derive(Clone)]
pub struct SessionStore {
    bus: EventBus,
    prefix: String,
}

impl SessionStore {
    pub fn new(bus: EventBus) -> Self {
        Self::with_prefix(bus, "motorbay")
    }

    /// A store reading/writing under a custom key prefix. The test
    /// suite uses this to keep tests isolated from each other.
    pub fn with_prefix(bus: EventBus, prefix: impl Into<String>) -> Self {
        Self { bus, prefix: prefix.into() }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    /// Persist a session, replacing any prior one, then broadcast
    /// `AuthStateChanged` and `UserDataUpdated`.
    pub fn store(&self, session: &Session) {
        storage::save(&self.key("access_token"), &session.access_token);
        storage::save(&self.key("refresh_token"), &session.refresh_token);
        storage::save(&self.key("expires_at"), &session.expires_at);
        storage::save(
            &self.key("refresh_expires_at"),
            &session.refresh_token_expires_at,
        );
        storage::save(&self.key("user"), &session.user);

        self.bus.emit(AppEvent::AuthStateChanged);
        self.bus.emit(AppEvent::UserDataUpdated);
    }

    /// The last stored session, if any. Does not validate expiry.
    pub fn read(&self) -> Option<Session> {
        Some(Session {
            access_token: storage::load(&self.key("access_token"))?,
            refresh_token: storage::load(&self.key("refresh_token"))?,
            expires_at: storage::load(&self.key("expires_at"))?,
            refresh_token_expires_at: storage::load(&self.key("refresh_expires_at"))?,
            user: storage::load(&self.key("user"))?,
        })
    }

    /// The current user's profile, when a session is stored.
    pub fn user(&self) -> Option<UserProfile> {
        storage::load(&self.key("user"))
    }

    /// True iff a token is stored and not yet expired. This is the sole
    /// gate before REST and hub calls; no server round-trip is made, so
    /// a revoked-but-unexpired token is only detected when a call fails.
    pub fn is_valid(&self) -> bool {
        let token: Option<String> = storage::load(&self.key("access_token"));
        let expires_at: Option<DateTime<Utc>> = storage::load(&self.key("expires_at"));
        match (token, expires_at) {
            (Some(token), Some(expires_at)) => !token.is_empty() && Utc::now() < expires_at,
            _ => false,
        }
    }

    /// The stored access token while it is still valid.
    pub fn access_token(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        storage::load(&self.key("access_token"))
    }

    /// Delete the session and any impersonation snapshot, then
    /// broadcast the same two events as [`store`]. Idempotent.
    pub fn clear(&self) {
        storage::remove(&self.key("access_token"));
        storage::remove(&self.key("refresh_token"));
        storage::remove(&self.key("expires_at"));
        storage::remove(&self.key("refresh_expires_at"));
        storage::remove(&self.key("user"));
        storage::remove(&self.key("admin_session"));

        self.bus.emit(AppEvent::AuthStateChanged);
        self.bus.emit(AppEvent::UserDataUpdated);
    }

    /// Save the admin's own session under the snapshot key, then make
    /// `target` the active session. If interrupted between the two
    /// steps the snapshot exists without an active impersonation;
    /// callers can detect that via [`is_impersonating`] and re-attempt.
    pub fn begin_impersonation(&self, admin: &Session, target: &Session) {
        storage::save(&self.key("admin_session"), admin);
        self.store(target);
    }

    /// Restore the admin session saved by [`begin_impersonation`].
    ///
    /// Returns `false` when no snapshot exists. On success the snapshot
    /// is deleted and `ImpersonationStopped` is broadcast in addition
    /// to the two [`store`] events.
    pub fn end_impersonation(&self) -> bool {
        let Some(admin) = storage::load::<Session>(&self.key("admin_session")) else {
            return false;
        };
        self.store(&admin);
        storage::remove(&self.key("admin_session"));
        self.bus.emit(AppEvent::ImpersonationStopped);
        true
    }

    /// Whether an admin snapshot is currently saved.
    pub fn is_impersonating(&self) -> bool {
        storage::exists(&self.key("admin_session"))
    }

    /// Exchange the refresh token for a fresh session. Like every
    /// other path, the session is replaced as a unit.
    ///
    /// Returns `false` when there is nothing to refresh with or the
    /// exchange fails; the stale session is left untouched in that
    /// case so the caller can fall back to an interactive sign-in.
    pub async fn refresh_session(&self) -> bool {
        let Some(current) = self.read() else {
            return false;
        };
        if current.refresh_token.is_empty() || Utc::now() >= current.refresh_token_expires_at {
            return false;
        }

        let client = ApiClient::new(config::api_base_url());
        let request = RefreshRequest {
            refresh_token: current.refresh_token.clone(),
        };
        match client.refresh(&request).await {
            Ok(auth) => {
                self.store(&auth.into());
                true
            }
            Err(e) => {
                crate::log_warn!("session refresh failed: {}", e);
                false
            }
        }
    }

    /// An API client for the current session. Token attachment happens
    /// here and nowhere else; an invalid or absent session yields an
    /// unauthenticated client.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(config::api_base_url()).with_bearer(self.access_token())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::platform::callback;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_store(prefix: &str) -> SessionStore {
        std::env::set_var("MOTORBAY_DATA_DIR", std::env::temp_dir().join("motorbay-tests"));
        let store = SessionStore::with_prefix(EventBus::new(), prefix);
        store.clear();
        store
    }

    fn sample_session(token: &str, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            access_token: token.to_string(),
            refresh_token: format!("{token}-refresh"),
            expires_at: now + expires_in,
            refresh_token_expires_at: now + Duration::days(7),
            user: UserProfile {
                id: "u-1".into(),
                email: "ada@motorbay.test".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                phone_number: None,
                avatar_url: None,
                roles: vec!["Admin".into()],
                created_at: now,
            },
        }
    }

    #[test]
    fn validity_requires_token_and_unexpired_timestamp() {
        let store = test_store("sess_validity");

        assert!(!store.is_valid(), "no session stored");

        store.store(&sample_session("tok", Duration::hours(1)));
        assert!(store.is_valid());

        store.store(&sample_session("tok", Duration::seconds(-1)));
        assert!(!store.is_valid(), "expired");

        // Expiry exactly now: `now < expires_at` has already gone false
        // by the time we check.
        store.store(&sample_session("tok", Duration::zero()));
        assert!(!store.is_valid());

        store.store(&sample_session("", Duration::hours(1)));
        assert!(!store.is_valid(), "empty token");
    }

    #[test]
    fn clear_then_read_yields_absent() {
        let store = test_store("sess_clear");

        store.store(&sample_session("tok", Duration::hours(1)));
        assert!(store.read().is_some());

        store.clear();
        assert!(store.read().is_none());
        assert!(!store.is_valid());

        // Idempotent.
        store.clear();
        assert!(store.read().is_none());
    }

    #[test]
    fn impersonation_round_trip_restores_admin_session() {
        let store = test_store("sess_impersonation");

        let admin = sample_session("admin-tok", Duration::hours(1));
        let target = sample_session("target-tok", Duration::hours(1));

        store.store(&admin);
        store.begin_impersonation(&admin, &target);

        assert!(store.is_impersonating());
        assert_eq!(store.read(), Some(target));

        assert!(store.end_impersonation());
        assert_eq!(store.read(), Some(admin));
        assert!(!store.is_impersonating());

        // No snapshot left: a second call fails.
        assert!(!store.end_impersonation());
    }

    #[test]
    fn store_broadcasts_auth_and_user_events() {
        let bus = EventBus::new();
        let auth_hits = Arc::new(AtomicUsize::new(0));
        let user_hits = Arc::new(AtomicUsize::new(0));

        let hits = auth_hits.clone();
        bus.subscribe(
            crate::bus::EventKind::AuthStateChanged,
            callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let hits = user_hits.clone();
        bus.subscribe(
            crate::bus::EventKind::UserDataUpdated,
            callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        );

        std::env::set_var("MOTORBAY_DATA_DIR", std::env::temp_dir().join("motorbay-tests"));
        let store = SessionStore::with_prefix(bus, "sess_events");
        store.store(&sample_session("tok", Duration::hours(1)));

        assert_eq!(auth_hits.load(Ordering::SeqCst), 1);
        assert_eq!(user_hits.load(Ordering::SeqCst), 1);
    }
}
