//! Admin tooling: user listing and impersonation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motorbay_shared::{ApiError, PageInfo, UserProfile};

use crate::session::SessionStore;

#[derive(Default)]
pub struct AdminState {
    pub loading: bool,
    pub error: Option<String>,
    pub users: Vec<UserProfile>,
    pub page: PageInfo,
}

#[derive(Clone)]
pub struct AdminStore {
    session: SessionStore,
    inner: Arc<Mutex<AdminState>>,
}

impl AdminStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(AdminState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AdminState> {
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
    }

    pub fn users(&self) -> Vec<UserProfile> {
        self.lock().users.clone()
    }

    pub fn page(&self) -> PageInfo {
        self.lock().page.clone()
    }

    pub async fn load_users(&self, page: u32, page_size: u32) -> bool {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        match self.session.client().admin_list_users(page, page_size).await {
            Ok(result) => {
                let mut state = self.lock();
                state.users = result.items;
                state.page = result.page;
                state.loading = false;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Start acting as `user_id`. The admin's own session is snapshotted
    /// by the session store so it can be restored afterwards.
    pub async fn impersonate(&self, user_id: &str) -> bool {
        let Some(current) = self.session.read() else {
            self.lock().error = Some("Please sign in to continue.".to_string());
            return false;
        };
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        match self.session.client().admin_impersonate(user_id).await {
            Ok(auth) => {
                self.lock().loading = false;
                self.session.begin_impersonation(&current, &auth.into());
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Restore the admin's own session. False when not impersonating.
    pub fn stop_impersonation(&self) -> bool {
        self.session.end_impersonation()
    }

    fn fail(&self, err: &ApiError) {
        crate::log_warn!("admin: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        state.error = Some(err.user_message());
    }
}
