//! Comments and ratings for one car listing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motorbay_shared::{ApiError, Comment, CreateCommentRequest};

use super::collection::{insert_head, remove_by_key};
use crate::session::SessionStore;

#[derive(Default)]
pub struct CommentsState {
    pub loading: bool,
    pub error: Option<String>,
    pub car_id: Option<String>,
    pub comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct CommentsStore {
    session: SessionStore,
    inner: Arc<Mutex<CommentsState>>,
}

impl CommentsStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(CommentsState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CommentsState> {
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

    pub fn comments(&self) -> Vec<Comment> {
        self.lock().comments.clone()
    }

    pub async fn load(&self, car_id: &str) -> bool {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            state.car_id = Some(car_id.to_string());
        }
        match self.session.client().list_comments(car_id).await {
            Ok(comments) => {
                let mut state = self.lock();
                state.comments = comments;
                state.loading = false;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    pub async fn add(&self, car_id: &str, req: &CreateCommentRequest) -> Option<Comment> {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        match self.session.client().add_comment(car_id, req).await {
            Ok(comment) => {
                let mut state = self.lock();
                insert_head(&mut state.comments, comment.clone());
                state.loading = false;
                Some(comment)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        match self.session.client().delete_comment(id).await {
            Ok(()) => {
                let mut state = self.lock();
                remove_by_key(&mut state.comments, id);
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn fail(&self, err: &ApiError) {
        crate::log_warn!("comments: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        state.error = Some(err.user_message());
    }
}
