//! Dealership management: the owned dealership, its workers and the
//! analytics panel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motorbay_shared::{
    AddWorkerRequest, ApiError, CreateDealershipRequest, Dealership, DealershipStats,
    DealershipWorker, UpdateDealershipRequest,
};

use super::collection::{insert_head, remove_by_key};
use crate::session::SessionStore;

#[derive(Default)]
pub struct DealershipState {
    pub loading: bool,
    pub error: Option<String>,
    pub dealership: Option<Dealership>,
    pub workers: Vec<DealershipWorker>,
    pub stats: Option<DealershipStats>,
}

#[derive(Clone)]
pub struct DealershipsStore {
    session: SessionStore,
    inner: Arc<Mutex<DealershipState>>,
}

impl DealershipsStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(DealershipState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DealershipState> {
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

    pub fn dealership(&self) -> Option<Dealership> {
        self.lock().dealership.clone()
    }

    pub fn workers(&self) -> Vec<DealershipWorker> {
        self.lock().workers.clone()
    }

    pub fn stats(&self) -> Option<DealershipStats> {
        self.lock().stats.clone()
    }

    /// Load the caller's dealership plus its workers and stats. Not
    /// owning one is a normal outcome, not an error.
    pub async fn refresh(&self) -> bool {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        let client = self.session.client();
        let dealership = match client.my_dealership().await {
            Ok(dealership) => Some(dealership),
            Err(ApiError::Http { status: 404, .. }) => None,
            Err(e) => {
                self.fail(&e);
                return false;
            }
        };

        let (workers, stats) = match &dealership {
            Some(dealership) => {
                let workers = client.list_workers(&dealership.id).await;
                let stats = client.dealership_stats(&dealership.id).await;
                match (workers, stats) {
                    (Ok(workers), Ok(stats)) => (workers, Some(stats)),
                    (Err(e), _) | (_, Err(e)) => {
                        self.fail(&e);
                        return false;
                    }
                }
            }
            None => (Vec::new(), None),
        };

        let mut state = self.lock();
        state.dealership = dealership;
        state.workers = workers;
        state.stats = stats;
        state.loading = false;
        true
    }

    pub async fn create(&self, req: &CreateDealershipRequest) -> Option<Dealership> {
        self.begin();
        match self.session.client().create_dealership(req).await {
            Ok(dealership) => {
                let mut state = self.lock();
                state.dealership = Some(dealership.clone());
                state.loading = false;
                Some(dealership)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn update(&self, req: &UpdateDealershipRequest) -> Option<Dealership> {
        let Some(id) = self.lock().dealership.as_ref().map(|d| d.id.clone()) else {
            return None;
        };
        self.begin();
        match self.session.client().update_dealership(&id, req).await {
            Ok(dealership) => {
                let mut state = self.lock();
                state.dealership = Some(dealership.clone());
                state.loading = false;
                Some(dealership)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn add_worker(&self, user_id: &str, role: &str) -> Option<DealershipWorker> {
        let Some(id) = self.lock().dealership.as_ref().map(|d| d.id.clone()) else {
            return None;
        };
        self.begin();
        let req = AddWorkerRequest {
            user_id: user_id.to_string(),
            role: role.to_string(),
        };
        match self.session.client().add_worker(&id, &req).await {
            Ok(worker) => {
                let mut state = self.lock();
                insert_head(&mut state.workers, worker.clone());
                state.loading = false;
                Some(worker)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn remove_worker(&self, user_id: &str) -> bool {
        let Some(id) = self.lock().dealership.as_ref().map(|d| d.id.clone()) else {
            return false;
        };
        self.begin();
        match self.session.client().remove_worker(&id, user_id).await {
            Ok(()) => {
                let mut state = self.lock();
                remove_by_key(&mut state.workers, user_id);
                state.loading = false;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn begin(&self) {
        let mut state = self.lock();
        state.loading = true;
        state.error = None;
    }

    fn fail(&self, err: &ApiError) {
        crate::log_warn!("dealerships: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        state.error = Some(err.user_message());
    }
}
