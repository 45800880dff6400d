//! Car listing search and seller mutations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motorbay_shared::{
    ApiError, CarListing, CarSearchQuery, CreateCarRequest, PageInfo, UpdateCarRequest,
};

use super::collection::{insert_head, remove_by_key, replace_by_key};
use crate::session::SessionStore;

#[derive(Default)]
pub struct CarsState {
    pub loading: bool,
    pub error: Option<String>,
    pub query: CarSearchQuery,
    pub results: Vec<CarListing>,
    pub page: PageInfo,
    pub selected: Option<CarListing>,
}

#[derive(Clone)]
pub struct CarsStore {
    session: SessionStore,
    inner: Arc<Mutex<CarsState>>,
}

impl CarsStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(CarsState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CarsState> {
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

    pub fn results(&self) -> Vec<CarListing> {
        self.lock().results.clone()
    }

    pub fn page(&self) -> PageInfo {
        self.lock().page.clone()
    }

    pub fn query(&self) -> CarSearchQuery {
        self.lock().query.clone()
    }

    pub fn selected(&self) -> Option<CarListing> {
        self.lock().selected.clone()
    }

    pub async fn search(&self, query: CarSearchQuery) -> bool {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            state.query = query.clone();
        }
        match self.session.client().search_cars(&query).await {
            Ok(page) => {
                let mut state = self.lock();
                state.results = page.items;
                state.page = page.page;
                state.loading = false;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    pub async fn load(&self, id: &str) -> Option<CarListing> {
        self.begin();
        match self.session.client().get_car(id).await {
            Ok(car) => {
                let mut state = self.lock();
                state.selected = Some(car.clone());
                state.loading = false;
                Some(car)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn create(&self, req: &CreateCarRequest) -> Option<CarListing> {
        self.begin();
        match self.session.client().create_car(req).await {
            Ok(car) => {
                let mut state = self.lock();
                insert_head(&mut state.results, car.clone());
                state.loading = false;
                Some(car)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn update(&self, id: &str, req: &UpdateCarRequest) -> Option<CarListing> {
        self.begin();
        match self.session.client().update_car(id, req).await {
            Ok(car) => {
                let mut state = self.lock();
                replace_by_key(&mut state.results, car.clone());
                if state.selected.as_ref().is_some_and(|c| c.id == id) {
                    state.selected = Some(car.clone());
                }
                state.loading = false;
                Some(car)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.begin();
        match self.session.client().delete_car(id).await {
            Ok(()) => {
                let mut state = self.lock();
                remove_by_key(&mut state.results, id);
                if state.selected.as_ref().is_some_and(|c| c.id == id) {
                    state.selected = None;
                }
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
        crate::log_warn!("cars: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        state.error = Some(err.user_message());
    }
}
