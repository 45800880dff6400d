//! Favourited listings with optimistic membership toggling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motorbay_shared::{ApiError, CarListing};

use super::collection::{insert_head, remove_by_key};
use crate::session::SessionStore;

#[derive(Default)]
pub struct FavouritesState {
    pub loading: bool,
    pub error: Option<String>,
    pub cars: Vec<CarListing>,
}

#[derive(Clone)]
pub struct FavouritesStore {
    session: SessionStore,
    inner: Arc<Mutex<FavouritesState>>,
}

impl FavouritesStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Arc::new(Mutex::new(FavouritesState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FavouritesState> {
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

    pub fn cars(&self) -> Vec<CarListing> {
        self.lock().cars.clone()
    }

    pub fn contains(&self, car_id: &str) -> bool {
        self.lock().cars.iter().any(|c| c.id == car_id)
    }

    pub async fn refresh(&self) -> bool {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        match self.session.client().list_favourites().await {
            Ok(cars) => {
                let mut state = self.lock();
                state.cars = cars;
                state.loading = false;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Add `car` to the favourites; the listing itself is kept so the
    /// favourites page can render without another fetch.
    pub async fn add(&self, car: &CarListing) -> bool {
        match self.session.client().add_favourite(&car.id).await {
            Ok(_) => {
                let mut state = self.lock();
                insert_head(&mut state.cars, car.clone());
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    pub async fn remove(&self, car_id: &str) -> bool {
        match self.session.client().remove_favourite(car_id).await {
            Ok(()) => {
                let mut state = self.lock();
                remove_by_key(&mut state.cars, car_id);
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn fail(&self, err: &ApiError) {
        crate::log_warn!("favourites: request failed: {}", err);
        let mut state = self.lock();
        state.loading = false;
        state.error = Some(err.user_message());
    }
}
