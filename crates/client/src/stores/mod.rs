//! Per-resource stores.
//!
//! Each store is a (state, operations) pair over one API resource with
//! a uniform contract: operations set `loading`/clear `error` on entry,
//! resolve failures to a sentinel plus an extracted error message, and
//! patch the local collection in place after mutations. Overlapping
//! calls to the same operation are not deduplicated; the last one to
//! complete wins.

use std::sync::{Arc, Mutex, PoisonError};

use crate::platform::TaskFn;

/// Change notification for stores whose state moves underneath the UI
/// (realtime reconciliation). The registered callback is replaced, not
/// stacked, so re-registration from a remounted view is cheap.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    inner: Arc<Mutex<Option<TaskFn>>>,
}

impl ChangeNotifier {
    pub fn set(&self, f: TaskFn) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(f);
    }

    /// Drop the registered callback. Used by views on unmount so a
    /// later notification cannot reach a dead scope.
    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn notify(&self) {
        let callback = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

pub mod admin;
pub mod cars;
pub mod collection;
pub mod comments;
pub mod conversations;
pub mod dealerships;
pub mod favourites;
pub mod friends;

pub use admin::AdminStore;
pub use cars::CarsStore;
pub use comments::CommentsStore;
pub use conversations::ConversationsStore;
pub use dealerships::DealershipsStore;
pub use favourites::FavouritesStore;
pub use friends::FriendsStore;
