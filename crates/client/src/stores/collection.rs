//! In-place list patching shared by the resource stores.
//!
//! Every local collection is a best-effort mirror of server state,
//! patched after a mutation and fully reconciled only on the next
//! snapshot fetch. Items are identified by primary key; an item already
//! present by key is never re-inserted.

use motorbay_shared::{
    CarListing, ChatMessage, Comment, ConversationSummary, DealershipWorker, Friend,
    FriendRequest, UserProfile,
};

/// Primary-key access for patchable collections.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for CarListing {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Comment {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for FriendRequest {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Friend {
    fn key(&self) -> &str {
        &self.user_id
    }
}

impl Keyed for ChatMessage {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for UserProfile {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for DealershipWorker {
    fn key(&self) -> &str {
        &self.user.id
    }
}

impl Keyed for ConversationSummary {
    fn key(&self) -> &str {
        &self.user.id
    }
}

/// Insert at the head, or replace in place when the key already
/// exists. Returns true when the item was actually inserted.
pub fn insert_head<T: Keyed>(items: &mut Vec<T>, item: T) -> bool {
    if let Some(existing) = items.iter_mut().find(|i| i.key() == item.key()) {
        *existing = item;
        return false;
    }
    items.insert(0, item);
    true
}

/// Replace the item with the same key. Returns false when absent.
pub fn replace_by_key<T: Keyed>(items: &mut Vec<T>, item: T) -> bool {
    match items.iter_mut().find(|i| i.key() == item.key()) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

/// Remove every item with the given key. Returns true when anything
/// was removed.
pub fn remove_by_key<T: Keyed>(items: &mut Vec<T>, key: &str) -> bool {
    let before = items.len();
    items.retain(|i| i.key() != key);
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use motorbay_shared::UserSummary;

    fn friend(user_id: &str) -> Friend {
        Friend {
            user_id: user_id.to_string(),
            user: UserSummary {
                id: user_id.to_string(),
                first_name: "Test".into(),
                last_name: "User".into(),
                avatar_url: None,
            },
            friends_since: Utc::now(),
        }
    }

    #[test]
    fn insert_head_deduplicates_by_key() {
        let mut items = vec![friend("a"), friend("b")];

        assert!(insert_head(&mut items, friend("c")));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].user_id, "c");

        // Same key again: replaced in place, not re-inserted.
        assert!(!insert_head(&mut items, friend("b")));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn replace_requires_presence() {
        let mut items = vec![friend("a")];
        assert!(replace_by_key(&mut items, friend("a")));
        assert!(!replace_by_key(&mut items, friend("x")));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn remove_by_key_filters_and_reports() {
        let mut items = vec![friend("a"), friend("b")];
        assert!(remove_by_key(&mut items, "a"));
        assert!(!remove_by_key(&mut items, "a"));
        assert_eq!(items.len(), 1);
    }
}
