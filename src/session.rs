use crate::models;
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-user model selection, keyed by Telegram user id, in memory only.
///
/// Handlers for different chats run concurrently, so the map sits behind a
/// mutex. A user racing their own selection is last-write-wins, which is fine
/// for a single chat client. Sessions live for the process lifetime; there is
/// no expiry and no capacity bound.
pub struct SessionStore {
    selections: Mutex<HashMap<i64, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            selections: Mutex::new(HashMap::new()),
        }
    }

    /// The user's selected backend id, or the catalog default when the user
    /// has never picked one. Never fails: a poisoned lock still yields the
    /// map, since a selection write cannot leave it in a partial state.
    pub fn selection(&self, user_id: i64) -> String {
        self.selections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| models::default_entry().backend_id.to_string())
    }

    /// Record a selection by catalog label. Unknown labels are ignored:
    /// labels only ever come from the catalog-driven menu, so this path is
    /// defensive rather than load-bearing.
    pub fn select(&self, user_id: i64, label: &str) {
        if let Some(entry) = models::resolve(label) {
            self.selections
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(user_id, entry.backend_id.to_string());
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unselected_user_gets_default() {
        let store = SessionStore::new();
        assert_eq!(
            store.selection(42),
            models::default_entry().backend_id.to_string()
        );
    }

    #[test]
    fn selection_sticks_until_overwritten() {
        let store = SessionStore::new();
        store.select(42, "Meta Llama Vision Free");
        assert_eq!(store.selection(42), "meta-llama/Llama-Vision-Free");
        assert_eq!(store.selection(42), "meta-llama/Llama-Vision-Free");

        store.select(42, "FLUX.1 Schnell Free");
        assert_eq!(store.selection(42), models::IMAGE_MODEL);
    }

    #[test]
    fn unknown_label_is_a_no_op() {
        let store = SessionStore::new();
        store.select(42, "Meta Llama Vision Free");
        store.select(42, "Nonexistent Model");
        assert_eq!(store.selection(42), "meta-llama/Llama-Vision-Free");
    }

    #[test]
    fn survives_a_poisoned_lock() {
        use std::sync::Arc;

        let store = Arc::new(SessionStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.selections.lock().unwrap();
            panic!("poison the session lock");
        })
        .join();

        store.select(1, "Meta Llama Vision Free");
        assert_eq!(store.selection(1), "meta-llama/Llama-Vision-Free");
        assert_eq!(
            store.selection(2),
            models::default_entry().backend_id.to_string()
        );
    }

    #[test]
    fn selections_are_per_user() {
        let store = SessionStore::new();
        store.select(1, "Meta Llama 3.3 70B Instruct Turbo Free");
        assert_eq!(
            store.selection(2),
            models::default_entry().backend_id.to_string()
        );
    }
}
