use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::ConversationState;

/// Per-user conversation state, keyed by the transport's user identifier.
/// Process-local only: a restart drops all sessions, and users are simply
/// re-prompted from the menu.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, ConversationState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's state, defaulting to the menu on first contact.
    pub fn get(&self, user_id: &str) -> ConversationState {
        self.inner
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&self, user_id: &str, state: ConversationState) {
        self.inner.lock().unwrap().insert(user_id.to_string(), state);
    }

    /// Idempotent; clearing an absent user is a no-op.
    pub fn clear(&self, user_id: &str) {
        self.inner.lock().unwrap().remove(user_id);
    }
}
