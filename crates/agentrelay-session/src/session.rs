use agentrelay_core::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport-independent state of one conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque thread identifier; the registry key.
    pub thread_id: String,
    /// Messages exchanged so far, oldest first.
    pub messages: Vec<Message>,
    /// When the session was first referenced.
    pub created_at: DateTime<Utc>,
    /// Last lookup or update.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// A fresh session with no messages, both timestamps set to now.
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Number of stored messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// True when the session has been idle for longer than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.last_activity > max_age
    }
}
