use crate::session::Session;
use agentrelay_core::Message;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// In-memory map from thread id to [`Session`].
///
/// At most one session exists per thread id. Lookups through
/// [`SessionRegistry::get_or_create`] upsert silently; all other operations
/// are tolerant of missing sessions. Returned sessions are snapshots.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `thread_id`, refreshing its last activity, or
    /// create and store an empty one.
    pub fn get_or_create(&self, thread_id: &str) -> Session {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(thread_id) {
            session.touch();
            return session.clone();
        }

        let session = Session::new(thread_id);
        sessions.insert(thread_id.to_string(), session.clone());
        debug!(thread_id, "Session created");
        session
    }

    /// Replace the message list of an existing session.
    ///
    /// Updating a session that no longer exists (deleted or swept) is a
    /// silent no-op.
    pub fn update_messages(&self, thread_id: &str, messages: Vec<Message>) {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(thread_id) {
            Some(session) => {
                session.messages = messages;
                session.touch();
            }
            None => debug!(thread_id, "Ignoring message update for unknown session"),
        }
    }

    /// Snapshot of the thread's session without touching it.
    pub fn get(&self, thread_id: &str) -> Option<Session> {
        self.sessions.lock().get(thread_id).cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub fn delete(&self, thread_id: &str) -> bool {
        let existed = self.sessions.lock().remove(thread_id).is_some();
        if existed {
            debug!(thread_id, "Session deleted");
        }
        existed
    }

    /// Remove every session idle for longer than `max_age`. Returns the count.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        self.cleanup_expired(max_age).len()
    }

    /// Like [`SessionRegistry::cleanup`] but returns the removed thread ids.
    pub fn cleanup_expired(&self, max_age: Duration) -> Vec<String> {
        self.cleanup_expired_at(Utc::now(), max_age)
    }

    /// Sweep against an explicit reference time.
    pub fn cleanup_expired_at(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<String> {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        let mut sessions = self.sessions.lock();
        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.is_stale(now, max_age))
            .map(|s| s.thread_id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        drop(sessions);

        if !expired.is_empty() {
            info!(removed = expired.len(), "Cleaned up stale sessions");
        }
        expired
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no session is stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Ids of all live sessions, in no particular order.
    pub fn thread_ids(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }
}
