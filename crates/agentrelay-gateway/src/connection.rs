use agentrelay_core::{AgentEvent, EventEncoder, EventSink, SseEncoder};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The live delivery channel attached to one thread.
#[derive(Clone)]
pub struct Connection {
    /// Unique per registration, so a replaced channel can be told apart in logs.
    pub id: Uuid,
    /// Thread this channel serves.
    pub thread_id: String,
    /// Transport-owned destination for encoded payloads.
    pub sink: Arc<dyn EventSink>,
    /// When the channel was registered.
    pub connected_at: DateTime<Utc>,
    /// Last successful write, or registration time.
    pub last_activity: DateTime<Utc>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("thread_id", &self.thread_id)
            .field("connected_at", &self.connected_at)
            .field("last_activity", &self.last_activity)
            .finish_non_exhaustive()
    }
}

/// Owns the live client channels, at most one per thread, and writes
/// encoded events onto them.
///
/// A write failure marks the channel dead: it is unregistered and the send
/// reports `false`, leaving re-queueing to the caller.
pub struct ConnectionHub {
    connections: RwLock<HashMap<String, Connection>>,
    encoder: Arc<dyn EventEncoder>,
}

impl ConnectionHub {
    /// Create a hub that encodes events with `encoder`.
    pub fn new(encoder: Arc<dyn EventEncoder>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            encoder,
        }
    }

    /// The encoder applied to every outbound event.
    pub fn encoder(&self) -> &Arc<dyn EventEncoder> {
        &self.encoder
    }

    /// Make `sink` the active channel for the thread. A previous channel for
    /// the same thread is replaced, not closed.
    pub async fn register(&self, thread_id: &str, sink: Arc<dyn EventSink>) -> Uuid {
        let now = Utc::now();
        let conn = Connection {
            id: Uuid::new_v4(),
            thread_id: thread_id.to_string(),
            sink,
            connected_at: now,
            last_activity: now,
        };
        let id = conn.id;
        let replaced = self
            .connections
            .write()
            .await
            .insert(thread_id.to_string(), conn);

        match replaced {
            Some(old) => info!(
                thread_id,
                connection_id = %id,
                replaced = %old.id,
                "Connection replaced"
            ),
            None => info!(thread_id, connection_id = %id, "Connection added"),
        }
        id
    }

    /// Remove the thread's channel if present. Returns whether one existed.
    pub async fn unregister(&self, thread_id: &str) -> bool {
        self.take(thread_id).await.is_some()
    }

    /// Remove and return the thread's channel, leaving the sink open.
    pub async fn take(&self, thread_id: &str) -> Option<Connection> {
        let removed = self.connections.write().await.remove(thread_id);
        if let Some(conn) = &removed {
            info!(thread_id, connection_id = %conn.id, "Connection removed");
        }
        removed
    }

    /// Whether the thread currently has a live channel.
    pub async fn has_connection(&self, thread_id: &str) -> bool {
        self.connections.read().await.contains_key(thread_id)
    }

    /// Encode and write one event to the thread's channel.
    ///
    /// Returns `false` without side effects when no channel is registered,
    /// and `false` after unregistering the channel when the write fails.
    /// The channel map is not locked while the sink writes, so a slow sink
    /// only delays its own thread.
    pub async fn send_event(&self, thread_id: &str, event: &AgentEvent) -> bool {
        let Some((id, sink)) = self
            .connections
            .read()
            .await
            .get(thread_id)
            .map(|c| (c.id, c.sink.clone()))
        else {
            return false;
        };

        let payload = match self.encoder.encode(event) {
            Ok(p) => p,
            Err(e) => {
                warn!(thread_id, kind = event.kind(), error = %e, "Failed to encode event");
                return false;
            }
        };

        match sink.write(&payload).await {
            Ok(()) => {
                if let Some(conn) = self.connections.write().await.get_mut(thread_id) {
                    if conn.id == id {
                        conn.last_activity = Utc::now();
                    }
                }
                debug!(thread_id, kind = event.kind(), "Event delivered");
                true
            }
            Err(e) => {
                warn!(
                    thread_id,
                    connection_id = %id,
                    kind = event.kind(),
                    error = %e,
                    "Write failed, dropping connection"
                );
                self.remove_if_current(thread_id, id).await;
                false
            }
        }
    }

    /// Remove the thread's channel only if it is still registration `id`;
    /// a channel registered meanwhile stays.
    async fn remove_if_current(&self, thread_id: &str, id: Uuid) {
        let mut conns = self.connections.write().await;
        if conns.get(thread_id).is_some_and(|c| c.id == id) {
            conns.remove(thread_id);
        }
    }

    /// Send events in order, one [`ConnectionHub::send_event`] each.
    /// Returns how many were delivered.
    pub async fn send_events(&self, thread_id: &str, events: &[AgentEvent]) -> usize {
        let mut delivered = 0;
        for event in events {
            if self.send_event(thread_id, event).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Close and remove every channel idle for longer than `max_age`.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        self.cleanup_at(Utc::now(), max_age).await
    }

    /// Sweep against an explicit reference time.
    ///
    /// Close errors are logged and ignored; the sweep always completes.
    pub async fn cleanup_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        let stale: Vec<Connection> = {
            let mut conns = self.connections.write().await;
            let ids: Vec<String> = conns
                .values()
                .filter(|c| now - c.last_activity > max_age)
                .map(|c| c.thread_id.clone())
                .collect();
            ids.iter().filter_map(|id| conns.remove(id)).collect()
        };

        for conn in &stale {
            if let Err(e) = conn.sink.close().await {
                warn!(
                    thread_id = %conn.thread_id,
                    connection_id = %conn.id,
                    error = %e,
                    "Error closing stale connection"
                );
            }
        }

        if !stale.is_empty() {
            info!(removed = stale.len(), "Cleaned up stale connections");
        }
        stale.len()
    }

    /// Number of registered channels.
    pub async fn size(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Threads with a live channel, in no particular order.
    pub async fn thread_ids(&self) -> Vec<String> {
        self.connections.read().await.keys().cloned().collect()
    }

    /// Snapshot of the thread's channel, if any.
    pub async fn get_connection(&self, thread_id: &str) -> Option<Connection> {
        self.connections.read().await.get(thread_id).cloned()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(Arc::new(SseEncoder))
    }
}
