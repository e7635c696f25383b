use crate::config::DeliveryConfig;
use crate::connection::{Connection, ConnectionHub};
use crate::queue::PendingEventQueue;
use agentrelay_core::{AgentEvent, EventEncoder, EventSink, Message, SseEncoder};
use agentrelay_session::{Session, SessionRegistry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of routing a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Written to the thread's live channel.
    Delivered,
    /// Buffered until a client attaches.
    Queued,
    /// Could not be encoded; neither sent nor kept.
    Dropped,
}

/// Per-batch delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Events written to a live channel.
    pub delivered: usize,
    /// Events left in the pending queue.
    pub queued: usize,
    /// Events discarded because they could not be encoded.
    pub dropped: usize,
}

impl DispatchReport {
    fn record(&mut self, outcome: Delivery) {
        match outcome {
            Delivery::Delivered => self.delivered += 1,
            Delivery::Queued => self.queued += 1,
            Delivery::Dropped => self.dropped += 1,
        }
    }
}

/// What one staleness sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired sessions removed from the registry.
    pub sessions: usize,
    /// Channels closed, whether idle or owned by an expired session.
    pub connections: usize,
    /// Non-empty backlogs discarded with their session.
    pub queues: usize,
}

/// Routes agent events to a thread's live channel or its pending queue.
///
/// The router is the only writer that decides between sending and queueing,
/// and it serializes those decisions so that a backlog flushed on attach is
/// always written before any event produced afterwards.
pub struct EventRouter {
    config: DeliveryConfig,
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionHub>,
    pending: Arc<PendingEventQueue>,
    delivery: Mutex<()>,
}

impl EventRouter {
    /// Build a router with fresh components and SSE framing.
    pub fn new(config: DeliveryConfig) -> Self {
        Self::with_encoder(config, Arc::new(SseEncoder))
    }

    /// Build a router with fresh components and a custom encoder.
    pub fn with_encoder(config: DeliveryConfig, encoder: Arc<dyn EventEncoder>) -> Self {
        let pending = Arc::new(PendingEventQueue::new(config.max_queue_size));
        Self::with_components(
            config,
            Arc::new(SessionRegistry::new()),
            Arc::new(ConnectionHub::new(encoder)),
            pending,
        )
    }

    /// Build a router over existing components.
    pub fn with_components(
        config: DeliveryConfig,
        sessions: Arc<SessionRegistry>,
        connections: Arc<ConnectionHub>,
        pending: Arc<PendingEventQueue>,
    ) -> Self {
        Self {
            config,
            sessions,
            connections,
            pending,
            delivery: Mutex::new(()),
        }
    }

    /// Delivery limits this router was built with.
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// The session registry.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The live channel hub.
    pub fn connections(&self) -> &Arc<ConnectionHub> {
        &self.connections
    }

    /// The per-thread backlog.
    pub fn pending(&self) -> &Arc<PendingEventQueue> {
        &self.pending
    }

    /// Route one event for `thread_id`, creating the session if needed.
    pub async fn dispatch(&self, thread_id: &str, event: AgentEvent) -> Delivery {
        let _guard = self.delivery.lock().await;
        self.sessions.get_or_create(thread_id);
        self.deliver_locked(thread_id, event).await
    }

    /// Route a batch in order.
    pub async fn dispatch_all(&self, thread_id: &str, events: Vec<AgentEvent>) -> DispatchReport {
        let _guard = self.delivery.lock().await;
        self.sessions.get_or_create(thread_id);

        let mut report = DispatchReport::default();
        for event in events {
            report.record(self.deliver_locked(thread_id, event).await);
        }
        debug!(
            thread_id,
            delivered = report.delivered,
            queued = report.queued,
            dropped = report.dropped,
            "Batch dispatched"
        );
        report
    }

    /// Attach a client channel and flush the thread's backlog onto it.
    ///
    /// Returns how many queued events were written. Events that could not be
    /// written stay queued in their original order.
    pub async fn attach(&self, thread_id: &str, sink: Arc<dyn EventSink>) -> usize {
        let _guard = self.delivery.lock().await;
        self.sessions.get_or_create(thread_id);
        let connection_id = self.connections.register(thread_id, sink).await;
        let flushed = self.flush_locked(thread_id).await;
        info!(thread_id, connection_id = %connection_id, flushed, "Client attached");
        flushed
    }

    /// Drop the thread's channel without touching its session or backlog.
    pub async fn detach(&self, thread_id: &str) -> bool {
        let _guard = self.delivery.lock().await;
        self.connections.unregister(thread_id).await
    }

    /// Remove everything known about a thread and close its channel.
    /// Returns whether a session existed.
    pub async fn forget(&self, thread_id: &str) -> bool {
        let _guard = self.delivery.lock().await;
        let existed = self.sessions.delete(thread_id);
        self.pending.clear(thread_id);
        if let Some(conn) = self.connections.take(thread_id).await {
            close_quietly(&conn).await;
        }
        existed
    }

    /// Replace the thread's message history. No-op for unknown threads.
    pub fn update_messages(&self, thread_id: &str, messages: Vec<Message>) {
        self.sessions.update_messages(thread_id, messages);
    }

    /// Snapshot of the thread's session, if any.
    pub fn session(&self, thread_id: &str) -> Option<Session> {
        self.sessions.get(thread_id)
    }

    /// Reclaim stale sessions, stale connections, and the backlog of every
    /// reclaimed session.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep against an explicit reference time.
    ///
    /// Does not wait for in-flight deliveries, so a channel whose writes hang
    /// is still reclaimed once it goes idle.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport {
            connections: self
                .connections
                .cleanup_at(now, self.config.connection_max_age())
                .await,
            ..SweepReport::default()
        };

        let expired = self
            .sessions
            .cleanup_expired_at(now, self.config.session_max_age());
        report.sessions = expired.len();
        for thread_id in &expired {
            if self.pending.size(thread_id) > 0 {
                report.queues += 1;
            }
            self.pending.clear(thread_id);
            if let Some(conn) = self.connections.take(thread_id).await {
                close_quietly(&conn).await;
                report.connections += 1;
            }
        }

        if report != SweepReport::default() {
            info!(
                sessions = report.sessions,
                connections = report.connections,
                queues = report.queues,
                "Sweep reclaimed resources"
            );
        }
        report
    }

    async fn deliver_locked(&self, thread_id: &str, event: AgentEvent) -> Delivery {
        // A backlog must drain before anything newer goes out.
        if self.pending.size(thread_id) > 0 {
            self.flush_locked(thread_id).await;
            if self.pending.size(thread_id) > 0 {
                self.pending.enqueue(thread_id, event);
                return Delivery::Queued;
            }
        }

        if self.connections.send_event(thread_id, &event).await {
            return Delivery::Delivered;
        }
        if self.connections.has_connection(thread_id).await {
            // Channel still alive, so the event itself failed to encode.
            warn!(thread_id, kind = event.kind(), "Dropping undeliverable event");
            return Delivery::Dropped;
        }
        self.pending.enqueue(thread_id, event);
        Delivery::Queued
    }

    async fn flush_locked(&self, thread_id: &str) -> usize {
        if !self.connections.has_connection(thread_id).await {
            return 0;
        }

        let mut backlog = self.pending.dequeue_all(thread_id).into_iter();
        let mut flushed = 0;
        while let Some(event) = backlog.next() {
            if self.connections.send_event(thread_id, &event).await {
                flushed += 1;
                continue;
            }
            if self.connections.has_connection(thread_id).await {
                warn!(thread_id, kind = event.kind(), "Dropping undeliverable event");
                continue;
            }
            // Channel died mid-flush; keep the rest for the next client.
            self.pending.enqueue(thread_id, event);
            for rest in backlog {
                self.pending.enqueue(thread_id, rest);
            }
            break;
        }
        flushed
    }
}

async fn close_quietly(conn: &Connection) {
    if let Err(e) = conn.sink.close().await {
        warn!(
            thread_id = %conn.thread_id,
            connection_id = %conn.id,
            error = %e,
            "Error closing connection"
        );
    }
}
