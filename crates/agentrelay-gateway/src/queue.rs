use agentrelay_core::AgentEvent;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Per-thread buffer of events produced while no client is attached.
///
/// Each queue is bounded by `max_queue_size`; when full, the oldest event is
/// evicted so the newest ones survive. Queues are created on first enqueue
/// and removed when drained.
#[derive(Debug)]
pub struct PendingEventQueue {
    max_queue_size: usize,
    queues: Mutex<HashMap<String, VecDeque<AgentEvent>>>,
}

impl PendingEventQueue {
    /// Create a queue set holding at most `max_queue_size` events per thread.
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            max_queue_size,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Per-thread capacity.
    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Append an event, evicting the oldest one first if the queue is full.
    pub fn enqueue(&self, thread_id: &str, event: AgentEvent) {
        if self.max_queue_size == 0 {
            warn!(thread_id, kind = event.kind(), "Queue capacity is zero, event dropped");
            return;
        }

        let mut queues = self.queues.lock();
        let queue = queues.entry(thread_id.to_string()).or_default();
        while queue.len() >= self.max_queue_size {
            if let Some(dropped) = queue.pop_front() {
                warn!(
                    thread_id,
                    dropped = dropped.kind(),
                    max_queue_size = self.max_queue_size,
                    "Pending queue full, dropped oldest event"
                );
            }
        }
        queue.push_back(event);
        debug!(thread_id, queued = queue.len(), "Event queued");
    }

    /// Atomically take every queued event for the thread, oldest first.
    ///
    /// This is the only read path meant for delivery.
    pub fn dequeue_all(&self, thread_id: &str) -> Vec<AgentEvent> {
        self.queues
            .lock()
            .remove(thread_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Copy of the queued events without removing them. Diagnostics only:
    /// delivering from a peek would duplicate events on the next drain.
    pub fn peek(&self, thread_id: &str) -> Vec<AgentEvent> {
        self.queues
            .lock()
            .get(thread_id)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Discard the thread's backlog.
    pub fn clear(&self, thread_id: &str) {
        self.queues.lock().remove(thread_id);
    }

    /// Discard every backlog.
    pub fn clear_all(&self) {
        self.queues.lock().clear();
    }

    /// Number of events queued for the thread.
    pub fn size(&self, thread_id: &str) -> usize {
        self.queues.lock().get(thread_id).map_or(0, VecDeque::len)
    }

    /// Number of threads with queued events.
    pub fn thread_count(&self) -> usize {
        self.queues.lock().len()
    }
}

impl Default for PendingEventQueue {
    fn default() -> Self {
        Self::new(100)
    }
}
