#![allow(dead_code)]

use agentrelay_core::{EventSink, RelayError, RelayResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sink that keeps every payload it accepts.
#[derive(Default)]
pub struct MemorySink {
    payloads: Mutex<Vec<String>>,
    closed: AtomicBool,
    broken: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following write fail, as if the client hung up.
    pub fn break_pipe(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn write(&self, payload: &str) -> RelayResult<()> {
        if self.broken.load(Ordering::SeqCst) || self.is_closed() {
            return Err(RelayError::Transport("broken pipe".into()));
        }
        self.payloads.lock().push(payload.to_string());
        Ok(())
    }

    async fn close(&self) -> RelayResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
