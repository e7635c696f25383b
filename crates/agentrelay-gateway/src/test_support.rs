//! In-memory sinks for unit tests.

use agentrelay_core::{EventSink, RelayError, RelayResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Records every payload; optionally starts failing after `n` writes.
#[derive(Default)]
pub(crate) struct RecordingSink {
    payloads: Mutex<Vec<String>>,
    closed: AtomicBool,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing_after(n: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_after: Some(n),
            ..Self::default()
        })
    }

    pub(crate) fn payloads(&self) -> Vec<String> {
        self.payloads.lock().clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn write(&self, payload: &str) -> RelayResult<()> {
        if self.is_closed() {
            return Err(RelayError::Transport("closed".into()));
        }
        let mut payloads = self.payloads.lock();
        if self.fail_after.is_some_and(|n| payloads.len() >= n) {
            return Err(RelayError::Transport("broken pipe".into()));
        }
        payloads.push(payload.to_string());
        Ok(())
    }

    async fn close(&self) -> RelayResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Rejects every write and every close.
#[derive(Default)]
pub(crate) struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn write(&self, _payload: &str) -> RelayResult<()> {
        Err(RelayError::Transport("broken pipe".into()))
    }

    async fn close(&self) -> RelayResult<()> {
        Err(RelayError::Transport("already gone".into()))
    }
}

/// A write that never completes, like a client that stopped reading.
#[derive(Default)]
pub(crate) struct StalledSink {
    closed: AtomicBool,
}

impl StalledSink {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for StalledSink {
    async fn write(&self, _payload: &str) -> RelayResult<()> {
        std::future::pending().await
    }

    async fn close(&self) -> RelayResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Each write waits for [`GatedSink::release`], then fails.
#[derive(Default)]
pub(crate) struct GatedSink {
    gate: Notify,
}

impl GatedSink {
    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl EventSink for GatedSink {
    async fn write(&self, _payload: &str) -> RelayResult<()> {
        self.gate.notified().await;
        Err(RelayError::Transport("broken pipe".into()))
    }

    async fn close(&self) -> RelayResult<()> {
        Ok(())
    }
}
