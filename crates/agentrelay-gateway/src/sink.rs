use agentrelay_core::{EventSink, RelayError, RelayResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// [`EventSink`] backed by an unbounded channel whose receiver feeds an HTTP
/// response body.
///
/// Writes fail once the receiver is dropped (the client went away) or after
/// [`EventSink::close`], which drops the sender and ends the body stream.
pub struct ChannelSink {
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl ChannelSink {
    /// Create a sink and the receiver the transport reads payloads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Whether writes can no longer reach a receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.lock().as_ref().map_or(true, mpsc::UnboundedSender::is_closed)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn write(&self, payload: &str) -> RelayResult<()> {
        let guard = self.tx.lock();
        let tx = guard
            .as_ref()
            .ok_or_else(|| RelayError::Transport("sink closed".to_string()))?;
        tx.send(payload.to_string())
            .map_err(|_| RelayError::Transport("client disconnected".to_string()))
    }

    async fn close(&self) -> RelayResult<()> {
        self.tx.lock().take();
        Ok(())
    }
}
