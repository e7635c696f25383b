use crate::error::RelayResult;
use async_trait::async_trait;

/// A client-facing delivery channel that accepts encoded event payloads.
///
/// Sinks are created and owned by the transport layer; the relay only holds
/// them. Any error from [`EventSink::write`] means the channel is dead.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append one payload to the stream.
    async fn write(&self, payload: &str) -> RelayResult<()>;

    /// Close the underlying stream. Closing twice is allowed.
    async fn close(&self) -> RelayResult<()>;
}
