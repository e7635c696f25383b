use crate::error::RelayResult;
use crate::event::AgentEvent;

/// Turns an [`AgentEvent`] into the payload written to a client sink.
///
/// Framing belongs to the encoder; sinks and the connection hub pass the
/// payload through untouched.
pub trait EventEncoder: Send + Sync {
    /// Encode one event into one self-contained payload.
    fn encode(&self, event: &AgentEvent) -> RelayResult<String>;

    /// MIME type of the stream the payloads form.
    fn content_type(&self) -> &'static str;
}

/// Server-Sent-Events framing: `data: <json>\n\n` per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SseEncoder;

impl EventEncoder for SseEncoder {
    fn encode(&self, event: &AgentEvent) -> RelayResult<String> {
        let json = serde_json::to_string(event)?;
        Ok(format!("data: {json}\n\n"))
    }

    fn content_type(&self) -> &'static str {
        "text/event-stream"
    }
}
