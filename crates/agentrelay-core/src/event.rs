use crate::message::{Message, Role};
use serde::{Deserialize, Serialize};

/// Events produced during an agent run and streamed to UI clients.
///
/// Serialized with a `type` tag (`"TEXT_MESSAGE_CONTENT"`, ...) and camelCase
/// field names, so a single event is one self-describing JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum AgentEvent {
    /// An agent run has started on a thread.
    RunStarted {
        /// Thread the run belongs to.
        thread_id: String,
        /// Identifier of the run.
        run_id: String,
    },

    /// An agent run completed.
    RunFinished {
        /// Thread the run belongs to.
        thread_id: String,
        /// Identifier of the run.
        run_id: String,
    },

    /// An agent run failed.
    RunError {
        /// Human-readable failure description.
        message: String,
        /// Optional machine-readable error code.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// A new assistant message begins.
    TextMessageStart {
        /// Message the event belongs to.
        message_id: String,
        /// Author of the message.
        role: Role,
    },

    /// A chunk of text for an open message.
    TextMessageContent {
        /// Message the event belongs to.
        message_id: String,
        /// Text appended by this chunk.
        delta: String,
    },

    /// The message is complete.
    TextMessageEnd {
        /// Message the event belongs to.
        message_id: String,
    },

    /// A new tool call has started.
    ToolCallStart {
        /// Tool call the event belongs to.
        tool_call_id: String,
        /// Name of the invoked tool.
        tool_call_name: String,
        /// Assistant message that issued the call, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
    },

    /// An incremental fragment of tool call arguments (JSON string delta).
    ToolCallArgs {
        /// Tool call the event belongs to.
        tool_call_id: String,
        /// Argument text appended by this chunk.
        delta: String,
    },

    /// A tool call's arguments are now complete.
    ToolCallEnd {
        /// Tool call the event belongs to.
        tool_call_id: String,
    },

    /// Full replacement of the shared agent state.
    StateSnapshot {
        /// Complete state document.
        snapshot: serde_json::Value,
    },

    /// Full replacement of the thread's message list.
    MessagesSnapshot {
        /// Complete message list.
        messages: Vec<Message>,
    },

    /// Application-defined event.
    Custom {
        /// Application-defined event name.
        name: String,
        /// Arbitrary payload.
        value: serde_json::Value,
    },
}

impl AgentEvent {
    /// The wire tag of this event, e.g. `"RUN_STARTED"`.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::RunStarted { .. } => "RUN_STARTED",
            AgentEvent::RunFinished { .. } => "RUN_FINISHED",
            AgentEvent::RunError { .. } => "RUN_ERROR",
            AgentEvent::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            AgentEvent::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            AgentEvent::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            AgentEvent::ToolCallStart { .. } => "TOOL_CALL_START",
            AgentEvent::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            AgentEvent::ToolCallEnd { .. } => "TOOL_CALL_END",
            AgentEvent::StateSnapshot { .. } => "STATE_SNAPSHOT",
            AgentEvent::MessagesSnapshot { .. } => "MESSAGES_SNAPSHOT",
            AgentEvent::Custom { .. } => "CUSTOM",
        }
    }

    /// Shorthand for a [`AgentEvent::TextMessageContent`] chunk.
    pub fn text(message_id: impl Into<String>, delta: impl Into<String>) -> Self {
        AgentEvent::TextMessageContent {
            message_id: message_id.into(),
            delta: delta.into(),
        }
    }
}
