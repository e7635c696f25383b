//! Core types and error definitions for agentrelay.
//!
//! This crate provides the vocabulary shared by the session registry and the
//! gateway: the event kinds streamed to clients, conversation messages, the
//! encoder and sink seams, and the unified error type.
//!
//! # Main types
//!
//! - [`RelayError`] — Unified error enum.
//! - [`RelayResult`] — Convenience alias for `Result<T, RelayError>`.
//! - [`AgentEvent`] — Closed set of agent run events.
//! - [`Message`] — A single message within a conversation thread.
//! - [`EventEncoder`] / [`SseEncoder`] — Event to wire payload.
//! - [`EventSink`] — Transport-owned delivery channel.

/// Event to wire payload framing.
pub mod encoder;
/// Unified error type.
pub mod error;
/// Agent run events.
pub mod event;
/// Conversation messages.
pub mod message;
/// Transport-owned delivery channel seam.
pub mod sink;

pub use encoder::{EventEncoder, SseEncoder};
pub use error::{RelayError, RelayResult};
pub use event::AgentEvent;
pub use message::{Message, Role};
pub use sink::EventSink;
