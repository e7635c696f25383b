//! Conversation session state for agentrelay.
//!
//! Sessions hold what the relay knows about a thread independently of any
//! client connection: its message history and activity timestamps.

/// Thread id to session map.
pub mod registry;
/// Per-thread session state.
pub mod session;

pub use registry::SessionRegistry;
pub use session::Session;
