//! Session-scoped event delivery for agentrelay.
//!
//! Events produced for a conversation thread are written to the thread's
//! live client channel when one is attached, and buffered in a bounded
//! per-thread queue otherwise. Attaching a client flushes that backlog
//! before anything newer is sent.
//!
//! # Main types
//!
//! - [`EventRouter`] — Decides between live delivery and queueing.
//! - [`ConnectionHub`] — At most one live channel per thread.
//! - [`PendingEventQueue`] — Bounded FIFO backlog per thread.
//! - [`SweepHandle`] — Periodic reclamation of stale state.
//! - [`GatewayServer`] — axum routes exposing the router over HTTP and SSE.

/// Delivery limits.
pub mod config;
/// Live client channels.
pub mod connection;
/// Per-thread backlog of undelivered events.
pub mod queue;
/// Send-or-queue dispatch.
pub mod router;
/// HTTP and SSE transport.
pub mod server;
/// Channel-backed sink for streaming responses.
pub mod sink;
/// Periodic staleness sweep.
pub mod sweeper;

#[cfg(test)]
mod test_support;

pub use config::DeliveryConfig;
pub use connection::{Connection, ConnectionHub};
pub use queue::PendingEventQueue;
pub use router::{Delivery, DispatchReport, EventRouter, SweepReport};
pub use server::GatewayServer;
pub use sink::ChannelSink;
pub use sweeper::SweepHandle;
