//! Session pipeline components.
//!
//! Two tasks drive a running session:
//!
//! ```text
//! Microphone ─┐
//!             ├→ Dispatcher ─→ Outbound Queue ─→ Connection Worker ─→ Backend
//! Screen ─────┘      ↑                                  │
//!                    └───────── Inbound Messages ───────┘
//! ```
//!
//! - **Dispatcher**: the session event loop; encodes capture into media
//!   payloads, schedules reply audio, owns teardown
//! - **Connection Worker**: opens the upstream connection, drains the send
//!   queue in order, forwards inbound traffic
//! - **Video**: frame downscaling and JPEG encoding, off the async runtime
//!
//! The bounded outbound queue decouples capture pacing from connection
//! latency; media produced before the connection resolves is delivered once
//! it does.

mod dispatcher;
mod outbound;
mod video;

pub(crate) use dispatcher::{Command, Dispatcher};
pub(crate) use outbound::OutboundWorker;
