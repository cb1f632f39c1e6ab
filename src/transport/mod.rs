//! Upstream session transport abstraction.
//!
//! The library never opens sockets itself. Embedders supply a [`LiveClient`]
//! that wraps their realtime API binding (typically a websocket); the session
//! drives it through these traits and stays transport-agnostic.

mod mock;

pub use mock::{MockClient, MockClientHandle};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::SessionSetup;
use crate::error::LiveError;
use crate::wire::{InboundMessage, OutboundMedia};

/// Opens live connections to the assistant backend.
///
/// `open` performs the full handshake described by the [`SessionSetup`]
/// (model, voice, system prompt, response modality) and resolves only once
/// the backend is ready to accept media. It returns the send half as a
/// [`LiveConnection`] and the receive half as a channel of already-parsed
/// [`InboundMessage`]s.
///
/// The receive channel closing means the remote ended the session; the
/// session treats that as a normal stop, not an error.
#[async_trait]
pub trait LiveClient: Send {
    /// Establishes the connection and completes session setup.
    async fn open(
        &mut self,
        setup: &SessionSetup,
    ) -> Result<(Box<dyn LiveConnection>, mpsc::Receiver<InboundMessage>), LiveError>;
}

/// The send half of an established live connection.
///
/// Messages must reach the backend in the order `send` is called.
#[async_trait]
pub trait LiveConnection: Send {
    /// Sends one media message upstream.
    async fn send(&mut self, message: &OutboundMedia) -> Result<(), LiveError>;

    /// Closes the connection. Safe to call more than once.
    async fn close(&mut self);
}
