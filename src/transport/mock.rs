//! Mock transport for testing without a backend.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::config::SessionSetup;
use crate::error::LiveError;
use crate::transport::{LiveClient, LiveConnection};
use crate::wire::{InboundMessage, OutboundMedia};

/// Inbound messages buffered between injection and the session loop.
const INBOUND_CHANNEL_CAPACITY: usize = 32;

/// State shared between the client, its connection, and the handle.
#[derive(Default)]
struct ClientShared {
    sent: Vec<OutboundMedia>,
    open_count: usize,
    close_count: usize,
    send_error: Option<String>,
    inbound_tx: Option<mpsc::Sender<InboundMessage>>,
}

/// A mock [`LiveClient`] that records sends and lets tests inject replies.
///
/// `deferred()` builds a client whose `open` blocks until the handle releases
/// it, for exercising media submitted while the connection is still being
/// established.
pub struct MockClient {
    shared: Arc<Mutex<ClientShared>>,
    open_gate: Option<oneshot::Receiver<()>>,
    gate_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    open_error: Option<LiveError>,
}

impl MockClient {
    /// Creates a client whose `open` resolves immediately.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(ClientShared::default())),
            open_gate: None,
            gate_tx: Arc::new(Mutex::new(None)),
            open_error: None,
        }
    }

    /// Creates a client whose `open` blocks until
    /// [`MockClientHandle::release_open`] is called.
    pub fn deferred() -> Self {
        let (gate_tx, gate_rx) = oneshot::channel();
        let mut client = Self::new();
        client.open_gate = Some(gate_rx);
        *client.gate_tx.lock() = Some(gate_tx);
        client
    }

    /// Creates a client whose next `open` fails with `ConnectionFailed`.
    pub fn failing(reason: impl Into<String>) -> Self {
        let mut client = Self::new();
        client.open_error = Some(LiveError::ConnectionFailed {
            reason: reason.into(),
        });
        client
    }

    /// Returns a handle for observing sends and injecting replies.
    pub fn handle(&self) -> MockClientHandle {
        MockClientHandle {
            shared: Arc::clone(&self.shared),
            gate_tx: Arc::clone(&self.gate_tx),
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiveClient for MockClient {
    async fn open(
        &mut self,
        _setup: &SessionSetup,
    ) -> Result<(Box<dyn LiveConnection>, mpsc::Receiver<InboundMessage>), LiveError> {
        self.shared.lock().open_count += 1;

        if let Some(err) = self.open_error.take() {
            return Err(err);
        }

        if let Some(gate) = self.open_gate.take() {
            // Blocks until the handle releases the open.
            let _ = gate.await;
        }

        let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        self.shared.lock().inbound_tx = Some(tx);

        let connection = MockConnection {
            shared: Arc::clone(&self.shared),
        };
        Ok((Box::new(connection), rx))
    }
}

struct MockConnection {
    shared: Arc<Mutex<ClientShared>>,
}

#[async_trait]
impl LiveConnection for MockConnection {
    async fn send(&mut self, message: &OutboundMedia) -> Result<(), LiveError> {
        let mut shared = self.shared.lock();
        if let Some(reason) = shared.send_error.clone() {
            return Err(LiveError::ConnectionFailed { reason });
        }
        shared.sent.push(message.clone());
        Ok(())
    }

    async fn close(&mut self) {
        let mut shared = self.shared.lock();
        shared.close_count += 1;
        shared.inbound_tx = None;
    }
}

/// Observer and injection handle for a [`MockClient`].
///
/// Injections before `open` has resolved are dropped.
#[derive(Clone)]
pub struct MockClientHandle {
    shared: Arc<Mutex<ClientShared>>,
    gate_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl MockClientHandle {
    /// Releases a deferred `open`. No-op for non-deferred clients.
    pub fn release_open(&self) {
        if let Some(gate) = self.gate_tx.lock().take() {
            let _ = gate.send(());
        }
    }

    /// All messages sent so far, in order.
    pub fn sent(&self) -> Vec<OutboundMedia> {
        self.shared.lock().sent.clone()
    }

    /// How many times `open` was called.
    pub fn open_count(&self) -> usize {
        self.shared.lock().open_count
    }

    /// How many times the connection was closed.
    pub fn close_count(&self) -> usize {
        self.shared.lock().close_count
    }

    /// Makes every subsequent `send` fail with `ConnectionFailed`.
    pub fn fail_sends(&self, reason: impl Into<String>) {
        self.shared.lock().send_error = Some(reason.into());
    }

    /// Injects a model audio reply carrying the given raw PCM bytes.
    pub fn inject_audio(&self, pcm: &[u8]) {
        self.inject(InboundMessage::Audio {
            data: STANDARD.encode(pcm),
        });
    }

    /// Injects an audio reply whose payload is not valid base64.
    pub fn inject_malformed_audio(&self) {
        self.inject(InboundMessage::Audio {
            data: "not base64!".to_string(),
        });
    }

    /// Injects an interruption signal.
    pub fn inject_interrupted(&self) {
        self.inject(InboundMessage::Interrupted);
    }

    /// Injects a turn-complete signal.
    pub fn inject_turn_complete(&self) {
        self.inject(InboundMessage::TurnComplete);
    }

    /// Injects a transport error.
    pub fn inject_error(&self, message: impl Into<String>) {
        self.inject(InboundMessage::Error(message.into()));
    }

    /// Simulates the remote ending the session by closing the inbound
    /// channel.
    pub fn inject_closed(&self) {
        self.shared.lock().inbound_tx = None;
    }

    fn inject(&self, message: InboundMessage) {
        let tx = self.shared.lock().inbound_tx.clone();
        if let Some(tx) = tx {
            let _ = tx.try_send(message);
        }
    }
}
