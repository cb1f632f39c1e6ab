//! Connection worker: opens the upstream session and drains the send queue.
//!
//! Media produced before the connection resolves waits in the outbound
//! queue; the worker opens the connection first and only then starts
//! draining, so everything reaches the backend in submission order.

use tokio::sync::{mpsc, oneshot};

use crate::config::SessionSetup;
use crate::event::{EventCallback, SessionEvent};
use crate::transport::LiveClient;
use crate::wire::{InboundMessage, OutboundMedia};

/// Owns the client connection for the lifetime of a session.
///
/// Inbound traffic, connection failures, and the remote closing are all
/// forwarded through one channel to the session loop, which decides what to
/// do. The worker itself only closes the connection when told to (or when
/// the session loop goes away).
pub(crate) struct OutboundWorker {
    client: Box<dyn LiveClient>,
    setup: SessionSetup,
    outbound_rx: mpsc::Receiver<OutboundMedia>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    close_rx: oneshot::Receiver<()>,
    event_callback: Option<EventCallback>,
}

impl OutboundWorker {
    pub(crate) fn new(
        client: Box<dyn LiveClient>,
        setup: SessionSetup,
        outbound_rx: mpsc::Receiver<OutboundMedia>,
        inbound_tx: mpsc::Sender<InboundMessage>,
        close_rx: oneshot::Receiver<()>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        Self {
            client,
            setup,
            outbound_rx,
            inbound_tx,
            close_rx,
            event_callback,
        }
    }

    fn emit_event(&self, event: SessionEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Runs the worker to completion.
    pub(crate) async fn run(mut self) {
        // Opening races against an early close (the session stopping
        // before the connection resolved).
        let opened = tokio::select! {
            _ = &mut self.close_rx => return,
            result = self.client.open(&self.setup) => result,
        };

        let (mut connection, mut remote_rx) = match opened {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!("connection failed: {err}");
                let _ = self
                    .inbound_tx
                    .send(InboundMessage::Error(err.to_string()))
                    .await;
                return;
            }
        };

        tracing::info!(model = %self.setup.model, "live connection established");
        self.emit_event(SessionEvent::Connected);

        let mut remote_open = true;
        loop {
            tokio::select! {
                _ = &mut self.close_rx => {
                    break;
                }
                queued = self.outbound_rx.recv() => {
                    match queued {
                        Some(message) => {
                            if let Err(err) = connection.send(&message).await {
                                tracing::warn!("send failed: {err}");
                                let _ = self
                                    .inbound_tx
                                    .send(InboundMessage::Error(err.to_string()))
                                    .await;
                            }
                        }
                        None => {
                            // The session loop dropped the queue.
                            break;
                        }
                    }
                }
                inbound = remote_rx.recv(), if remote_open => {
                    match inbound {
                        Some(message) => {
                            if self.inbound_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            // The remote ended the session.
                            remote_open = false;
                            let _ = self.inbound_tx.send(InboundMessage::Closed).await;
                        }
                    }
                }
            }
        }

        connection.close().await;
        tracing::debug!("connection worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockClient;
    use crate::wire::MediaPayload;

    struct Parts {
        outbound_tx: mpsc::Sender<OutboundMedia>,
        inbound_rx: mpsc::Receiver<InboundMessage>,
        close_tx: oneshot::Sender<()>,
    }

    fn spawn_worker(client: MockClient) -> (tokio::task::JoinHandle<()>, Parts) {
        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let (inbound_tx, inbound_rx) = mpsc::channel(16);
        let (close_tx, close_rx) = oneshot::channel();

        let worker = OutboundWorker::new(
            Box::new(client),
            SessionSetup::default(),
            outbound_rx,
            inbound_tx,
            close_rx,
            None,
        );

        (
            tokio::spawn(worker.run()),
            Parts {
                outbound_tx,
                inbound_rx,
                close_tx,
            },
        )
    }

    fn payload(byte: u8) -> OutboundMedia {
        OutboundMedia::new(MediaPayload::jpeg(&[byte]))
    }

    #[tokio::test]
    async fn test_queued_media_sent_in_order_after_open() {
        let client = MockClient::deferred();
        let handle = client.handle();
        let (task, parts) = spawn_worker(client);

        // Queue media while the connection is still opening.
        parts.outbound_tx.send(payload(1)).await.unwrap();
        parts.outbound_tx.send(payload(2)).await.unwrap();
        parts.outbound_tx.send(payload(3)).await.unwrap();
        drop(parts.outbound_tx);

        assert!(handle.sent().is_empty());
        handle.release_open();
        task.await.unwrap();

        assert_eq!(handle.sent(), vec![payload(1), payload(2), payload(3)]);
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_forwarded_as_error() {
        let client = MockClient::failing("refused");
        let (task, mut parts) = spawn_worker(client);

        match parts.inbound_rx.recv().await.unwrap() {
            InboundMessage::Error(reason) => assert!(reason.contains("refused")),
            other => panic!("unexpected message: {other:?}"),
        }
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_signal_cancels_pending_open() {
        let client = MockClient::deferred();
        let handle = client.handle();
        let (task, parts) = spawn_worker(client);

        parts.close_tx.send(()).unwrap();
        task.await.unwrap();

        // Never connected, so there was nothing to close.
        assert_eq!(handle.close_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_close_mapped_to_closed_message() {
        let client = MockClient::new();
        let handle = client.handle();
        let (task, mut parts) = spawn_worker(client);

        // Let the worker open before injecting.
        tokio::task::yield_now().await;

        handle.inject_interrupted();
        assert_eq!(
            parts.inbound_rx.recv().await,
            Some(InboundMessage::Interrupted)
        );

        handle.inject_closed();
        assert_eq!(parts.inbound_rx.recv().await, Some(InboundMessage::Closed));

        parts.close_tx.send(()).unwrap();
        task.await.unwrap();
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_forwarded_as_error() {
        let client = MockClient::new();
        let handle = client.handle();
        let (task, mut parts) = spawn_worker(client);

        handle.fail_sends("socket reset");
        parts.outbound_tx.send(payload(9)).await.unwrap();

        match parts.inbound_rx.recv().await.unwrap() {
            InboundMessage::Error(reason) => assert!(reason.contains("socket reset")),
            other => panic!("unexpected message: {other:?}"),
        }

        parts.close_tx.send(()).unwrap();
        task.await.unwrap();
    }
}
