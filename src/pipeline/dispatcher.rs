//! Session event loop: capture in, media out, replies scheduled.
//!
//! One task owns every moving part of a running session - the capture
//! sources, the send queue, the playback scheduler - and serializes all
//! state changes through a single `select!`. Teardown is a straight-line
//! sequence at the end of the loop, so it runs exactly once no matter what
//! ended the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::SessionConfig;
use crate::error::LiveError;
use crate::event::{EventCallback, SessionEvent, StopReason};
use crate::format::pcm;
use crate::pipeline::video;
use crate::playback::PlaybackScheduler;
use crate::session::SessionState;
use crate::source::{MicrophoneSource, ScreenSource};
use crate::wire::{InboundMessage, MediaPayload, OutboundMedia};

/// Command sent to the session loop.
pub(crate) enum Command {
    /// Tear the session down gracefully.
    Stop,
}

/// The session loop task. Built by the builder, driven by [`run`].
///
/// [`run`]: Dispatcher::run
pub(crate) struct Dispatcher {
    pub(crate) config: SessionConfig,
    pub(crate) microphone: Box<dyn MicrophoneSource>,
    pub(crate) screen: Box<dyn ScreenSource>,
    pub(crate) mic_rx: mpsc::Receiver<crate::chunk::AudioChunk>,
    pub(crate) scheduler: PlaybackScheduler,
    pub(crate) outbound_tx: mpsc::Sender<OutboundMedia>,
    pub(crate) worker_close_tx: Option<oneshot::Sender<()>>,
    pub(crate) worker_handle: JoinHandle<()>,
    pub(crate) inbound_rx: mpsc::Receiver<InboundMessage>,
    pub(crate) cmd_rx: mpsc::Receiver<Command>,
    pub(crate) event_callback: Option<EventCallback>,
    pub(crate) state: Arc<SessionState>,
}

impl Dispatcher {
    fn emit_event(&self, event: SessionEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Runs the session until something ends it, then tears down.
    pub(crate) async fn run(mut self) {
        let mut frame_timer = tokio::time::interval(self.config.frame_interval);
        frame_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut mic_open = true;
        let reason = loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Stop) | None => break StopReason::User,
                    }
                }
                chunk = self.mic_rx.recv(), if mic_open => {
                    match chunk {
                        Some(chunk) => {
                            let payload = pcm::encode_chunk(&chunk);
                            self.enqueue(payload, &self.state.audio_chunks_sent);
                        }
                        None => {
                            tracing::warn!("microphone channel closed");
                            mic_open = false;
                        }
                    }
                }
                _ = frame_timer.tick() => {
                    self.scheduler.prune_finished();
                    match self.screen.grab().await {
                        Ok(frame) => {
                            let payload = video::encode_frame(
                                frame,
                                self.config.frame_scaling,
                                self.config.jpeg_quality,
                            )
                            .await;
                            if let Some(payload) = payload {
                                self.enqueue(payload, &self.state.frames_sent);
                            }
                        }
                        Err(LiveError::ScreenShareEnded) => {
                            break StopReason::ScreenShareEnded;
                        }
                        Err(err) => {
                            // One bad frame is not a session failure.
                            tracing::warn!("frame grab failed: {err}");
                        }
                    }
                }
                message = self.inbound_rx.recv() => {
                    match message {
                        Some(InboundMessage::Audio { data }) => {
                            self.handle_reply_audio(&data);
                        }
                        Some(InboundMessage::Interrupted) => {
                            let cancelled = self.scheduler.interrupt();
                            self.state.interruptions.fetch_add(1, Ordering::SeqCst);
                            self.emit_event(SessionEvent::Interrupted { cancelled });
                        }
                        Some(InboundMessage::TurnComplete) => {
                            self.emit_event(SessionEvent::TurnComplete);
                        }
                        Some(InboundMessage::Closed) => {
                            break StopReason::RemoteClosed;
                        }
                        Some(InboundMessage::Error(reason)) => {
                            break StopReason::TransportError { reason };
                        }
                        None => {
                            break StopReason::TransportError {
                                reason: "connection worker stopped".to_string(),
                            };
                        }
                    }
                }
            }
        };

        self.teardown(reason).await;
    }

    /// Decodes one reply fragment and hands it to the scheduler.
    ///
    /// A payload that fails to decode is dropped; the session keeps
    /// running.
    fn handle_reply_audio(&mut self, data: &str) {
        match pcm::decode_base64(data, self.config.output_sample_rate, 1) {
            Ok(buffer) => {
                self.scheduler.schedule(buffer);
                self.state.units_scheduled.fetch_add(1, Ordering::SeqCst);
            }
            Err(err) => {
                tracing::warn!("reply audio dropped: {err}");
                self.state.decode_failures.fetch_add(1, Ordering::SeqCst);
                self.emit_event(SessionEvent::DecodeFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Queues a payload for the connection worker.
    ///
    /// The queue is bounded; when it is full the payload is dropped and the
    /// embedder is told, because stalling the session loop would also stall
    /// capture and playback.
    fn enqueue(&self, payload: MediaPayload, counter: &AtomicU64) {
        match self.outbound_tx.try_send(OutboundMedia::new(payload)) {
            Ok(()) => {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.state.outbound_dropped.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(dropped, "outbound queue full, payload dropped");
                self.emit_event(SessionEvent::OutboundOverflow { dropped });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("outbound queue closed");
            }
        }
    }

    /// Releases everything, in a fixed order, swallowing individual
    /// failures so one bad release never skips the rest.
    async fn teardown(mut self, reason: StopReason) {
        tracing::info!(%reason, "session stopping");

        // Frame timer died with the loop. Stop capture next so nothing new
        // enters the pipeline.
        self.microphone.close().await;
        self.screen.close().await;

        // Refuse further inbound traffic, then tell the worker to close
        // the connection and wait for it.
        self.inbound_rx.close();
        if let Some(close_tx) = self.worker_close_tx.take() {
            let _ = close_tx.send(());
        }
        if let Err(e) = (&mut self.worker_handle).await {
            tracing::warn!("connection worker ended abnormally: {e}");
        }

        // Silence and release the output, resetting the timeline.
        self.scheduler.shutdown();

        self.state.running.store(false, Ordering::SeqCst);
        self.emit_event(SessionEvent::Stopped { reason });
        tracing::info!("session stopped");
    }
}
