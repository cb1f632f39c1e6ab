//! Live session handle and shared state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::LiveError;
use crate::pipeline::Command;

/// Statistics about a live session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Microphone chunks queued for sending.
    pub audio_chunks_sent: u64,
    /// Screen frames queued for sending.
    pub frames_sent: u64,
    /// Reply fragments scheduled for playback.
    pub units_scheduled: u64,
    /// Interruptions received from the model.
    pub interruptions: u64,
    /// Outbound payloads dropped because the send queue was full.
    pub outbound_dropped: u64,
    /// Inbound audio payloads that failed to decode.
    pub decode_failures: u64,
}

/// Internal state shared between Session and background tasks.
pub(crate) struct SessionState {
    pub running: AtomicBool,
    pub audio_chunks_sent: AtomicU64,
    pub frames_sent: AtomicU64,
    pub units_scheduled: AtomicU64,
    pub interruptions: AtomicU64,
    pub outbound_dropped: AtomicU64,
    pub decode_failures: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            audio_chunks_sent: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
            units_scheduled: AtomicU64::new(0),
            interruptions: AtomicU64::new(0),
            outbound_dropped: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
        }
    }
}

/// Handle to a running live session.
///
/// The `Session` is returned by [`TutorLiveBuilder::start()`] and represents
/// an active conversation. Capture, sending, and reply playback run in
/// background tasks until `stop()` is called, the remote ends the session,
/// or the `Session` is dropped.
///
/// # Lifecycle
///
/// 1. Created by [`TutorLiveBuilder::start()`]
/// 2. Media flows in the background; replies play as they arrive
/// 3. Call [`stop()`](Session::stop) for graceful shutdown
/// 4. Dropping the `Session` also stops it (but prefer explicit `stop()`)
///
/// The session can also end on its own - when the remote closes or the
/// screen share is revoked - in which case teardown has already run and
/// `stop()` returns immediately.
///
/// # Example
///
/// ```ignore
/// let session = TutorLive::builder()
///     .microphone(Microphone::default_device())
///     .screen(my_screen)
///     .client(my_client)
///     .output(my_output)
///     .start()
///     .await?;
///
/// // Conversation runs in background...
/// tokio::time::sleep(Duration::from_secs(60)).await;
///
/// // Graceful shutdown
/// session.stop().await?;
/// ```
///
/// [`TutorLiveBuilder::start()`]: crate::TutorLiveBuilder::start
pub struct Session {
    state: Arc<SessionState>,
    cmd_tx: mpsc::Sender<Command>,
    dispatcher_handle: Option<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn new(
        state: Arc<SessionState>,
        cmd_tx: mpsc::Sender<Command>,
        dispatcher_handle: JoinHandle<()>,
    ) -> Self {
        Self {
            state,
            cmd_tx,
            dispatcher_handle: Some(dispatcher_handle),
        }
    }

    /// Returns `true` if the session is still running.
    ///
    /// Becomes `false` after `stop()`, and also when the session ends on
    /// its own.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            audio_chunks_sent: self.state.audio_chunks_sent.load(Ordering::SeqCst),
            frames_sent: self.state.frames_sent.load(Ordering::SeqCst),
            units_scheduled: self.state.units_scheduled.load(Ordering::SeqCst),
            interruptions: self.state.interruptions.load(Ordering::SeqCst),
            outbound_dropped: self.state.outbound_dropped.load(Ordering::SeqCst),
            decode_failures: self.state.decode_failures.load(Ordering::SeqCst),
        }
    }

    /// Gracefully stops the session.
    ///
    /// This will:
    /// 1. Stop microphone capture and screen grabbing
    /// 2. Close the upstream connection
    /// 3. Cancel any reply audio still playing
    /// 4. Wait for background tasks to complete
    ///
    /// If the session already ended on its own, this returns immediately
    /// without re-running teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    pub async fn stop(mut self) -> Result<(), LiveError> {
        self.stop_internal().await
    }

    async fn stop_internal(&mut self) -> Result<(), LiveError> {
        if !self.state.running.swap(false, Ordering::SeqCst) {
            // Already stopped
            return Ok(());
        }

        // Ask the dispatcher to tear down
        let _ = self.cmd_tx.send(Command::Stop).await;

        // Wait for it to finish
        if let Some(handle) = self.dispatcher_handle.take() {
            let _ = handle.await;
        }

        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state.running.load(Ordering::SeqCst) {
            // Session dropped without explicit stop() - trigger background cleanup
            self.state.running.store(false, Ordering::SeqCst);
            let _ = self.cmd_tx.try_send(Command::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_new() {
        let state = SessionState::new();
        assert!(state.running.load(Ordering::SeqCst));
        assert_eq!(state.units_scheduled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_session_stats_default() {
        let stats = SessionStats::default();
        assert_eq!(stats.audio_chunks_sent, 0);
        assert_eq!(stats.frames_sent, 0);
        assert_eq!(stats.units_scheduled, 0);
        assert_eq!(stats.interruptions, 0);
        assert_eq!(stats.outbound_dropped, 0);
        assert_eq!(stats.decode_failures, 0);
    }
}
