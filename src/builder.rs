//! Builder pattern for `TutorLive`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::config::{SessionConfig, SessionSetup};
use crate::error::LiveError;
use crate::event::{event_callback, EventCallback, SessionEvent};
use crate::pipeline::{Dispatcher, OutboundWorker};
use crate::playback::{AudioOutput, PlaybackScheduler};
use crate::session::{Session, SessionState};
use crate::source::{MicrophoneSource, ScreenSource};
use crate::transport::LiveClient;

/// Channel capacity for session commands.
/// Only need 1 since commands are rare (just Stop).
const COMMAND_CHANNEL_CAPACITY: usize = 1;

/// Channel capacity for inbound messages from the connection worker.
const INBOUND_CHANNEL_CAPACITY: usize = 32;

/// Builder for configuring and starting a live session.
///
/// Use [`TutorLive::builder()`] to create a new builder. A session needs
/// all four parts: a microphone, a screen source, a client, and an audio
/// output.
///
/// # Example
///
/// ```ignore
/// use tutor_live::{Microphone, SessionConfig, TutorLive};
///
/// let session = TutorLive::builder()
///     .microphone(Microphone::default_device())
///     .screen(my_screen)
///     .client(my_client)
///     .output(my_output)
///     .on_event(|event| println!("{event:?}"))
///     .start()
///     .await?;
/// ```
///
/// [`TutorLive::builder()`]: crate::TutorLive::builder
#[must_use]
pub struct TutorLiveBuilder {
    config: SessionConfig,
    setup: SessionSetup,
    microphone: Option<Box<dyn MicrophoneSource>>,
    screen: Option<Box<dyn ScreenSource>>,
    client: Option<Box<dyn LiveClient>>,
    output: Option<Box<dyn AudioOutput>>,
    event_callback: Option<EventCallback>,
}

impl Default for TutorLiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TutorLiveBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            setup: SessionSetup::default(),
            microphone: None,
            screen: None,
            client: None,
            output: None,
            event_callback: None,
        }
    }

    /// Sets the microphone to capture from.
    pub fn microphone<M: MicrophoneSource + 'static>(mut self, microphone: M) -> Self {
        self.microphone = Some(Box::new(microphone));
        self
    }

    /// Sets the screen to share.
    pub fn screen<S: ScreenSource + 'static>(mut self, screen: S) -> Self {
        self.screen = Some(Box::new(screen));
        self
    }

    /// Sets the client used to reach the assistant backend.
    pub fn client<C: LiveClient + 'static>(mut self, client: C) -> Self {
        self.client = Some(Box::new(client));
        self
    }

    /// Sets the output that plays assistant replies.
    pub fn output<O: AudioOutput + 'static>(mut self, output: O) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Sets custom session configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session setup sent to the backend on connect.
    pub fn with_setup(mut self, setup: SessionSetup) -> Self {
        self.setup = setup;
        self
    }

    /// Sets a callback to receive runtime events.
    ///
    /// Events include connection establishment, interruptions, queue
    /// overflows, and the session stopping.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Validates the builder configuration.
    fn validate(&self) -> Result<(), LiveError> {
        if self.microphone.is_none() {
            return Err(LiveError::NoMicrophoneConfigured);
        }
        if self.screen.is_none() {
            return Err(LiveError::NoScreenConfigured);
        }
        if self.client.is_none() {
            return Err(LiveError::NoClientConfigured);
        }
        if self.output.is_none() {
            return Err(LiveError::NoOutputConfigured);
        }
        Ok(())
    }

    /// Starts the session.
    ///
    /// Acquires the screen share first, then the microphone; if the
    /// microphone fails, the screen share is released before returning.
    /// The connection opens in the background - media captured in the
    /// meantime queues up and is sent once it resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any of the four parts is missing
    /// - The screen share cannot be acquired
    /// - The microphone cannot be opened
    pub async fn start(self) -> Result<Session, LiveError> {
        self.validate()?;

        let Self {
            config,
            setup,
            microphone,
            screen,
            client,
            output,
            event_callback,
        } = self;
        let mut microphone = microphone.ok_or(LiveError::NoMicrophoneConfigured)?;
        let mut screen = screen.ok_or(LiveError::NoScreenConfigured)?;
        let client = client.ok_or(LiveError::NoClientConfigured)?;
        let output = output.ok_or(LiveError::NoOutputConfigured)?;

        // Screen first: a refused share must not leave a hot microphone
        // behind.
        screen.open().await?;
        tracing::debug!(screen = screen.name(), "screen share acquired");

        let spec = config.capture_spec();
        let mic_rx = match microphone.open(&spec).await {
            Ok(rx) => rx,
            Err(err) => {
                screen.close().await;
                return Err(err);
            }
        };
        tracing::debug!(microphone = microphone.name(), "microphone opened");

        let state = Arc::new(SessionState::new());
        let scheduler = PlaybackScheduler::new(output);

        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (worker_close_tx, worker_close_rx) = oneshot::channel();

        let worker = OutboundWorker::new(
            client,
            setup,
            outbound_rx,
            inbound_tx,
            worker_close_rx,
            event_callback.clone(),
        );
        let worker_handle = tokio::spawn(worker.run());

        let dispatcher = Dispatcher {
            config,
            microphone,
            screen,
            mic_rx,
            scheduler,
            outbound_tx,
            worker_close_tx: Some(worker_close_tx),
            worker_handle,
            inbound_rx,
            cmd_rx,
            event_callback,
            state: Arc::clone(&state),
        };
        let dispatcher_handle = tokio::spawn(dispatcher.run());

        tracing::info!("session started");
        Ok(Session::new(state, cmd_tx, dispatcher_handle))
    }
}

/// Main entry point for tutor-live.
///
/// Use [`TutorLive::builder()`] to start configuring a session.
pub struct TutorLive;

impl TutorLive {
    /// Creates a new builder for configuring a live session.
    pub fn builder() -> TutorLiveBuilder {
        TutorLiveBuilder::new()
    }
}
