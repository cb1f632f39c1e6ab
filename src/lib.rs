//! # tutor-live
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Realtime microphone and screen streaming to a live assistant session,
//! with gapless playback of the spoken replies.
//!
//! `tutor-live` captures 16 kHz mono microphone audio and periodic JPEG
//! screen frames, streams both to an assistant backend over a pluggable
//! transport, and schedules the 24 kHz audio replies back to back on an
//! output clock - cutting playback over instantly when the model is
//! interrupted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tutor_live::{Microphone, SessionEvent, TutorLive};
//!
//! let session = TutorLive::builder()
//!     .microphone(Microphone::default_device())
//!     .screen(my_screen)       // your ScreenSource
//!     .client(my_client)       // your LiveClient (the API binding)
//!     .output(my_output)       // your AudioOutput (speakers)
//!     .on_event(|e| tracing::info!(?e, "session event"))
//!     .start()
//!     .await?;
//!
//! // The conversation runs in the background; replies play as they
//! // arrive. Stop whenever the user is done.
//! session.stop().await?;
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict thread boundary:
//!
//! - **CPAL Thread**: High-priority audio callback that never blocks
//! - **Ring Buffer**: Lock-free SPSC queue hands samples to the runtime
//! - **Tokio Runtime**: One session loop serializes capture, sending, and
//!   reply playback; a connection worker owns the upstream link
//!
//! Capture starts immediately while the connection opens in the
//! background; media produced in the meantime queues up and is delivered
//! in order once the backend is ready.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod chunk;
mod config;
mod error;
mod event;
pub mod format;
mod pipeline;
pub mod playback;
mod session;
pub mod source;
pub mod transport;
pub mod wire;

pub use builder::{TutorLive, TutorLiveBuilder};
pub use chunk::{AudioBuffer, AudioChunk};
pub use config::{CaptureSpec, FrameScaling, ResponseModality, SessionConfig, SessionSetup};
pub use error::{DecodeError, LiveError};
pub use event::{event_callback, EventCallback, SessionEvent, StopReason};
pub use playback::{AudioOutput, MockOutput, MockOutputHandle, PlaybackId, RecordedStart};
pub use session::{Session, SessionStats};
pub use source::{
    default_input_device_name, list_input_devices, CapturedFrame, Microphone, MicrophoneSource,
    MockMicrophone, MockMicrophoneHandle, MockScreen, MockScreenHandle, ScreenSource,
};
pub use transport::{LiveClient, LiveConnection, MockClient, MockClientHandle};
pub use wire::{InboundMessage, MediaPayload, OutboundMedia};
