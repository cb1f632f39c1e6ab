//! Error types for tutor-live.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`LiveError`]): Prevent the session from starting, or
//!   describe why a running session tore itself down
//! - **Recoverable errors** ([`DecodeError`]): Bad inbound media that is
//!   dropped and surfaced via [`EventCallback`](crate::EventCallback)

/// Fatal errors that prevent a live session from starting.
///
/// These errors are returned from [`TutorLiveBuilder::start()`] and indicate
/// that the session cannot be created. Runtime issues (undecodable replies,
/// outbound backlog) are handled via the event callback instead.
///
/// [`TutorLiveBuilder::start()`]: crate::TutorLiveBuilder::start
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// The requested audio device was not found.
    #[error("device not found: {name}")]
    DeviceNotFound {
        /// Name of the device that wasn't found.
        name: String,
    },

    /// No default input device is configured on this system.
    #[error("no default input device configured")]
    NoDefaultDevice,

    /// Permission to capture microphone audio was denied.
    ///
    /// On macOS, check System Preferences > Security & Privacy > Microphone.
    #[error("permission denied for microphone capture (check OS settings)")]
    PermissionDenied,

    /// Screen capture is not available on this platform or configuration.
    #[error("screen capture unavailable: {reason}")]
    ScreenCaptureUnavailable {
        /// Why screen capture is unavailable.
        reason: String,
    },

    /// Permission to capture the screen was denied.
    #[error("screen capture permission denied (check OS settings)")]
    ScreenPermissionDenied,

    /// The shared screen went away while the session was running.
    ///
    /// Raised by [`ScreenSource::grab()`](crate::ScreenSource::grab) when the
    /// user revokes the share externally; the session treats it as a normal
    /// stop, not a failure.
    #[error("screen share ended")]
    ScreenShareEnded,

    /// The requested sample format is not supported by the device.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// The format that wasn't supported.
        format: String,
    },

    /// An error from the underlying audio library (CPAL).
    #[error("audio backend error: {0}")]
    BackendError(String),

    /// The remote session could not be opened, or failed mid-stream.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// What the transport reported.
        reason: String,
    },

    /// No microphone source was configured before starting.
    #[error("no microphone configured - call microphone() before start()")]
    NoMicrophoneConfigured,

    /// No screen source was configured before starting.
    #[error("no screen source configured - call screen() before start()")]
    NoScreenConfigured,

    /// No live client was configured before starting.
    #[error("no client configured - call client() before start()")]
    NoClientConfigured,

    /// No audio output was configured before starting.
    #[error("no audio output configured - call output() before start()")]
    NoOutputConfigured,
}

/// Errors raised while decoding inbound audio payloads.
///
/// Decode errors are recoverable - the session drops the offending message,
/// emits a [`SessionEvent::DecodeFailed`], and keeps running.
///
/// [`SessionEvent::DecodeFailed`]: crate::SessionEvent::DecodeFailed
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload length is not a whole number of 16-bit samples.
    #[error("PCM payload of {len} bytes is not a whole number of 16-bit samples")]
    OddByteLength {
        /// Length of the rejected payload in bytes.
        len: usize,
    },

    /// A buffer cannot have zero channels.
    #[error("zero channels requested")]
    ZeroChannels,

    /// The base64 wrapper could not be decoded.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
