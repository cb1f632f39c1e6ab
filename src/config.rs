//! Configuration types for live sessions.

use std::time::Duration;

/// Downscaling policy applied to captured screen frames before JPEG encoding.
///
/// Either policy is acceptable; which one to use is a deployment choice.
/// Scaling happens before encoding, so smaller outputs also encode faster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameScaling {
    /// Multiply both dimensions by a factor in `(0.0, 1.0]`.
    ///
    /// Values outside that range are clamped; a factor of 1.0 disables
    /// scaling.
    Factor(f32),

    /// Shrink proportionally until the longer edge fits within the cap.
    ///
    /// Frames already within the cap are left untouched.
    MaxDimension(u32),
}

impl Default for FrameScaling {
    fn default() -> Self {
        Self::Factor(0.5)
    }
}

/// Configuration for session behavior.
///
/// Use [`SessionConfig::default()`] for sensible defaults, or customize as
/// needed.
///
/// # Example
///
/// ```
/// use tutor_live::{FrameScaling, SessionConfig};
/// use std::time::Duration;
///
/// let config = SessionConfig {
///     frame_interval: Duration::from_millis(1000),
///     frame_scaling: FrameScaling::MaxDimension(1280),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sample rate of captured microphone audio, in Hz.
    ///
    /// Default: 16000
    pub input_sample_rate: u32,

    /// Sample rate of inbound assistant audio, in Hz.
    ///
    /// Default: 24000
    pub output_sample_rate: u32,

    /// Number of samples per captured microphone chunk.
    ///
    /// Each chunk is encoded and sent as one outbound message. Smaller
    /// values reduce latency but increase message overhead.
    /// Default: 4096
    pub capture_chunk_size: usize,

    /// Interval between captured screen frames.
    ///
    /// Default: 500ms (2 frames per second)
    pub frame_interval: Duration,

    /// JPEG quality for encoded screen frames, 1-100.
    ///
    /// Default: 40
    pub jpeg_quality: u8,

    /// Downscaling applied to frames before encoding.
    ///
    /// Default: [`FrameScaling::Factor`] 0.5
    pub frame_scaling: FrameScaling,

    /// Capacity of the outbound send queue.
    ///
    /// The queue absorbs media produced while the remote session is still
    /// opening and during transient send slowdowns. If it fills, the newest
    /// payload is dropped and a [`SessionEvent::OutboundOverflow`] is
    /// emitted.
    /// Default: 64
    ///
    /// [`SessionEvent::OutboundOverflow`]: crate::SessionEvent::OutboundOverflow
    pub outbound_capacity: usize,

    /// Request echo cancellation from the microphone backend.
    ///
    /// Default: true
    pub echo_cancellation: bool,

    /// Request noise suppression from the microphone backend.
    ///
    /// Default: true
    pub noise_suppression: bool,

    /// Request automatic gain control from the microphone backend.
    ///
    /// Default: true
    pub auto_gain: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_sample_rate: 16000,
            output_sample_rate: 24000,
            capture_chunk_size: 4096,
            frame_interval: Duration::from_millis(500),
            jpeg_quality: 40,
            frame_scaling: FrameScaling::default(),
            outbound_capacity: 64,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

impl SessionConfig {
    /// Builds the capture request handed to a microphone source.
    #[must_use]
    pub fn capture_spec(&self) -> CaptureSpec {
        CaptureSpec {
            sample_rate: self.input_sample_rate,
            chunk_size: self.capture_chunk_size,
            echo_cancellation: self.echo_cancellation,
            noise_suppression: self.noise_suppression,
            auto_gain: self.auto_gain,
        }
    }
}

/// What a session asks of a [`MicrophoneSource`](crate::MicrophoneSource).
///
/// The processing hints are requests, not requirements - backends without
/// echo cancellation or gain control simply ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSpec {
    /// Sample rate the source must deliver, in Hz.
    pub sample_rate: u32,

    /// Samples per delivered [`AudioChunk`](crate::AudioChunk).
    pub chunk_size: usize,

    /// Echo cancellation hint.
    pub echo_cancellation: bool,

    /// Noise suppression hint.
    pub noise_suppression: bool,

    /// Automatic gain control hint.
    pub auto_gain: bool,
}

/// How the assistant replies: spoken audio or plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseModality {
    /// Spoken replies as PCM audio (the normal mode for this pipeline).
    #[default]
    Audio,

    /// Text-only replies.
    Text,
}

impl ResponseModality {
    /// Wire name of this modality.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "AUDIO",
            Self::Text => "TEXT",
        }
    }
}

/// Parameters for opening the remote assistant session.
///
/// Everything here is static configuration; nothing is renegotiated after
/// the session opens.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    /// Model identifier requested from the remote service.
    pub model: String,

    /// Voice the assistant speaks with.
    pub voice: String,

    /// System prompt establishing the assistant's role.
    pub system_prompt: String,

    /// Reply modality. Defaults to audio.
    pub response_modality: ResponseModality,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            model: "models/gemini-2.0-flash-exp".to_string(),
            voice: "Puck".to_string(),
            system_prompt: String::new(),
            response_modality: ResponseModality::Audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.input_sample_rate, 16000);
        assert_eq!(config.output_sample_rate, 24000);
        assert_eq!(config.capture_chunk_size, 4096);
        assert_eq!(config.frame_interval, Duration::from_millis(500));
        assert_eq!(config.jpeg_quality, 40);
        assert_eq!(config.outbound_capacity, 64);
    }

    #[test]
    fn test_capture_spec_from_config() {
        let config = SessionConfig {
            input_sample_rate: 8000,
            capture_chunk_size: 2048,
            echo_cancellation: false,
            ..Default::default()
        };
        let spec = config.capture_spec();
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.chunk_size, 2048);
        assert!(!spec.echo_cancellation);
        assert!(spec.noise_suppression);
    }

    #[test]
    fn test_frame_scaling_default() {
        assert_eq!(FrameScaling::default(), FrameScaling::Factor(0.5));
    }

    #[test]
    fn test_response_modality_wire_names() {
        assert_eq!(ResponseModality::Audio.as_str(), "AUDIO");
        assert_eq!(ResponseModality::Text.as_str(), "TEXT");
        assert_eq!(ResponseModality::default(), ResponseModality::Audio);
    }
}
