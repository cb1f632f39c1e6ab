//! Screen capture abstraction.

use async_trait::async_trait;

use crate::error::LiveError;

/// A raw captured screen frame.
///
/// Pixels are tightly packed 8-bit RGBA, row-major,
/// `width * height * 4` bytes. The encode path downscales and JPEG-encodes;
/// sources only need to hand over raw pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Tightly packed RGBA8 pixel data.
    pub pixels: Vec<u8>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,
}

impl CapturedFrame {
    /// Creates a frame from raw RGBA8 pixels.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Returns the byte length this frame's dimensions require.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Returns `true` if the pixel buffer matches the stated dimensions.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.expected_len() && self.width > 0 && self.height > 0
    }
}

/// A source of screen frames.
///
/// The session grabs one frame per timer tick for the lifetime of the
/// session. Implementations wrap whatever the platform offers (display
/// capture APIs, a window compositor, a remote desktop feed).
///
/// # Implementation Notes
///
/// - `open` performs the user-visible acquisition (picker dialogs,
///   permission prompts) and may fail with
///   [`LiveError::ScreenCaptureUnavailable`] or
///   [`LiveError::ScreenPermissionDenied`]
/// - `grab` returns [`LiveError::ScreenShareEnded`] once the share has been
///   revoked externally; the session treats that as a normal stop
/// - `close` is called during teardown and must tolerate being called
///   without a successful `open`, and more than once
#[async_trait]
pub trait ScreenSource: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Acquires the screen share.
    async fn open(&mut self) -> Result<(), LiveError>;

    /// Captures the current frame of the shared screen.
    async fn grab(&mut self) -> Result<CapturedFrame, LiveError>;

    /// Releases the screen share.
    async fn close(&mut self);
}
