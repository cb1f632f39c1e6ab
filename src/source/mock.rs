//! Mock capture sources for testing without hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::chunk::AudioChunk;
use crate::config::CaptureSpec;
use crate::error::LiveError;
use crate::source::{CapturedFrame, MicrophoneSource, ScreenSource};

/// A mock microphone that delivers pre-generated audio.
///
/// All audio is queued before `open` returns, so tests can drive a full
/// session without hardware or timing dependence. Generated samples are cut
/// into `spec.chunk_size` chunks at `open`; any remainder shorter than one
/// chunk is dropped, matching the real capture path.
///
/// # Example
///
/// ```
/// use tutor_live::source::MockMicrophone;
///
/// let mut mock = MockMicrophone::new(16000);
///
/// // Queue 100ms of silence, then 100ms of a 440Hz sine wave
/// mock.generate_silence(100);
/// mock.generate_sine(440.0, 100);
/// ```
pub struct MockMicrophone {
    sample_rate: u32,
    samples: Vec<f32>,
    open_error: Option<LiveError>,
    chunk_tx: Option<mpsc::Sender<AudioChunk>>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MockMicrophone {
    /// Creates a mock microphone generating at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
            open_error: None,
            chunk_tx: None,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a mock microphone whose next `open` fails with `err`.
    pub fn failing(err: LiveError) -> Self {
        let mut mock = Self::new(16000);
        mock.open_error = Some(err);
        mock
    }

    /// Returns a handle for observing lifecycle calls.
    pub fn handle(&self) -> MockMicrophoneHandle {
        MockMicrophoneHandle {
            opens: Arc::clone(&self.opens),
            closes: Arc::clone(&self.closes),
        }
    }

    /// Queues silence for the given duration in milliseconds.
    pub fn generate_silence(&mut self, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        self.samples
            .extend(std::iter::repeat(0.0f32).take(num_samples));
    }

    /// Queues a sine wave at the given frequency for the given duration.
    pub fn generate_sine(&mut self, frequency: f64, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        let sample_rate = f64::from(self.sample_rate);

        for i in 0..num_samples {
            let t = i as f64 / sample_rate;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin();
            self.samples.push(value as f32);
        }
    }

    /// Queues raw samples directly.
    pub fn add_samples(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Returns the duration of queued samples.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        (u64::from(self.sample_rate) * duration_ms / 1000) as usize
    }
}

#[async_trait]
impl MicrophoneSource for MockMicrophone {
    fn name(&self) -> &str {
        "mock microphone"
    }

    async fn open(&mut self, spec: &CaptureSpec) -> Result<mpsc::Receiver<AudioChunk>, LiveError> {
        self.opens.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = self.open_error.take() {
            return Err(err);
        }

        let chunk_count = self.samples.len() / spec.chunk_size;
        let (tx, rx) = mpsc::channel(chunk_count.max(1));

        for (index, window) in self.samples.chunks_exact(spec.chunk_size).enumerate() {
            let timestamp = Duration::from_secs_f64(
                (index * spec.chunk_size) as f64 / f64::from(spec.sample_rate),
            );
            let chunk = AudioChunk::new(window.to_vec(), timestamp, spec.sample_rate);
            // Capacity covers every chunk, so this cannot fail.
            let _ = tx.try_send(chunk);
        }

        // Keep the sender alive: the channel stays open until close().
        self.chunk_tx = Some(tx);
        Ok(rx)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
        self.chunk_tx = None;
    }
}

/// Observer handle for a [`MockMicrophone`].
#[derive(Clone)]
pub struct MockMicrophoneHandle {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MockMicrophoneHandle {
    /// How many times `open` was called.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

/// A mock screen that produces deterministic RGBA test frames.
///
/// Each frame is a gradient keyed to the frame index, so consecutive grabs
/// yield distinguishable pixels. `end_after` simulates the user revoking the
/// share mid-session.
pub struct MockScreen {
    width: u32,
    height: u32,
    frame_index: u64,
    opened: bool,
    open_error: Option<LiveError>,
    end_after: Option<usize>,
    grabs_done: usize,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    grabs: Arc<AtomicUsize>,
}

impl MockScreen {
    /// Creates a mock screen with the given frame dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
            opened: false,
            open_error: None,
            end_after: None,
            grabs_done: 0,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            grabs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a mock screen whose next `open` fails with `err`.
    pub fn failing(err: LiveError) -> Self {
        let mut mock = Self::new(2, 2);
        mock.open_error = Some(err);
        mock
    }

    /// Ends the share after `grabs` successful grabs.
    #[must_use]
    pub fn end_after(mut self, grabs: usize) -> Self {
        self.end_after = Some(grabs);
        self
    }

    /// Returns a handle for observing lifecycle calls.
    pub fn handle(&self) -> MockScreenHandle {
        MockScreenHandle {
            opens: Arc::clone(&self.opens),
            closes: Arc::clone(&self.closes),
            grabs: Arc::clone(&self.grabs),
        }
    }

    fn make_frame(&self) -> CapturedFrame {
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push((x * 255 / self.width.max(1)) as u8);
                pixels.push((y * 255 / self.height.max(1)) as u8);
                pixels.push((self.frame_index % 256) as u8);
                pixels.push(255);
            }
        }
        CapturedFrame::new(pixels, self.width, self.height)
    }
}

#[async_trait]
impl ScreenSource for MockScreen {
    fn name(&self) -> &str {
        "mock screen"
    }

    async fn open(&mut self) -> Result<(), LiveError> {
        self.opens.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = self.open_error.take() {
            return Err(err);
        }

        self.opened = true;
        Ok(())
    }

    async fn grab(&mut self) -> Result<CapturedFrame, LiveError> {
        self.grabs.fetch_add(1, Ordering::Relaxed);

        if !self.opened {
            return Err(LiveError::ScreenCaptureUnavailable {
                reason: "grab before open".to_string(),
            });
        }

        if let Some(limit) = self.end_after {
            if self.grabs_done >= limit {
                return Err(LiveError::ScreenShareEnded);
            }
        }

        let frame = self.make_frame();
        self.grabs_done += 1;
        self.frame_index += 1;
        Ok(frame)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
        self.opened = false;
    }
}

/// Observer handle for a [`MockScreen`].
#[derive(Clone)]
pub struct MockScreenHandle {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    grabs: Arc<AtomicUsize>,
}

impl MockScreenHandle {
    /// How many times `open` was called.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }

    /// How many times `grab` was called.
    pub fn grab_count(&self) -> usize {
        self.grabs.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn test_mock_microphone_silence() {
        let mut mock = MockMicrophone::new(16000);
        mock.generate_silence(100);

        assert_eq!(mock.samples.len(), 1600); // 16000 * 0.1 = 1600
        assert!(mock.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mock_microphone_sine() {
        let mut mock = MockMicrophone::new(16000);
        mock.generate_sine(440.0, 100);

        assert_eq!(mock.samples.len(), 1600);

        // Sine wave should have positive and negative values
        assert!(mock.samples.iter().any(|&s| s > 0.0));
        assert!(mock.samples.iter().any(|&s| s < 0.0));
    }

    #[test]
    fn test_mock_microphone_duration() {
        let mut mock = MockMicrophone::new(16000);
        mock.generate_silence(500);

        assert_eq!(mock.duration(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_mock_microphone_delivers_chunks() {
        let spec = SessionConfig::default().capture_spec();
        let mut mock = MockMicrophone::new(16000);
        // 600ms = 9600 samples = two full 4096-sample chunks plus remainder
        mock.generate_sine(440.0, 600);

        let mut rx = mock.open(&spec).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.frame_count(), 4096);
        assert_eq!(first.timestamp, Duration::ZERO);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.frame_count(), 4096);
        assert_eq!(second.timestamp, Duration::from_secs_f64(4096.0 / 16000.0));

        // The remainder is dropped; the channel stays open until close().
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mock_microphone_close_ends_channel() {
        let spec = SessionConfig::default().capture_spec();
        let mut mock = MockMicrophone::new(16000);
        let mut rx = mock.open(&spec).await.unwrap();

        mock.close().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_mock_microphone_failing() {
        let spec = SessionConfig::default().capture_spec();
        let mut mock = MockMicrophone::failing(LiveError::PermissionDenied);
        let handle = mock.handle();

        let result = mock.open(&spec).await;
        assert!(matches!(result, Err(LiveError::PermissionDenied)));
        assert_eq!(handle.open_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_screen_frames_differ() {
        let mut screen = MockScreen::new(8, 4);
        screen.open().await.unwrap();

        let first = screen.grab().await.unwrap();
        assert!(first.is_well_formed());
        assert_eq!((first.width, first.height), (8, 4));

        let second = screen.grab().await.unwrap();
        assert_ne!(first.pixels, second.pixels);
    }

    #[tokio::test]
    async fn test_mock_screen_grab_before_open() {
        let mut screen = MockScreen::new(8, 4);
        let result = screen.grab().await;
        assert!(matches!(
            result,
            Err(LiveError::ScreenCaptureUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_screen_end_after() {
        let mut screen = MockScreen::new(4, 4).end_after(1);
        screen.open().await.unwrap();

        assert!(screen.grab().await.is_ok());
        assert!(matches!(
            screen.grab().await,
            Err(LiveError::ScreenShareEnded)
        ));
    }

    #[tokio::test]
    async fn test_mock_screen_counts() {
        let mut screen = MockScreen::new(4, 4);
        let handle = screen.handle();

        screen.open().await.unwrap();
        let _ = screen.grab().await;
        screen.close().await;
        screen.close().await;

        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.grab_count(), 1);
        assert_eq!(handle.close_count(), 2);
    }
}
