//! Audio data containers with metadata.

use std::sync::Arc;
use std::time::Duration;

/// A discrete block of captured microphone audio.
///
/// `AudioChunk` is the fundamental unit of outbound audio passed through the
/// pipeline. Chunks are mono 32-bit float PCM at the capture rate, cut to a
/// fixed window size by the source that produced them.
///
/// Samples are stored in an `Arc<Vec<f32>>` for cheap cloning between the
/// capture side and the encoder.
///
/// # Example
///
/// ```
/// use tutor_live::AudioChunk;
/// use std::time::Duration;
///
/// let chunk = AudioChunk::new(vec![0.0f32; 1600], Duration::from_millis(0), 16000);
/// assert_eq!(chunk.duration(), Duration::from_millis(100));
///
/// let chunk2 = chunk.clone(); // Cheap clone - shares sample data
/// # assert_eq!(chunk2.frame_count(), 1600);
/// ```
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Mono PCM samples, nominally in `[-1.0, 1.0]`.
    ///
    /// Wrapped in `Arc` for cheap sharing; values outside the nominal range
    /// are clamped at encode time.
    pub samples: Arc<Vec<f32>>,

    /// Timestamp from the start of the capture session.
    pub timestamp: Duration,

    /// Sample rate in Hz (e.g., 16000).
    pub sample_rate: u32,
}

impl AudioChunk {
    /// Creates a new `AudioChunk` with the given parameters.
    pub fn new(samples: Vec<f32>, timestamp: Duration, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            timestamp,
            sample_rate,
        }
    }

    /// Creates a new `AudioChunk` from pre-wrapped Arc samples.
    pub fn from_arc(samples: Arc<Vec<f32>>, timestamp: Duration, sample_rate: u32) -> Self {
        Self {
            samples,
            timestamp,
            sample_rate,
        }
    }

    /// Returns the duration of this chunk.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Returns the number of audio frames in this chunk.
    ///
    /// Chunks are mono, so one frame is one sample.
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if this chunk contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decoded audio ready for playback.
///
/// `AudioBuffer` is the inbound counterpart of [`AudioChunk`]: interleaved
/// 32-bit float PCM at the playback rate, produced by the decoder and handed
/// to an [`AudioOutput`](crate::AudioOutput) as a single schedulable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved PCM samples, one `f32` per channel per frame.
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 24000).
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
}

impl AudioBuffer {
    /// Creates a new `AudioBuffer` with the given parameters.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Returns the duration of this buffer.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / self.channels as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    /// Returns the number of audio frames in this buffer.
    ///
    /// A frame contains one sample per channel.
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Returns `true` if this buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_duration_16khz() {
        let chunk = AudioChunk::new(vec![0.0; 1600], Duration::ZERO, 16000);
        assert_eq!(chunk.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_chunk_zero_sample_rate() {
        let chunk = AudioChunk::new(vec![0.0; 100], Duration::ZERO, 0);
        assert_eq!(chunk.duration(), Duration::ZERO);
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = AudioChunk::new(vec![], Duration::ZERO, 16000);
        assert!(chunk.is_empty());
        assert_eq!(chunk.frame_count(), 0);
        assert_eq!(chunk.duration(), Duration::ZERO);
    }

    #[test]
    fn test_buffer_duration_mono_24khz() {
        let buf = AudioBuffer::new(vec![0.0; 2400], 24000, 1);
        assert_eq!(buf.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_buffer_duration_stereo() {
        let buf = AudioBuffer::new(vec![0.0; 9600], 48000, 2);
        // 9600 samples / 2 channels = 4800 frames / 48000 Hz = 100ms
        assert_eq!(buf.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_buffer_frame_count() {
        let buf = AudioBuffer::new(vec![0.0; 200], 24000, 2);
        assert_eq!(buf.frame_count(), 100);
    }

    #[test]
    fn test_buffer_zero_channels() {
        let buf = AudioBuffer::new(vec![0.0; 100], 24000, 0);
        assert_eq!(buf.duration(), Duration::ZERO);
        assert_eq!(buf.frame_count(), 0);
    }
}
