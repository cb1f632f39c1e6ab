//! Audio output abstraction.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::chunk::AudioBuffer;

/// Identifies one scheduled playback on an output.
///
/// Outputs mint an id per `start_at` call; the scheduler uses it to stop
/// that playback early on interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(u64);

impl PlaybackId {
    /// Creates an id from a raw value. Output backends mint these.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A clocked audio sink that plays buffers at scheduled times.
///
/// The clock starts at 0.0 when the output is created and advances in
/// seconds while it lives. All methods are called from the session loop and
/// must return quickly; hardware backends front the actual device with their
/// own command queue.
pub trait AudioOutput: Send {
    /// Current position of the output clock, in seconds.
    fn now(&self) -> f64;

    /// Begins playing `buffer` at time `when` on the output clock.
    ///
    /// A `when` already in the past means "as soon as possible".
    fn start_at(&mut self, buffer: AudioBuffer, when: f64) -> PlaybackId;

    /// Stops one playback early. Unknown or already-finished ids are
    /// ignored.
    fn stop(&mut self, id: PlaybackId);

    /// Releases the output device. Safe to call more than once.
    fn close(&mut self);
}

/// One `start_at` call as seen by a [`MockOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStart {
    /// The id the mock minted for this playback.
    pub id: PlaybackId,
    /// The requested start time in seconds.
    pub when: f64,
    /// Duration of the scheduled buffer in seconds.
    pub duration: f64,
}

#[derive(Default)]
struct OutputShared {
    clock: f64,
    next_id: u64,
    starts: Vec<RecordedStart>,
    stopped: Vec<PlaybackId>,
    closes: usize,
}

/// An [`AudioOutput`] that records calls against a manually-driven clock.
///
/// Tests move the clock with [`MockOutputHandle::advance`] and assert on the
/// recorded starts and stops.
#[derive(Default)]
pub struct MockOutput {
    shared: Arc<Mutex<OutputShared>>,
}

impl MockOutput {
    /// Creates a mock output with its clock at 0.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for driving the clock and observing calls.
    pub fn handle(&self) -> MockOutputHandle {
        MockOutputHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl AudioOutput for MockOutput {
    fn now(&self) -> f64 {
        self.shared.lock().clock
    }

    fn start_at(&mut self, buffer: AudioBuffer, when: f64) -> PlaybackId {
        let mut shared = self.shared.lock();
        let id = PlaybackId::new(shared.next_id);
        shared.next_id += 1;
        shared.starts.push(RecordedStart {
            id,
            when,
            duration: buffer.duration().as_secs_f64(),
        });
        id
    }

    fn stop(&mut self, id: PlaybackId) {
        self.shared.lock().stopped.push(id);
    }

    fn close(&mut self) {
        self.shared.lock().closes += 1;
    }
}

/// Observer and clock-driver handle for a [`MockOutput`].
#[derive(Clone)]
pub struct MockOutputHandle {
    shared: Arc<Mutex<OutputShared>>,
}

impl MockOutputHandle {
    /// Sets the clock to an absolute position in seconds.
    pub fn set_clock(&self, seconds: f64) {
        self.shared.lock().clock = seconds;
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        self.shared.lock().clock += seconds;
    }

    /// Current clock position in seconds.
    pub fn now(&self) -> f64 {
        self.shared.lock().clock
    }

    /// All `start_at` calls so far, in order.
    pub fn starts(&self) -> Vec<RecordedStart> {
        self.shared.lock().starts.clone()
    }

    /// Requested start times of all `start_at` calls, in order.
    pub fn start_times(&self) -> Vec<f64> {
        self.shared.lock().starts.iter().map(|s| s.when).collect()
    }

    /// All ids passed to `stop`, in order.
    pub fn stopped(&self) -> Vec<PlaybackId> {
        self.shared.lock().stopped.clone()
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.shared.lock().closes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_second_buffer() -> AudioBuffer {
        AudioBuffer::new(vec![0.0; 12000], 24000, 1)
    }

    #[test]
    fn test_mock_output_mints_distinct_ids() {
        let mut output = MockOutput::new();
        let a = output.start_at(half_second_buffer(), 0.0);
        let b = output.start_at(half_second_buffer(), 0.5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_mock_output_clock() {
        let output = MockOutput::new();
        let handle = output.handle();

        assert_eq!(output.now(), 0.0);
        handle.advance(0.25);
        handle.advance(0.25);
        assert_eq!(output.now(), 0.5);

        handle.set_clock(2.0);
        assert_eq!(output.now(), 2.0);
    }

    #[test]
    fn test_mock_output_records_calls() {
        let mut output = MockOutput::new();
        let handle = output.handle();

        let id = output.start_at(half_second_buffer(), 1.5);
        output.stop(id);
        output.close();

        let starts = handle.starts();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].when, 1.5);
        assert!((starts[0].duration - 0.5).abs() < 1e-9);
        assert_eq!(handle.stopped(), vec![id]);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_playback_id_display() {
        let id = PlaybackId::new(7);
        assert_eq!(format!("{id}"), "7");
        assert_eq!(id.as_u64(), 7);
    }
}
