//! Gapless scheduling of reply audio on the output clock.

use crate::chunk::AudioBuffer;
use crate::playback::{AudioOutput, PlaybackId};

/// One playback the scheduler still considers audible.
#[derive(Debug, Clone, Copy)]
struct ActiveUnit {
    id: PlaybackId,
    start: f64,
    duration: f64,
}

/// Schedules reply fragments back to back on the output clock.
///
/// Fragments arrive as the model produces them, usually faster than they
/// play. Each fragment starts at the later of the previous fragment's end
/// and the current clock, so replies play without gaps and nothing is
/// scheduled in the past. An interruption stops everything audible and
/// rebases the timeline to the current clock.
pub struct PlaybackScheduler {
    output: Box<dyn AudioOutput>,
    next_start: f64,
    active: Vec<ActiveUnit>,
}

impl PlaybackScheduler {
    /// Creates a scheduler over the given output.
    #[must_use]
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            next_start: 0.0,
            active: Vec::new(),
        }
    }

    /// Where the next fragment would begin, in seconds on the output clock.
    #[must_use]
    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    /// Number of playbacks currently tracked as audible.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Schedules a decoded fragment for gapless playback.
    ///
    /// A zero-duration buffer is passed through without moving the
    /// timeline.
    pub fn schedule(&mut self, buffer: AudioBuffer) -> PlaybackId {
        self.prune_finished();

        let now = self.output.now();
        let start = self.next_start.max(now);
        let duration = buffer.duration().as_secs_f64();

        let id = self.output.start_at(buffer, start);
        tracing::trace!(%id, start, duration, "scheduled reply fragment");

        self.next_start = start + duration;
        self.active.push(ActiveUnit {
            id,
            start,
            duration,
        });
        id
    }

    /// Stops everything audible and rebases the timeline to the current
    /// clock. Returns how many playbacks were cancelled.
    pub fn interrupt(&mut self) -> usize {
        self.prune_finished();

        let cancelled = self.active.len();
        for unit in self.active.drain(..) {
            self.output.stop(unit.id);
        }
        self.next_start = self.output.now();

        tracing::debug!(cancelled, next_start = self.next_start, "playback interrupted");
        cancelled
    }

    /// Drops tracking entries whose playback has already ended.
    ///
    /// Keeps the active set bounded during long replies so an interruption
    /// only stops what is actually audible.
    pub fn prune_finished(&mut self) {
        let now = self.output.now();
        self.active.retain(|unit| unit.start + unit.duration > now);
    }

    /// Stops all playback, resets the timeline to zero, and releases the
    /// output.
    pub fn shutdown(&mut self) {
        for unit in self.active.drain(..) {
            self.output.stop(unit.id);
        }
        self.next_start = 0.0;
        self.output.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{MockOutput, MockOutputHandle};

    fn scheduler() -> (PlaybackScheduler, MockOutputHandle) {
        let output = MockOutput::new();
        let handle = output.handle();
        (PlaybackScheduler::new(Box::new(output)), handle)
    }

    fn buffer_secs(seconds: f64) -> AudioBuffer {
        let samples = (seconds * 24000.0).round() as usize;
        AudioBuffer::new(vec![0.0; samples], 24000, 1)
    }

    #[test]
    fn test_fragments_schedule_back_to_back() {
        let (mut scheduler, handle) = scheduler();

        scheduler.schedule(buffer_secs(0.5));
        scheduler.schedule(buffer_secs(0.5));
        scheduler.schedule(buffer_secs(0.5));

        assert_eq!(handle.start_times(), vec![0.0, 0.5, 1.0]);
        assert_eq!(scheduler.next_start(), 1.5);
    }

    #[test]
    fn test_schedule_clamps_to_clock() {
        let (mut scheduler, handle) = scheduler();

        scheduler.schedule(buffer_secs(0.5));

        // The reply stalled; the clock has moved past the queued audio.
        handle.set_clock(2.0);
        scheduler.schedule(buffer_secs(0.5));

        assert_eq!(handle.start_times(), vec![0.0, 2.0]);
        assert_eq!(scheduler.next_start(), 2.5);
    }

    #[test]
    fn test_interrupt_stops_and_rebases() {
        let (mut scheduler, handle) = scheduler();

        let a = scheduler.schedule(buffer_secs(0.5));
        let b = scheduler.schedule(buffer_secs(0.5));

        handle.set_clock(0.3);
        let cancelled = scheduler.interrupt();

        assert_eq!(cancelled, 2);
        assert_eq!(handle.stopped(), vec![a, b]);
        assert_eq!(scheduler.active_len(), 0);

        // The next fragment starts at the clock, not at the old tail.
        scheduler.schedule(buffer_secs(0.3));
        assert_eq!(handle.start_times()[2], 0.3);
    }

    #[test]
    fn test_interrupt_ignores_finished_playback() {
        let (mut scheduler, handle) = scheduler();

        scheduler.schedule(buffer_secs(0.5));
        handle.set_clock(0.9);

        let cancelled = scheduler.interrupt();
        assert_eq!(cancelled, 0);
        assert!(handle.stopped().is_empty());
        assert_eq!(scheduler.next_start(), 0.9);
    }

    #[test]
    fn test_prune_keeps_audible_tail() {
        let (mut scheduler, handle) = scheduler();

        scheduler.schedule(buffer_secs(0.5));
        scheduler.schedule(buffer_secs(0.5));

        handle.set_clock(0.7);
        scheduler.prune_finished();

        // First fragment ended at 0.5; the second plays until 1.0.
        assert_eq!(scheduler.active_len(), 1);
    }

    #[test]
    fn test_shutdown_stops_everything_and_resets() {
        let (mut scheduler, handle) = scheduler();

        let a = scheduler.schedule(buffer_secs(0.5));
        let b = scheduler.schedule(buffer_secs(0.5));
        scheduler.shutdown();

        assert_eq!(handle.stopped(), vec![a, b]);
        assert_eq!(handle.close_count(), 1);
        assert_eq!(scheduler.next_start(), 0.0);
        assert_eq!(scheduler.active_len(), 0);
    }

    #[test]
    fn test_zero_duration_buffer_is_harmless() {
        let (mut scheduler, handle) = scheduler();

        scheduler.schedule(buffer_secs(0.5));
        scheduler.schedule(AudioBuffer::new(Vec::new(), 24000, 1));
        scheduler.schedule(buffer_secs(0.5));

        // The empty buffer occupies no time on the timeline.
        assert_eq!(handle.start_times(), vec![0.0, 0.5, 0.5]);
        assert_eq!(scheduler.next_start(), 1.0);
    }
}
