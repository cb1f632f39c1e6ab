//! Reply playback: the output abstraction and gapless scheduling.

mod output;
mod scheduler;

pub use output::{AudioOutput, MockOutput, MockOutputHandle, PlaybackId, RecordedStart};
pub use scheduler::PlaybackScheduler;
