//! Audio format conversion utilities.
//!
//! This module provides utilities for converting between audio formats:
//! - Sample format conversion (f32 ↔ i16)
//! - Channel downmix (interleaved → mono)
//! - Sample rate conversion (resampling)
//! - Wire PCM encode/decode (base64-wrapped 16-bit LE)

mod convert;
pub mod pcm;
mod resample;

pub use convert::{downmix_to_mono, f32_to_i16, i16_to_f32};
pub use resample::resample;
