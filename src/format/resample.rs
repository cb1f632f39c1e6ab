//! Sample rate conversion.
//!
//! This module provides basic resampling using linear interpolation.
//! For higher quality, consider using a dedicated resampling crate.

/// Resamples mono audio from one sample rate to another.
///
/// Uses linear interpolation, which is fast but may introduce artifacts
/// for large rate changes. Suitable for speech use cases.
///
/// # Arguments
///
/// * `samples` - Input samples (mono)
/// * `from_rate` - Source sample rate in Hz
/// * `to_rate` - Target sample rate in Hz
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < samples.len() {
            // Linear interpolation between two samples
            let s1 = f64::from(samples[src_idx]);
            let s2 = f64::from(samples[src_idx + 1]);
            (s1 + (s2 - s1) * frac) as f32
        } else if src_idx < samples.len() {
            // Last sample, no interpolation
            samples[src_idx]
        } else {
            // Beyond input, use last sample
            samples.last().copied().unwrap_or(0.0)
        };

        output.push(sample);
    }

    output
}
