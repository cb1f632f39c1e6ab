//! Sample format and channel conversion.

/// Converts an f32 sample to i16.
///
/// Input is clamped to [-1.0, 1.0] first, then scaled by 32768 and rounded,
/// with the positive extreme clamped to 32767. This keeps the quantization
/// error within one LSB of the decode scale even at full scale.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32768.0)
        .round()
        .clamp(-32768.0, 32767.0) as i16
}

/// Converts an i16 sample to f32.
///
/// Output will be in the range [-1.0, 1.0].
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Downmixes interleaved samples to mono by averaging the channels of each
/// frame.
///
/// Trailing samples that do not fill a whole frame are dropped. Zero
/// channels yields an empty vector.
pub fn downmix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => interleaved.to_vec(),
        n => interleaved
            .chunks_exact(n as usize)
            .map(|frame| frame.iter().sum::<f32>() / f32::from(n))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_full_range() {
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32768);
        assert_eq!(f32_to_i16(0.0), 0);
    }

    #[test]
    fn test_f32_to_i16_clamping() {
        assert_eq!(f32_to_i16(2.0), 32767);
        assert_eq!(f32_to_i16(-2.0), -32768);
    }

    #[test]
    fn test_i16_to_f32_full_range() {
        let max = i16_to_f32(32767);
        assert!((max - 0.99997).abs() < 0.001);

        let min = i16_to_f32(-32768);
        assert!((min - (-1.0)).abs() < 0.001);

        assert_eq!(i16_to_f32(0), 0.0);
    }

    #[test]
    fn test_roundtrip_within_one_lsb() {
        for &original in &[0.0f32, 0.5, -0.5, 0.9, -0.9, 0.123, 1.0, -1.0] {
            let back = i16_to_f32(f32_to_i16(original));
            assert!(
                (original - back).abs() <= 1.0 / 32768.0 + f32::EPSILON,
                "sample {original} came back as {back}"
            );
        }
    }

    #[test]
    fn test_downmix_stereo() {
        let stereo = vec![0.1f32, 0.3, 0.2, 0.4];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.2).abs() < 1e-6);
        assert!((mono[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_downmix_cancellation() {
        // Opposite values should cancel
        let stereo = vec![0.5f32, -0.5];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mono = vec![0.1f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn test_downmix_drops_partial_frame() {
        let samples = vec![0.2f32, 0.4, 0.6];
        let mono = downmix_to_mono(&samples, 2);
        assert_eq!(mono.len(), 1);
    }

    #[test]
    fn test_downmix_zero_channels() {
        assert!(downmix_to_mono(&[0.1, 0.2], 0).is_empty());
    }
}
