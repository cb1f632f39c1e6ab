//! Screen frame downscaling and JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::config::FrameScaling;
use crate::source::CapturedFrame;
use crate::wire::MediaPayload;

/// Computes the encoded dimensions for a frame under a scaling policy.
pub(crate) fn scale_dimensions(width: u32, height: u32, scaling: FrameScaling) -> (u32, u32) {
    match scaling {
        FrameScaling::Factor(factor) => {
            // Non-positive and NaN factors disable scaling, like 1.0.
            let factor = if factor > 0.0 { factor.min(1.0) } else { 1.0 };
            (
                ((width as f32 * factor).round() as u32).max(1),
                ((height as f32 * factor).round() as u32).max(1),
            )
        }
        FrameScaling::MaxDimension(cap) => {
            let longest = width.max(height);
            if longest <= cap {
                return (width, height);
            }
            let scale = cap as f32 / longest as f32;
            (
                ((width as f32 * scale).round() as u32).max(1),
                ((height as f32 * scale).round() as u32).max(1),
            )
        }
    }
}

/// Downscales and JPEG-encodes a captured frame off the async runtime.
///
/// Returns `None` when the frame is malformed or encoding fails; the caller
/// skips the frame and keeps going.
pub(crate) async fn encode_frame(
    frame: CapturedFrame,
    scaling: FrameScaling,
    quality: u8,
) -> Option<MediaPayload> {
    match tokio::task::spawn_blocking(move || encode_frame_blocking(frame, scaling, quality)).await
    {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("frame encode task failed: {e}");
            None
        }
    }
}

fn encode_frame_blocking(
    frame: CapturedFrame,
    scaling: FrameScaling,
    quality: u8,
) -> Option<MediaPayload> {
    if !frame.is_well_formed() {
        tracing::warn!(
            width = frame.width,
            height = frame.height,
            bytes = frame.pixels.len(),
            "dropping malformed frame"
        );
        return None;
    }

    let (width, height) = (frame.width, frame.height);
    let rgba = RgbaImage::from_raw(width, height, frame.pixels)?;

    let (target_width, target_height) = scale_dimensions(width, height, scaling);
    let rgba = if (target_width, target_height) == (width, height) {
        rgba
    } else {
        image::imageops::resize(&rgba, target_width, target_height, FilterType::Triangle)
    };

    // JPEG carries no alpha channel; flatten to RGB first.
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    if let Err(e) = encoder.encode_image(&rgb) {
        tracing::warn!("jpeg encode failed: {e}");
        return None;
    }

    Some(MediaPayload::jpeg(&encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::JPEG_MIME_TYPE;

    fn gradient_frame(width: u32, height: u32) -> CapturedFrame {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 31) as u8);
                pixels.push((y * 31) as u8);
                pixels.push(128);
                pixels.push(255);
            }
        }
        CapturedFrame::new(pixels, width, height)
    }

    #[test]
    fn test_scale_factor_halves_dimensions() {
        let dims = scale_dimensions(1024, 768, FrameScaling::Factor(0.5));
        assert_eq!(dims, (512, 384));
    }

    #[test]
    fn test_scale_factor_clamps_invalid_values() {
        assert_eq!(scale_dimensions(100, 50, FrameScaling::Factor(1.5)), (100, 50));
        assert_eq!(scale_dimensions(100, 50, FrameScaling::Factor(0.0)), (100, 50));
        assert_eq!(scale_dimensions(100, 50, FrameScaling::Factor(-0.5)), (100, 50));
    }

    #[test]
    fn test_scale_factor_never_reaches_zero() {
        assert_eq!(scale_dimensions(4, 3, FrameScaling::Factor(0.1)), (1, 1));
    }

    #[test]
    fn test_max_dimension_shrinks_proportionally() {
        let dims = scale_dimensions(1920, 1080, FrameScaling::MaxDimension(896));
        assert_eq!(dims, (896, 504));
    }

    #[test]
    fn test_max_dimension_leaves_small_frames_alone() {
        let dims = scale_dimensions(640, 480, FrameScaling::MaxDimension(1280));
        assert_eq!(dims, (640, 480));
    }

    #[test]
    fn test_max_dimension_applies_to_taller_frames() {
        let dims = scale_dimensions(1080, 1920, FrameScaling::MaxDimension(960));
        assert_eq!(dims, (540, 960));
    }

    #[tokio::test]
    async fn test_encode_frame_produces_jpeg() {
        let frame = gradient_frame(8, 8);
        let payload = encode_frame(frame, FrameScaling::Factor(1.0), 40)
            .await
            .unwrap();

        assert_eq!(payload.mime_type, JPEG_MIME_TYPE);
        let bytes = payload.decode_data().unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_encode_frame_downscales() {
        let frame = gradient_frame(16, 8);
        let payload = encode_frame(frame, FrameScaling::Factor(0.5), 40)
            .await
            .unwrap();

        let bytes = payload.decode_data().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[tokio::test]
    async fn test_encode_frame_rejects_malformed_pixels() {
        let frame = CapturedFrame::new(vec![0u8; 10], 8, 8);
        assert!(
            encode_frame(frame, FrameScaling::Factor(1.0), 40)
                .await
                .is_none()
        );
    }
}
