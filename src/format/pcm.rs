//! Wire PCM encoding and decoding.
//!
//! Outbound: captured float chunks become base64 16-bit LE PCM payloads
//! tagged with their sample rate. Inbound: base64 16-bit LE PCM from the
//! assistant becomes [`AudioBuffer`]s at the playback rate.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::chunk::{AudioBuffer, AudioChunk};
use crate::error::DecodeError;
use crate::format::{f32_to_i16, i16_to_f32};
use crate::wire::MediaPayload;

/// Encodes a captured chunk as a base64 PCM media payload.
///
/// Samples are clamped to [-1.0, 1.0], quantized to 16-bit LE, and
/// base64-wrapped; the MIME type carries the chunk's sample rate. This is a
/// pure function of the chunk.
#[must_use]
pub fn encode_chunk(chunk: &AudioChunk) -> MediaPayload {
    let mut bytes = Vec::with_capacity(chunk.samples.len() * 2);
    for &sample in chunk.samples.iter() {
        bytes.extend_from_slice(&f32_to_i16(sample).to_le_bytes());
    }
    MediaPayload::audio(&bytes, chunk.sample_rate)
}

/// Decodes raw 16-bit LE PCM bytes into a playback buffer.
///
/// An empty input decodes to a valid zero-duration buffer. Odd-length input
/// and zero channels are rejected.
pub fn decode(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::ZeroChannels);
    }
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddByteLength { len: bytes.len() });
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16_to_f32(i16::from_le_bytes([pair[0], pair[1]])))
        .collect();

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

/// Decodes a base64 PCM payload into a playback buffer.
///
/// This is the inbound path for assistant replies, which arrive base64
/// encoded on the wire.
pub fn decode_base64(
    data: &str,
    sample_rate: u32,
    channels: u16,
) -> Result<AudioBuffer, DecodeError> {
    let bytes = STANDARD.decode(data)?;
    decode(&bytes, sample_rate, channels)
}
