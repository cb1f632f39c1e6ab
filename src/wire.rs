//! Wire-format types for the remote assistant session.
//!
//! Outbound media travels as `{ "media": { "mimeType": ..., "data": ... } }`
//! envelopes with base64 payloads. Inbound traffic of interest is the
//! `serverContent` envelope carrying reply audio, the interruption flag, and
//! turn boundaries. Transport implementations translate their own framing
//! into [`InboundMessage`] values; [`parse_server_content`] covers the JSON
//! shape used by the reference service.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// MIME type for outbound screen frames.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// MIME type for outbound microphone audio at the given rate.
#[must_use]
pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={sample_rate}")
}

/// A single outbound media payload: MIME-tagged base64 data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPayload {
    /// MIME type, e.g. `audio/pcm;rate=16000` or `image/jpeg`.
    pub mime_type: String,

    /// Base64-encoded media bytes (standard alphabet).
    pub data: String,
}

impl MediaPayload {
    /// Wraps raw 16-bit LE PCM bytes as an audio payload.
    #[must_use]
    pub fn audio(pcm_bytes: &[u8], sample_rate: u32) -> Self {
        Self {
            mime_type: pcm_mime_type(sample_rate),
            data: STANDARD.encode(pcm_bytes),
        }
    }

    /// Wraps encoded JPEG bytes as an image payload.
    #[must_use]
    pub fn jpeg(jpeg_bytes: &[u8]) -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE.to_string(),
            data: STANDARD.encode(jpeg_bytes),
        }
    }

    /// Decodes the base64 data back into raw bytes.
    pub fn decode_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    /// Returns `true` if this payload carries audio.
    #[must_use]
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

/// Outbound message envelope: `{ "media": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMedia {
    /// The media payload being sent.
    pub media: MediaPayload,
}

impl OutboundMedia {
    /// Wraps a payload in the outbound envelope.
    #[must_use]
    pub fn new(media: MediaPayload) -> Self {
        Self { media }
    }
}

impl From<MediaPayload> for OutboundMedia {
    fn from(media: MediaPayload) -> Self {
        Self { media }
    }
}

/// Inbound traffic relevant to the pipeline, already classified.
///
/// Transports deliver these through the receiver returned by
/// [`LiveClient::open()`](crate::LiveClient::open). Audio stays base64 on
/// purpose: decoding is the session's job, so one malformed payload becomes
/// a skipped message instead of a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// A fragment of the assistant's spoken reply, still base64-encoded
    /// 16-bit LE PCM at the output rate.
    Audio {
        /// Base64 payload from the wire.
        data: String,
    },

    /// The user barged in; scheduled playback must be flushed.
    Interrupted,

    /// The assistant finished its reply turn.
    TurnComplete,

    /// The remote closed the session without an error.
    Closed,

    /// The remote reported an error.
    Error(String),
}

/// Envelope of a server message, as delivered by the reference service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    /// Content payload; absent on control messages (setup acks etc.).
    pub server_content: Option<ServerContent>,
}

/// The `serverContent` body of a server message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    /// The assistant's in-progress turn, if this message carries media.
    #[serde(default)]
    pub model_turn: Option<ModelTurn>,

    /// Set when the user barged in over the assistant.
    #[serde(default)]
    pub interrupted: Option<bool>,

    /// Set when the assistant finished its turn.
    #[serde(default)]
    pub turn_complete: Option<bool>,
}

/// One turn of assistant output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTurn {
    /// Ordered content parts; reply audio arrives as inline data.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content part of a turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Inline media carried by this part, if any.
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

/// Base64 media embedded in a content part.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the embedded media.
    #[serde(default)]
    pub mime_type: Option<String>,

    /// Base64-encoded media bytes.
    pub data: String,
}

/// Classifies one server JSON message into pipeline-relevant messages.
///
/// Returns an empty vec for messages the pipeline does not care about
/// (setup acknowledgements and other control traffic). An interruption flag
/// is reported before any audio in the same message, so a flush always
/// lands ahead of the media that followed it.
pub fn parse_server_content(json: &str) -> Result<Vec<InboundMessage>, serde_json::Error> {
    let message: ServerMessage = serde_json::from_str(json)?;
    let mut out = Vec::new();

    let Some(content) = message.server_content else {
        return Ok(out);
    };

    if content.interrupted.unwrap_or(false) {
        out.push(InboundMessage::Interrupted);
    }

    if let Some(turn) = content.model_turn {
        if let Some(inline) = turn.parts.into_iter().find_map(|part| part.inline_data) {
            out.push(InboundMessage::Audio { data: inline.data });
        }
    }

    if content.turn_complete.unwrap_or(false) {
        out.push(InboundMessage::TurnComplete);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audio_payload_mime_and_data() {
        let payload = MediaPayload::audio(&[0x00, 0x01, 0x02, 0x03], 16000);
        assert_eq!(payload.mime_type, "audio/pcm;rate=16000");
        assert!(payload.is_audio());
        assert_eq!(payload.decode_data().unwrap(), vec![0x00, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_outbound_envelope_shape() {
        let message = OutboundMedia::new(MediaPayload::jpeg(&[0xFF, 0xD8]));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({ "media": { "mimeType": "image/jpeg", "data": "/9g=" } })
        );
    }

    #[test]
    fn test_parse_audio_message() {
        let json = r#"{
            "serverContent": {
                "modelTurn": {
                    "parts": [{ "inlineData": { "mimeType": "audio/pcm", "data": "AAAA" } }]
                }
            }
        }"#;
        let messages = parse_server_content(json).unwrap();
        assert_eq!(
            messages,
            vec![InboundMessage::Audio {
                data: "AAAA".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_interrupted_before_audio() {
        let json = r#"{
            "serverContent": {
                "interrupted": true,
                "modelTurn": {
                    "parts": [{ "inlineData": { "data": "AAAA" } }]
                }
            }
        }"#;
        let messages = parse_server_content(json).unwrap();
        assert_eq!(messages[0], InboundMessage::Interrupted);
        assert!(matches!(messages[1], InboundMessage::Audio { .. }));
    }

    #[test]
    fn test_parse_turn_complete() {
        let json = r#"{ "serverContent": { "turnComplete": true } }"#;
        let messages = parse_server_content(json).unwrap();
        assert_eq!(messages, vec![InboundMessage::TurnComplete]);
    }

    #[test]
    fn test_parse_control_message_is_ignored() {
        let messages = parse_server_content(r#"{ "setupComplete": {} }"#).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_parse_skips_partless_turn() {
        let json = r#"{ "serverContent": { "modelTurn": { "parts": [{}] } } }"#;
        let messages = parse_server_content(json).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(parse_server_content("not json").is_err());
    }
}
