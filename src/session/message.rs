//! Outbound messages
//!
//! The JSON-shaped payload a session hands to its sink. One struct
//! covers every message kind; absent fields are skipped during
//! serialization so heartbeats stay tiny and result frames carry the
//! full set.

use std::collections::BTreeMap;

use serde::Serialize;

/// Discriminator for non-result messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Periodic liveness signal
    Heartbeat,
    /// No frame was available this iteration
    EmptyFrame,
    /// An iteration failed to process
    ProcessingError,
}

/// One message to a consumer
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutboundMessage {
    /// Session status, e.g. "connected"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Human-readable detail accompanying a status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Message kind for non-result messages
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,

    /// Consecutive failed iterations, on empty-frame and error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,

    /// Encoded, annotated frame payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,

    /// Seconds the model spent on the frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_time: Option<f64>,

    /// Seconds the whole iteration took
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,

    /// The session's configured target sample rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    /// Number of detected objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_count: Option<usize>,

    /// Detected objects per class label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<BTreeMap<String, u32>>,

    /// Capture time of the frame, fractional seconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl OutboundMessage {
    /// A status message, e.g. after a successful subscribe
    pub fn status(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// A plain error message
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// A heartbeat
    pub fn heartbeat() -> Self {
        Self {
            kind: Some(MessageKind::Heartbeat),
            ..Default::default()
        }
    }

    /// An empty-frame notice with the current retry count
    pub fn empty_frame(retry_count: u32) -> Self {
        Self {
            kind: Some(MessageKind::EmptyFrame),
            retry_count: Some(retry_count),
            ..Default::default()
        }
    }

    /// A processing error with the current retry count
    pub fn processing_error(error: impl Into<String>, retry_count: u32) -> Self {
        Self {
            kind: Some(MessageKind::ProcessingError),
            error: Some(error.into()),
            retry_count: Some(retry_count),
            ..Default::default()
        }
    }

    /// Serialize to the wire JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_is_minimal() {
        let json = serde_json::to_value(OutboundMessage::heartbeat()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 1);
        assert_eq!(json["type"], "heartbeat");
    }

    #[test]
    fn test_kind_names_are_snake_case() {
        let json = serde_json::to_value(OutboundMessage::empty_frame(3)).unwrap();
        assert_eq!(json["type"], "empty_frame");
        assert_eq!(json["retry_count"], 3);

        let json = serde_json::to_value(OutboundMessage::processing_error("boom", 2)).unwrap();
        assert_eq!(json["type"], "processing_error");
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn test_result_message_round_trips_fields() {
        let mut classes = BTreeMap::new();
        classes.insert("person".to_string(), 2u32);
        classes.insert("car".to_string(), 1);

        let msg = OutboundMessage {
            image_base64: Some("data:image/jpeg;base64,abc".into()),
            inference_time: Some(0.041),
            processing_time: Some(0.063),
            fps: Some(2.0),
            object_count: Some(3),
            classes: Some(classes),
            timestamp: Some(1_700_000_000.25),
            ..Default::default()
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["object_count"], 3);
        assert_eq!(json["classes"]["person"], 2);
        assert_eq!(json["fps"], 2.0);
        assert!(json.get("type").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_status_message() {
        let json =
            serde_json::to_value(OutboundMessage::status("connected", "subscribed to camA"))
                .unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["message"], "subscribed to camA");
    }
}
