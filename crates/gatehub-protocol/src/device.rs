//! Serial wire protocol messages.
//!
//! The reader speaks newline-delimited JSON, one object per frame. Inbound
//! frames carry a `type` tag; anything the tag does not match is logged and
//! dropped by the bridge rather than treated as an error.
//!
//! Field names are bound to the firmware's spelling (`deviceId`, `cardUID`)
//! with explicit renames; the Rust side stays snake_case.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound frame from the reader.
///
/// `cardUID` is kept as a raw JSON value because firmware revisions disagree
/// on its shape (hex string vs. byte array); `gatehub_core::RawUid` absorbs
/// the difference at the point of use.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceEvent {
    /// A card was presented to the reader.
    #[serde(rename = "cardData")]
    CardData {
        #[serde(rename = "deviceId", default)]
        device_id: Option<String>,
        #[serde(rename = "cardUID", default)]
        card_uid: Option<Value>,
        #[serde(rename = "readerId", default)]
        reader_id: Option<String>,
    },

    /// Keepalive probe; answered immediately with a [`DeviceReply::Pong`].
    #[serde(rename = "ping")]
    Ping {
        #[serde(rename = "deviceId", default)]
        device_id: Option<String>,
    },
}

/// Outbound frame to the reader.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DeviceReply {
    /// Grant/deny verdict for a presented card.
    #[serde(rename = "cardResponse")]
    CardResponse {
        #[serde(rename = "cardType")]
        card_type: String,
        #[serde(rename = "accessGranted")]
        access_granted: bool,
        /// Unix seconds.
        timestamp: i64,
    },

    /// Keepalive answer, echoing the probing device's identifier.
    #[serde(rename = "pong")]
    Pong {
        #[serde(rename = "deviceId")]
        device_id: Option<String>,
        /// Unix seconds.
        timestamp: i64,
    },
}

impl DeviceReply {
    /// Build a card verdict reply stamped with the current time.
    #[must_use]
    pub fn card_response(card_type: impl Into<String>, access_granted: bool) -> Self {
        DeviceReply::CardResponse {
            card_type: card_type.into(),
            access_granted,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Build a pong reply stamped with the current time.
    #[must_use]
    pub fn pong(device_id: Option<String>) -> Self {
        DeviceReply::Pong {
            device_id,
            timestamp: Utc::now().timestamp(),
        }
    }
}
