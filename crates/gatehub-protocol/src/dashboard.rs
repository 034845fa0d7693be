//! Dashboard protocol messages.
//!
//! Browser clients speak JSON over a persistent WebSocket. Three inbound
//! shapes exist:
//!
//! 1. **Command form**: `{"command": <name>, ...params}`, parsed into
//!    [`ClientCommand`]. Parameter fields are optional at the serde layer so
//!    the hub can reply with field-level errors instead of a parse failure.
//! 2. **Legacy form**: `{"card_type", "uid", "state"}`, parsed into
//!    [`LegacyCardMessage`]. The `state` value selects check/add/remove, see
//!    [`LegacyCardMessage::action`].
//! 3. Anything else, which the hub answers with a generic unknown-format
//!    error.
//!
//! Server-pushed messages are [`ServerEvent`]s: `card_scanned` goes to every
//! connected client, `serial_data` only to monitor subscribers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound dashboard command.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Subscribe the calling client to the raw serial monitor tap.
    StartSerialMonitor,

    /// Look a card up by UID alone, probing all card types in priority order.
    GetCardDetailsByUid {
        #[serde(default)]
        uid: Option<Value>,
    },

    /// List every registered card with its image attachment state.
    ListCards,

    /// Attach an image to an existing card. `image_data` is base64, with an
    /// optional `data:...;base64,` prefix.
    UploadImage {
        #[serde(default)]
        card_type: Option<String>,
        #[serde(default)]
        uid: Option<Value>,
        #[serde(default)]
        image_data: Option<String>,
        #[serde(default)]
        filename: Option<String>,
    },

    /// Fetch full detail for one card identified by type and UID.
    GetCardDetails {
        #[serde(default)]
        card_type: Option<String>,
        #[serde(default)]
        uid: Option<Value>,
    },
}

/// Inbound legacy card-state message.
///
/// Predates the command form; kept because deployed dashboards still send it.
/// All three fields must be present for the message to take this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyCardMessage {
    pub card_type: String,
    pub uid: Value,
    pub state: Value,
}

/// What a legacy message asks for, decoded from its `state` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyAction {
    /// Empty or absent state: existence check, reply carries `state: 1|0`.
    Check,
    /// Truthy state (`1`, `true`, `"1"`, `"true"`, `"True"`): add the card.
    Add,
    /// Falsy state (`0`, `false`, `"0"`, `"false"`, `"False"`): remove it.
    Remove,
    /// Any other value.
    Unrecognized,
}

impl LegacyCardMessage {
    /// Decode the `state` field into the action it requests.
    ///
    /// The accepted spellings mirror the deployed dashboards exactly; no
    /// other value adds or removes a card.
    #[must_use]
    pub fn action(&self) -> LegacyAction {
        match &self.state {
            Value::Null => LegacyAction::Check,
            Value::String(s) if s.is_empty() => LegacyAction::Check,
            Value::Bool(true) => LegacyAction::Add,
            Value::Bool(false) => LegacyAction::Remove,
            Value::Number(n) if n.as_i64() == Some(1) => LegacyAction::Add,
            Value::Number(n) if n.as_i64() == Some(0) => LegacyAction::Remove,
            Value::String(s) if s == "1" || s == "true" || s == "True" => LegacyAction::Add,
            Value::String(s) if s == "0" || s == "false" || s == "False" => LegacyAction::Remove,
            _ => LegacyAction::Unrecognized,
        }
    }
}

/// Direction tag on a monitor-tap frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorDirection {
    /// Frame read from the serial link.
    Incoming,
    /// Frame written to the serial link.
    Outgoing,
    /// Processing failure report, not wire traffic.
    Error,
}

/// Server-pushed (unsolicited) dashboard event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A card was scanned and evaluated; broadcast to every client.
    CardScanned {
        #[serde(rename = "cardUID")]
        card_uid: String,
        #[serde(rename = "cardType")]
        card_type: String,
        #[serde(rename = "accessGranted")]
        access_granted: bool,
        #[serde(rename = "hasImage")]
        has_image: bool,
        #[serde(rename = "imageUrl")]
        image_url: Option<String>,
        /// ISO-8601.
        timestamp: String,
    },

    /// Raw serial traffic mirror; delivered only to monitor subscribers.
    SerialData {
        message: String,
        direction: MonitorDirection,
        /// ISO-8601.
        timestamp: String,
    },
}

impl ServerEvent {
    /// Build a `card_scanned` event stamped with the current time.
    #[must_use]
    pub fn card_scanned(
        card_uid: impl Into<String>,
        card_type: impl Into<String>,
        access_granted: bool,
        has_image: bool,
        image_url: Option<String>,
    ) -> Self {
        ServerEvent::CardScanned {
            card_uid: card_uid.into(),
            card_type: card_type.into(),
            access_granted,
            has_image,
            image_url,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Build a `serial_data` monitor frame stamped with the current time.
    #[must_use]
    pub fn serial_data(message: impl Into<String>, direction: MonitorDirection) -> Self {
        ServerEvent::SerialData {
            message: message.into(),
            direction,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
