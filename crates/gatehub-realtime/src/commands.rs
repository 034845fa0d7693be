//! Inbound dashboard message dispatch.
//!
//! Every text message a client sends produces exactly one reply. Three
//! shapes are recognized: the command form, the legacy card-state form, and
//! unparseable/unknown input which gets a generic error reply. Registry
//! failures are converted to error replies here; nothing propagates past
//! the hub.

use crate::handler::HubState;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use gatehub_core::{RawUid, display_spelling};
use gatehub_protocol::{ClientCommand, LegacyAction, LegacyCardMessage, ServerEvent};
use gatehub_registry::CardRegistry;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

/// Dispatch one raw text message from a dashboard client.
pub(crate) async fn dispatch_message(state: &HubState, client_id: Uuid, text: &str) -> Value {
    let Ok(data) = serde_json::from_str::<Value>(text) else {
        warn!(client_id = %client_id, "Unparseable message from client");
        return json!({"status": "error", "message": "Invalid JSON format"});
    };

    if data.get("command").is_some() {
        return dispatch_command(state, client_id, data).await;
    }

    if let Ok(legacy) = serde_json::from_value::<LegacyCardMessage>(data.clone()) {
        return dispatch_legacy(state, legacy).await;
    }

    warn!(client_id = %client_id, "Unknown message format from client");
    json!({"status": "error", "message": "Unknown message format"})
}

async fn dispatch_command(state: &HubState, client_id: Uuid, data: Value) -> Value {
    let command_name = data
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let command = match serde_json::from_value::<ClientCommand>(data) {
        Ok(command) => command,
        Err(_) => {
            warn!(client_id = %client_id, command = %command_name, "Unknown command");
            return json!({
                "status": "error",
                "message": format!("Unknown command: {command_name}"),
            });
        }
    };

    info!(client_id = %client_id, command = %command_name, "Handling client command");

    match command {
        ClientCommand::StartSerialMonitor => {
            state.hub.subscribe_monitor(client_id).await;
            json!({
                "status": "success",
                "command": "start_serial_monitor",
                "message": "Serial monitor activated",
            })
        }

        ClientCommand::GetCardDetailsByUid { uid } => lookup_by_uid(state, uid).await,

        ClientCommand::ListCards => match state.evaluator.registry().list().await {
            Ok(cards) => json!({
                "status": "success",
                "command": "list_cards",
                "count": cards.len(),
                "cards": cards,
            }),
            Err(e) => error_reply("list_cards", e.to_string()),
        },

        ClientCommand::UploadImage {
            card_type,
            uid,
            image_data,
            filename,
        } => upload_image(state, card_type, uid, image_data, filename).await,

        ClientCommand::GetCardDetails { card_type, uid } => {
            card_details(state, card_type, uid).await
        }
    }
}

async fn lookup_by_uid(state: &HubState, uid: Option<Value>) -> Value {
    let Some(uid) = uid else {
        return error_reply("get_card_details_by_uid", "Missing field: uid");
    };

    let raw = RawUid::from_json(&uid);
    match state.evaluator.evaluate(&raw).await {
        Ok(decision) => {
            // Shaped like the unsolicited scan event so the dashboard's
            // card viewer renders both the same way.
            let event = ServerEvent::card_scanned(
                display_spelling(&uid),
                decision.card_type,
                decision.granted,
                decision.has_image,
                decision.image_url,
            );
            serde_json::to_value(&event)
                .unwrap_or_else(|_| error_reply("get_card_details_by_uid", "Internal error"))
        }
        Err(e) => error_reply("get_card_details_by_uid", e.to_string()),
    }
}

async fn upload_image(
    state: &HubState,
    card_type: Option<String>,
    uid: Option<Value>,
    image_data: Option<String>,
    filename: Option<String>,
) -> Value {
    let (card_type, uid, image_data, filename) = match (card_type, uid, image_data, filename) {
        (Some(card_type), Some(uid), Some(image_data), Some(filename)) => {
            (card_type, uid, image_data, filename)
        }
        (card_type, uid, image_data, filename) => {
            let mut missing = Vec::new();
            if card_type.is_none() {
                missing.push("card_type");
            }
            if uid.is_none() {
                missing.push("uid");
            }
            if image_data.is_none() {
                missing.push("image_data");
            }
            if filename.is_none() {
                missing.push("filename");
            }
            return error_reply(
                "upload_image",
                format!("Missing fields: {}", missing.join(", ")),
            );
        }
    };

    // Browsers send data URLs; the payload follows the first comma.
    let encoded = image_data
        .split_once(',')
        .map(|(_, payload)| payload)
        .unwrap_or(&image_data);

    let image = match BASE64.decode(encoded.trim()) {
        Ok(image) => image,
        Err(e) => {
            return error_reply("upload_image", format!("Image processing error: {e}"));
        }
    };

    info!(
        card_type = %card_type,
        filename = %filename,
        size = image.len(),
        "Image decoded for upload"
    );

    let raw = RawUid::from_json(&uid);
    match state
        .evaluator
        .registry()
        .save_image(&card_type, &raw, &image, &filename)
        .await
    {
        Ok(_) => json!({
            "status": "success",
            "command": "upload_image",
            "message": "Image saved successfully",
        }),
        Err(gatehub_registry::RegistryError::CardNotFound { .. }) => {
            error_reply("upload_image", "Card does not exist")
        }
        Err(e) => error_reply("upload_image", e.to_string()),
    }
}

async fn card_details(state: &HubState, card_type: Option<String>, uid: Option<Value>) -> Value {
    let (Some(card_type), Some(uid)) = (card_type, uid) else {
        return error_reply("get_card_details", "Missing card_type or uid");
    };

    let raw = RawUid::from_json(&uid);
    match state.evaluator.registry().get_with_image(&card_type, &raw).await {
        Ok(Some(card)) => json!({
            "status": "success",
            "command": "get_card_details",
            "card": card,
        }),
        Ok(None) => error_reply("get_card_details", "Card not found"),
        Err(e) => error_reply("get_card_details", e.to_string()),
    }
}

async fn dispatch_legacy(state: &HubState, message: LegacyCardMessage) -> Value {
    let raw = RawUid::from_json(&message.uid);
    let registry = state.evaluator.registry();

    match message.action() {
        LegacyAction::Check => match registry.check(&message.card_type, &raw).await {
            Ok(exists) => {
                info!(
                    card_type = %message.card_type,
                    uid = %display_spelling(&message.uid),
                    exists,
                    "Legacy card check"
                );
                json!({
                    "card_type": message.card_type,
                    "uid": message.uid,
                    "state": i32::from(exists),
                })
            }
            Err(e) => json!({"status": "error", "message": e.to_string()}),
        },

        LegacyAction::Add => match registry.add(&message.card_type, &raw).await {
            Ok(added) => json!({
                "status": if added { "success" } else { "error" },
                "message": format!(
                    "Card {} with UID {} {}",
                    message.card_type,
                    display_spelling(&message.uid),
                    if added { "added" } else { "already exists" },
                ),
            }),
            Err(e) => json!({"status": "error", "message": e.to_string()}),
        },

        LegacyAction::Remove => match registry.remove(&message.card_type, &raw).await {
            Ok(removed) => json!({
                "status": if removed { "success" } else { "error" },
                "message": format!(
                    "Card {} with UID {} {}",
                    message.card_type,
                    display_spelling(&message.uid),
                    if removed { "removed" } else { "not found" },
                ),
            }),
            Err(e) => json!({"status": "error", "message": e.to_string()}),
        },

        LegacyAction::Unrecognized => {
            warn!(card_type = %message.card_type, "Unrecognized legacy state value");
            json!({"status": "error", "message": "Unknown message format"})
        }
    }
}

fn error_reply(command: &str, message: impl Into<String>) -> Value {
    json!({
        "status": "error",
        "command": command,
        "message": message.into(),
    })
}
