//! Per-frame dispatch.
//!
//! Every complete frame the read loop emits is handed to its own task, so a
//! slow registry lookup never stalls the read loop and frames carry no
//! completion-ordering guarantee between themselves. Emission order is still
//! the read order, since the single read loop hands frames over one at a
//! time.
//!
//! Recognized frame types:
//!
//! - `cardData`: evaluated against the registry; produces the device-facing
//!   `cardResponse` and the dashboard-facing `card_scanned` broadcast.
//! - `ping`: answered immediately with a `pong` echoing the device id.
//!
//! Anything else is logged and dropped; processing failures are mirrored to
//! the monitor tap error-tagged. Nothing here is fatal to the read loop.

use crate::writer::SerialWriter;
use gatehub_core::{RawUid, display_spelling};
use gatehub_protocol::{DeviceEvent, DeviceReply, MonitorDirection, ServerEvent};
use gatehub_realtime::ClientHub;
use gatehub_registry::AccessEvaluator;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Routes parsed frames to the evaluator and renders both reply artifacts.
#[derive(Clone)]
pub struct FrameDispatcher {
    evaluator: AccessEvaluator,
    hub: Arc<ClientHub>,
    writer: SerialWriter,
}

impl FrameDispatcher {
    pub fn new(evaluator: AccessEvaluator, hub: Arc<ClientHub>, writer: SerialWriter) -> Self {
        Self {
            evaluator,
            hub,
            writer,
        }
    }

    /// Process one complete frame of valid JSON.
    pub async fn dispatch(&self, frame: String) {
        match serde_json::from_str::<DeviceEvent>(&frame) {
            Ok(DeviceEvent::CardData {
                device_id,
                card_uid: Some(card_uid),
                reader_id,
            }) => {
                info!(
                    device_id = device_id.as_deref().unwrap_or("-"),
                    reader_id = reader_id.as_deref().unwrap_or("-"),
                    uid = %display_spelling(&card_uid),
                    "Card scanned"
                );
                self.handle_card_data(&card_uid).await;
            }

            Ok(DeviceEvent::CardData { card_uid: None, .. }) => {
                debug!("cardData frame without a UID, ignoring");
            }

            Ok(DeviceEvent::Ping { device_id }) => {
                self.send_reply(DeviceReply::pong(device_id)).await;
            }

            // Valid JSON, but not a message type we speak. Not an error.
            Err(e) => {
                warn!(error = %e, frame = %frame, "Unrecognized serial frame, dropping");
            }
        }
    }

    async fn handle_card_data(&self, card_uid: &Value) {
        let raw = RawUid::from_json(card_uid);

        let decision = match self.evaluator.evaluate(&raw).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(error = %e, "Access evaluation failed");
                self.hub
                    .broadcast_monitor(&format!("ERROR: {e}"), MonitorDirection::Error)
                    .await;
                return;
            }
        };

        info!(
            card_type = %decision.card_type,
            granted = decision.granted,
            "Access decision"
        );

        // Dashboards first, then the device reply: scan events reach every
        // attached client exactly once even if the serial write fails.
        let event = ServerEvent::card_scanned(
            display_spelling(card_uid),
            decision.card_type.clone(),
            decision.granted,
            decision.has_image,
            decision.image_url.clone(),
        );
        self.hub.broadcast_event(&event).await;

        self.send_reply(DeviceReply::card_response(
            decision.card_type,
            decision.granted,
        ))
        .await;
    }

    /// Write a reply frame; mirror it outgoing on success.
    ///
    /// A write failure aborts only this send; the read loop and other
    /// pending frames are unaffected.
    async fn send_reply(&self, reply: DeviceReply) {
        match self.writer.write_reply(&reply).await {
            Ok(payload) => {
                self.hub
                    .broadcast_monitor(&payload, MonitorDirection::Outgoing)
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Failed to write serial reply");
            }
        }
    }
}
