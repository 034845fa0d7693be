//! Client set management and broadcast fan-out.
//!
//! The hub owns two pieces of shared mutable state: the set of connected
//! dashboard clients and the subset of them subscribed to the serial monitor
//! tap. Both are mutated concurrently (connection loops add and remove on
//! connect/disconnect, the broadcast routine removes on failed delivery), so
//! they live behind `RwLock` and are only reachable through the operations
//! here. Raw iteration is never exposed.
//!
//! Fan-out never removes a client mid-iteration: failed deliveries are
//! collected during the pass and purged afterwards, from both sets.

use axum::extract::ws::Message;
use gatehub_protocol::{MonitorDirection, ServerEvent};
use std::collections::{HashMap, HashSet};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Channel sender half for pushing messages to one WebSocket connection.
pub type ClientSender = mpsc::UnboundedSender<Message>;

/// Registry of connected dashboard clients and monitor subscribers.
///
/// Designed to be wrapped in `Arc` and shared between the WebSocket handler
/// and the serial bridge.
#[derive(Debug, Default)]
pub struct ClientHub {
    connections: RwLock<HashMap<Uuid, ClientSender>>,
    monitors: RwLock<HashSet<Uuid>>,
}

impl ClientHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connected client's outbound sender.
    pub async fn register(&self, client_id: Uuid, sender: ClientSender) {
        self.connections.write().await.insert(client_id, sender);
    }

    /// Remove a client from the client set and the monitor subscriber set.
    pub async fn remove(&self, client_id: Uuid) {
        self.connections.write().await.remove(&client_id);
        self.monitors.write().await.remove(&client_id);
    }

    /// Add a client to the monitor subscriber set.
    ///
    /// Subscribing twice is a no-op; unknown clients are accepted and swept
    /// out on their next delivery failure.
    pub async fn subscribe_monitor(&self, client_id: Uuid) {
        self.monitors.write().await.insert(client_id);
        debug!(client_id = %client_id, "Client subscribed to serial monitor");
    }

    /// Current number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Current number of monitor subscribers.
    pub async fn monitor_count(&self) -> usize {
        self.monitors.read().await.len()
    }

    /// Broadcast an event to every connected client.
    ///
    /// Used for `card_scanned` events. Clients whose channel is closed are
    /// purged from both sets after the pass.
    pub async fn broadcast_event(&self, event: &ServerEvent) {
        let Some(payload) = encode(event) else {
            return;
        };

        let failed: Vec<Uuid> = {
            let connections = self.connections.read().await;
            connections
                .iter()
                .filter(|(_, sender)| sender.send(Message::Text(payload.clone().into())).is_err())
                .map(|(id, _)| *id)
                .collect()
        };

        self.purge(&failed).await;
    }

    /// Mirror one raw serial frame to monitor subscribers only.
    pub async fn broadcast_monitor(&self, message: &str, direction: MonitorDirection) {
        let subscribers: Vec<Uuid> = {
            let monitors = self.monitors.read().await;
            if monitors.is_empty() {
                return;
            }
            monitors.iter().copied().collect()
        };

        let event = ServerEvent::serial_data(message, direction);
        let Some(payload) = encode(&event) else {
            return;
        };

        let failed: Vec<Uuid> = {
            let connections = self.connections.read().await;
            subscribers
                .into_iter()
                .filter(|id| match connections.get(id) {
                    Some(sender) => sender.send(Message::Text(payload.clone().into())).is_err(),
                    // Subscribed but no longer connected; sweep it out.
                    None => true,
                })
                .collect()
        };

        self.purge(&failed).await;
    }

    /// Drop failed clients from both sets, after a fan-out pass completed.
    async fn purge(&self, client_ids: &[Uuid]) {
        if client_ids.is_empty() {
            return;
        }

        let mut connections = self.connections.write().await;
        let mut monitors = self.monitors.write().await;
        for client_id in client_ids {
            connections.remove(client_id);
            monitors.remove(client_id);
            warn!(client_id = %client_id, "Removed client after failed delivery");
        }
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(e) => {
            error!(error = %e, "Failed to encode server event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect(hub: &ClientHub) -> (Uuid, mpsc::UnboundedReceiver<Message>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(id, tx).await;
        (id, rx)
    }

    fn text_of(message: Message) -> String {
        match message {
            Message::Text(text) => text.to_string(),
            other => panic!("expected text message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_all_clients() {
        let hub = ClientHub::new();
        let (_a, mut rx_a) = connect(&hub).await;
        let (_b, mut rx_b) = connect(&hub).await;

        let event = ServerEvent::card_scanned("AABB", "KEY", true, false, None);
        hub.broadcast_event(&event).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let payload = text_of(rx.recv().await.unwrap());
            let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
            assert_eq!(value["type"], "card_scanned");
            assert_eq!(value["cardUID"], "AABB");
        }
    }

    #[tokio::test]
    async fn broken_client_is_purged_without_blocking_others() {
        let hub = ClientHub::new();
        let (_a, mut rx_a) = connect(&hub).await;
        let (broken, rx_broken) = connect(&hub).await;
        let (_c, mut rx_c) = connect(&hub).await;
        hub.subscribe_monitor(broken).await;
        drop(rx_broken);

        let event = ServerEvent::card_scanned("AABB", "KEY", false, false, None);
        hub.broadcast_event(&event).await;

        assert!(rx_a.recv().await.is_some());
        assert!(rx_c.recv().await.is_some());
        assert_eq!(hub.client_count().await, 2);
        // Removal from the client set implies removal from the monitor set.
        assert_eq!(hub.monitor_count().await, 0);
    }

    #[tokio::test]
    async fn monitor_frames_go_only_to_subscribers() {
        let hub = ClientHub::new();
        let (subscriber, mut rx_sub) = connect(&hub).await;
        let (_other, mut rx_other) = connect(&hub).await;
        hub.subscribe_monitor(subscriber).await;

        hub.broadcast_monitor(r#"{"type":"ping"}"#, MonitorDirection::Incoming)
            .await;

        let payload = text_of(rx_sub.recv().await.unwrap());
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["type"], "serial_data");
        assert_eq!(value["direction"], "incoming");
        assert_eq!(value["message"], r#"{"type":"ping"}"#);

        assert!(rx_other.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_removes_from_both_sets() {
        let hub = ClientHub::new();
        let (id, _rx) = connect(&hub).await;
        hub.subscribe_monitor(id).await;

        hub.remove(id).await;

        assert_eq!(hub.client_count().await, 0);
        assert_eq!(hub.monitor_count().await, 0);
    }
}
