//! Realtime hub for gatehub dashboards.
//!
//! Manages the set of connected dashboard clients over WebSocket, routes
//! their commands to the card registry and access evaluator, and fans
//! server-pushed events out to the right audience:
//!
//! - `card_scanned` events go to **every** connected client;
//! - `serial_data` monitor frames go only to clients that subscribed to the
//!   serial tap.
//!
//! Clients whose delivery channel fails are pruned from both sets after the
//! fan-out pass, never mid-iteration. The serial bridge holds the same
//! [`ClientHub`] handle and calls [`ClientHub::broadcast_event`] /
//! [`ClientHub::broadcast_monitor`] directly.

pub mod commands;
pub mod handler;
pub mod hub;

pub use handler::{HubState, ws_handler};
pub use hub::ClientHub;
