//! Wire protocol types for gatehub.
//!
//! Two transports meet in this crate:
//!
//! - The **serial wire protocol**: newline-delimited JSON objects exchanged
//!   with the reader hardware ([`device`]), reassembled from arbitrary read
//!   chunks by the [`reassembler`].
//! - The **dashboard protocol**: JSON messages exchanged with browser
//!   clients over WebSocket ([`dashboard`]): commands, the legacy
//!   card-state form, and the server-pushed event types.
//!
//! The crate owns serialization shape only. Transport and dispatch live in
//! `gatehub-serial` and `gatehub-realtime`.

pub mod dashboard;
pub mod device;
pub mod reassembler;

pub use dashboard::{ClientCommand, LegacyAction, LegacyCardMessage, MonitorDirection, ServerEvent};
pub use device::{DeviceEvent, DeviceReply};
pub use reassembler::FrameReassembler;
