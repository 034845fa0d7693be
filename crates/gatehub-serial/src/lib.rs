//! Serial bridge for gatehub.
//!
//! Owns the one physical serial connection to the RFID reader: runs the
//! blocking read loop off the async scheduler, reassembles newline-delimited
//! JSON frames from arbitrary read chunks, dispatches recognized events to
//! the access evaluator, and writes replies back as complete flushed frames.
//! All traffic in both directions is mirrored to the realtime hub's monitor
//! tap for live debugging.
//!
//! No failure here propagates to callers: connect and fatal read errors end
//! the bridge task with a logged error, everything else is handled at the
//! boundary where it occurs.

pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use bridge::{BridgeState, SerialBridge, SerialBridgeConfig};
pub use dispatch::FrameDispatcher;
pub use error::{BridgeError, BridgeResult};
pub use writer::SerialWriter;
