//! Core types for the gatehub access control bridge.
//!
//! This crate holds the pieces shared by every other gatehub crate: the UID
//! normalization rules that define card identity, and the protocol-level
//! constants (card type priority, framing limits).
//!
//! It is deliberately free of I/O so the identity rules can be tested and
//! reused without pulling in the serial, database, or network stacks.

pub mod constants;
pub mod uid;

pub use uid::{RawUid, display_spelling, normalize_for_search, normalize_for_storage};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
