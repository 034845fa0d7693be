//! Protocol-level constants shared across the gatehub crates.

/// Card types checked on every scan, in priority order.
///
/// The access evaluator probes the registry under each of these types and
/// stops at the first match, so a UID registered under more than one type
/// always reports the earliest entry in this list.
///
/// # Examples
///
/// ```
/// use gatehub_core::constants::CARD_TYPE_PRIORITY;
///
/// assert_eq!(CARD_TYPE_PRIORITY[0], "KEY");
/// ```
pub const CARD_TYPE_PRIORITY: [&str; 3] = ["KEY", "WORKER", "SECURITY"];

/// Card type reported when a scanned UID matches no registered card.
pub const CARD_TYPE_UNKNOWN: &str = "UNKNOWN";

/// Maximum number of characters a partial serial frame may accumulate.
///
/// The frame reassembler buffers text that does not yet parse as a complete
/// JSON object. If the buffer grows past this ceiling without ever becoming
/// parseable the stream is considered desynchronized and the buffer is
/// discarded. The partial frame is unrecoverable at that point.
pub const MAX_PENDING_FRAME_CHARS: usize = 1000;

/// Message `type` tag for card scan events arriving from the reader.
pub const MSG_TYPE_CARD_DATA: &str = "cardData";

/// Message `type` tag for reader keepalive probes.
pub const MSG_TYPE_PING: &str = "ping";
