//! Registry row types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One registered card joined with its optional image attachment.
///
/// This is the shape handed to dashboards (`list_cards`, `get_card_details`),
/// so it serializes with the wire's snake_case field names as-is.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CardRecord {
    pub card_type: String,

    /// Canonical uppercase-hex UID (the storage key).
    pub uid: String,

    pub date_added: DateTime<Utc>,

    /// Filename under the media directory, if an image is attached.
    pub image_filename: Option<String>,

    pub date_uploaded: Option<DateTime<Utc>>,

    pub has_image: bool,
}
