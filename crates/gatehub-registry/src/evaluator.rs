//! Access evaluation.
//!
//! Maps a scanned UID to a grant/deny outcome by probing the registry under
//! each known card type in a fixed priority order. The first match wins, so
//! a UID registered under several types deterministically reports the
//! highest-priority one on every scan.
//!
//! The decision carries everything both consumers need: the serial bridge
//! renders a `cardResponse` reply from it, and the realtime hub renders the
//! richer `card_scanned` broadcast (image attachment resolved here, against
//! the configured media base URL).

use crate::error::RegistryResult;
use crate::store::{CardRegistry, SqliteCardRegistry};
use gatehub_core::RawUid;
use gatehub_core::constants::{CARD_TYPE_PRIORITY, CARD_TYPE_UNKNOWN};
use tracing::debug;

/// Outcome of evaluating one scanned UID.
#[derive(Debug, Clone)]
pub struct AccessDecision {
    /// Matched card type, or `UNKNOWN` when denied.
    pub card_type: String,

    /// Grant is presence-in-registry; there is no expiry or time policy.
    pub granted: bool,

    pub has_image: bool,

    /// Absolute URL dashboards can fetch the card image from.
    pub image_url: Option<String>,
}

impl AccessDecision {
    fn denied() -> Self {
        Self {
            card_type: CARD_TYPE_UNKNOWN.to_string(),
            granted: false,
            has_image: false,
            image_url: None,
        }
    }
}

/// Grant/deny decision component over the card registry.
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    registry: SqliteCardRegistry,
    media_base_url: String,
}

impl AccessEvaluator {
    /// Create an evaluator. `media_base_url` is the prefix image filenames
    /// are resolved against, e.g. `http://localhost:8080/media`.
    pub fn new(registry: SqliteCardRegistry, media_base_url: impl Into<String>) -> Self {
        Self {
            registry,
            media_base_url: media_base_url.into(),
        }
    }

    /// The registry this evaluator consults.
    pub fn registry(&self) -> &SqliteCardRegistry {
        &self.registry
    }

    /// Evaluate a scanned UID against all card types in priority order.
    pub async fn evaluate(&self, uid: &RawUid) -> RegistryResult<AccessDecision> {
        for card_type in CARD_TYPE_PRIORITY {
            let Some(record) = self.registry.get_with_image(card_type, uid).await? else {
                continue;
            };

            debug!(card_type, uid = %record.uid, "Scan matched registered card");

            let image_url = record.image_filename.as_ref().map(|filename| {
                format!("{}/{}", self.media_base_url.trim_end_matches('/'), filename)
            });

            return Ok(AccessDecision {
                card_type: card_type.to_string(),
                granted: true,
                has_image: record.has_image,
                image_url,
            });
        }

        debug!("Scan matched no registered card");
        Ok(AccessDecision::denied())
    }
}
