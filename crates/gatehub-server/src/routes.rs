//! HTTP router.
//!
//! One listener carries everything the dashboards need: the WebSocket
//! upgrade at `/ws`, uploaded card images under `/media`, and the static
//! dashboard assets at the root.

use axum::Router;
use axum::routing::get;
use gatehub_realtime::{HubState, ws_handler};
use std::path::Path;
use tower_http::services::ServeDir;

pub fn router(state: HubState, media_dir: &Path, static_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .nest_service("/media", ServeDir::new(media_dir))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}
