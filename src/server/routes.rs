use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::{handlers, AppState};
use crate::identify::IDENTIFY_ROUTE;

/// Full-resolution phone photos exceed axum's default limit once base64-encoded.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(IDENTIFY_ROUTE, post(handlers::identify_plant))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
