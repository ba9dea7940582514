use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use super::{errors::AppError, AppState};
use crate::identify::IdentifyRequest;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Forward a photo to Plant.id and relay the answer verbatim.
pub async fn identify_plant(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        log::warn!("Rejected identification body: {}", rejection.body_text());
        AppError::internal(rejection.body_text())
    })?;

    log::info!("Identification requested for {} image(s)", request.images.len());

    let data = state
        .upstream
        .identify_with_network_retry(&request.images, state.network_retries)
        .await
        .map_err(|err| {
            log::error!("Plant identification error: {}", err);
            AppError::from(err)
        })?;

    Ok(Json(data))
}
