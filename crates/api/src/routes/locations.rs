//! GPS ingestion and tracker endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::{
    ActiveTrackersResponse, DriverLocationResponse, IngestLocationRequest, LocationHistoryQuery,
    LocationHistoryResponse,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_location_ingested;

pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestLocationRequest>,
) -> Result<(StatusCode, Json<DriverLocationResponse>), ApiError> {
    let location = state.tracking.ingest(request).await?;
    record_location_ingested();
    Ok((
        StatusCode::CREATED,
        Json(DriverLocationResponse::from(location)),
    ))
}

pub async fn latest(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<DriverLocationResponse>, ApiError> {
    let location = state.tracking.latest(driver_id).await?;
    Ok(Json(DriverLocationResponse::from(location)))
}

pub async fn history(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
    Query(query): Query<LocationHistoryQuery>,
) -> Result<Json<LocationHistoryResponse>, ApiError> {
    let response = state.tracking.history(driver_id, &query).await?;
    Ok(Json(response))
}

pub async fn active_trackers(
    State(state): State<AppState>,
) -> Result<Json<ActiveTrackersResponse>, ApiError> {
    let response = state.tracking.active_trackers().await?;
    Ok(Json(response))
}
