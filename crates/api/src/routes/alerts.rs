//! Geofence alert endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use domain::models::{AcknowledgeAlertRequest, GeofenceAlertResponse, PendingAlertsResponse};

use crate::app::AppState;
use crate::error::ApiError;

pub async fn pending(
    State(state): State<AppState>,
) -> Result<Json<PendingAlertsResponse>, ApiError> {
    let response = state.tracking.pending_alerts().await?;
    Ok(Json(response))
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(request): Json<AcknowledgeAlertRequest>,
) -> Result<Json<GeofenceAlertResponse>, ApiError> {
    let alert = state.tracking.acknowledge_alert(alert_id, request).await?;
    Ok(Json(GeofenceAlertResponse::from(alert)))
}
