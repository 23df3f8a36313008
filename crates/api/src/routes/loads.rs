//! Load lifecycle endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use domain::models::{
    ChangeStatusRequest, LoadResponse, StatusHistoryResponse, ValidTransitionsResponse,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Outcome of a status change: the updated load plus the audit row the
/// transition appended.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusResponse {
    pub load: LoadResponse,
    pub history: StatusHistoryResponse,
}

pub async fn get_load(
    State(state): State<AppState>,
    Path(load_id): Path<Uuid>,
) -> Result<Json<LoadResponse>, ApiError> {
    let load = state.load_status.get(load_id).await?;
    Ok(Json(LoadResponse::from(load)))
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(load_id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<ChangeStatusResponse>, ApiError> {
    let (load, history) = state.load_status.change_status(load_id, request).await?;
    Ok(Json(ChangeStatusResponse {
        load: LoadResponse::from(load),
        history: StatusHistoryResponse::from(history),
    }))
}

pub async fn valid_transitions(
    State(state): State<AppState>,
    Path(load_id): Path<Uuid>,
) -> Result<Json<ValidTransitionsResponse>, ApiError> {
    let response = state.load_status.valid_transitions(load_id).await?;
    Ok(Json(response))
}

pub async fn history(
    State(state): State<AppState>,
    Path(load_id): Path<Uuid>,
) -> Result<Json<Vec<StatusHistoryResponse>>, ApiError> {
    let rows = state.load_status.history(load_id).await?;
    Ok(Json(
        rows.into_iter().map(StatusHistoryResponse::from).collect(),
    ))
}
