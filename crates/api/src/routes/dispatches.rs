//! Dispatch assignment endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::{
    AcceptDispatchRequest, AssignDispatchRequest, AutoMatchRequest, DispatchResponse,
    RejectDispatchRequest,
};

use crate::app::AppState;
use crate::error::ApiError;

pub async fn get_dispatch(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let dispatch = state.dispatch.get(dispatch_id).await?;
    Ok(Json(DispatchResponse::from(dispatch)))
}

pub async fn assign(
    State(state): State<AppState>,
    Json(request): Json<AssignDispatchRequest>,
) -> Result<(StatusCode, Json<DispatchResponse>), ApiError> {
    let dispatch = state.dispatch.assign(request).await?;
    Ok((StatusCode::CREATED, Json(DispatchResponse::from(dispatch))))
}

pub async fn auto_match(
    State(state): State<AppState>,
    Json(request): Json<AutoMatchRequest>,
) -> Result<(StatusCode, Json<DispatchResponse>), ApiError> {
    let dispatch = state.dispatch.auto_match(request).await?;
    Ok((StatusCode::CREATED, Json(DispatchResponse::from(dispatch))))
}

pub async fn accept(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
    Json(request): Json<AcceptDispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let dispatch = state.dispatch.accept(dispatch_id, request).await?;
    Ok(Json(DispatchResponse::from(dispatch)))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
    Json(request): Json<RejectDispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let dispatch = state.dispatch.reject(dispatch_id, request).await?;
    Ok(Json(DispatchResponse::from(dispatch)))
}

pub async fn begin(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let dispatch = state.dispatch.begin(dispatch_id).await?;
    Ok(Json(DispatchResponse::from(dispatch)))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let dispatch = state.dispatch.complete(dispatch_id).await?;
    state.tracking.forget_dispatch(dispatch_id);
    Ok(Json(DispatchResponse::from(dispatch)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let dispatch = state.dispatch.cancel(dispatch_id).await?;
    state.tracking.forget_dispatch(dispatch_id);
    Ok(Json(DispatchResponse::from(dispatch)))
}
