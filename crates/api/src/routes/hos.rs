//! Hours-of-service endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use domain::models::{
    ComplianceAlertResponse, EditHosLogRequest, HosLogResponse, HosSummaryResponse,
    RecordDutyStatusRequest, ResolveViolationRequest,
};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentLogsQuery {
    pub days: Option<i64>,
}

pub async fn record_duty_status(
    State(state): State<AppState>,
    Json(request): Json<RecordDutyStatusRequest>,
) -> Result<(StatusCode, Json<HosLogResponse>), ApiError> {
    let log = state.hos.record_duty_status(request).await?;
    Ok((StatusCode::CREATED, Json(HosLogResponse::from(log))))
}

pub async fn edit_log(
    State(state): State<AppState>,
    Path(log_id): Path<Uuid>,
    Json(request): Json<EditHosLogRequest>,
) -> Result<Json<HosLogResponse>, ApiError> {
    let log = state.hos.edit_log(log_id, request).await?;
    Ok(Json(HosLogResponse::from(log)))
}

pub async fn summary(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<HosSummaryResponse>, ApiError> {
    let response = state.hos.summary(driver_id, Utc::now()).await?;
    Ok(Json(response))
}

pub async fn recent_logs(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
    Query(query): Query<RecentLogsQuery>,
) -> Result<Json<Vec<HosLogResponse>>, ApiError> {
    let days = query.days.unwrap_or(8).clamp(1, 30);
    let logs = state.hos.recent_logs(driver_id, days).await?;
    Ok(Json(logs.into_iter().map(HosLogResponse::from).collect()))
}

pub async fn violations(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<ComplianceAlertResponse>>, ApiError> {
    let violations = state.hos.unresolved_violations(driver_id).await?;
    Ok(Json(
        violations
            .into_iter()
            .map(ComplianceAlertResponse::from)
            .collect(),
    ))
}

/// Runs the compliance checks now, persisting and returning any new
/// violations.
pub async fn evaluate(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<ComplianceAlertResponse>>, ApiError> {
    let violations = state.hos.evaluate_violations(driver_id).await?;
    Ok(Json(
        violations
            .into_iter()
            .map(ComplianceAlertResponse::from)
            .collect(),
    ))
}

pub async fn resolve_violation(
    State(state): State<AppState>,
    Path(violation_id): Path<Uuid>,
    Json(request): Json<ResolveViolationRequest>,
) -> Result<Json<ComplianceAlertResponse>, ApiError> {
    let violation = state.hos.resolve_violation(violation_id, request).await?;
    Ok(Json(ComplianceAlertResponse::from(violation)))
}
