//! Driver location domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// An immutable GPS ping in the driver location time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocation {
    pub id: i64,
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    /// Speed in miles per hour.
    pub speed: Option<f64>,
    /// Heading in degrees, 0-360.
    pub heading: Option<f64>,
    pub dispatch_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    /// Where the ping came from, e.g. "mobile" or "eld".
    pub source: String,
    pub created_at: DateTime<Utc>,
}

fn default_source() -> String {
    "mobile".to_string()
}

/// Request payload for a location update.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestLocationRequest {
    pub driver_id: Uuid,

    /// Timestamp in milliseconds since epoch.
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: i64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    #[validate(custom(function = "crate::models::validate_optional_speed"))]
    pub speed: Option<f64>,

    #[validate(custom(function = "crate::models::validate_optional_heading"))]
    pub heading: Option<f64>,

    pub dispatch_id: Option<Uuid>,

    #[serde(default = "default_source")]
    pub source: String,
}

/// Response payload for location reads and push events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocationResponse {
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    pub source: String,
}

impl From<DriverLocation> for DriverLocationResponse {
    fn from(loc: DriverLocation) -> Self {
        Self {
            driver_id: loc.driver_id,
            latitude: loc.latitude,
            longitude: loc.longitude,
            accuracy: loc.accuracy,
            speed: loc.speed,
            heading: loc.heading,
            dispatch_id: loc.dispatch_id,
            recorded_at: loc.recorded_at,
            source: loc.source,
        }
    }
}

/// Query parameters for the recent-history endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryQuery {
    /// How many minutes back to fetch (default 30, max 1440).
    pub since_minutes: Option<i64>,
}

impl LocationHistoryQuery {
    pub const DEFAULT_SINCE_MINUTES: i64 = 30;
    pub const MAX_SINCE_MINUTES: i64 = 1440;

    /// Effective window, clamped to the valid range.
    pub fn effective_since_minutes(&self) -> i64 {
        self.since_minutes
            .unwrap_or(Self::DEFAULT_SINCE_MINUTES)
            .clamp(1, Self::MAX_SINCE_MINUTES)
    }
}

/// Response payload for the recent-history endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryResponse {
    pub driver_id: Uuid,
    pub since_minutes: i64,
    pub locations: Vec<DriverLocationResponse>,
}

/// Response payload for the active-trackers query: one latest position per
/// driver with a live dispatch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTrackersResponse {
    pub trackers: Vec<DriverLocationResponse>,
    pub total: usize,
}
