//! Driver availability domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// FMCSA daily driving cap, hours.
pub const DAILY_DRIVING_CAP_HOURS: f64 = 11.0;

/// Weekly on-duty cap, hours (60-hour/7-day rule).
pub const WEEKLY_ON_DUTY_CAP_HOURS: f64 = 60.0;

/// Live availability state of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Available,
    OnDuty,
    OffDuty,
    OnBreak,
    Maintenance,
    OutOfService,
}

impl AvailabilityStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "AVAILABLE",
            AvailabilityStatus::OnDuty => "ON_DUTY",
            AvailabilityStatus::OffDuty => "OFF_DUTY",
            AvailabilityStatus::OnBreak => "ON_BREAK",
            AvailabilityStatus::Maintenance => "MAINTENANCE",
            AvailabilityStatus::OutOfService => "OUT_OF_SERVICE",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(AvailabilityStatus::Available),
            "ON_DUTY" => Ok(AvailabilityStatus::OnDuty),
            "OFF_DUTY" => Ok(AvailabilityStatus::OffDuty),
            "ON_BREAK" => Ok(AvailabilityStatus::OnBreak),
            "MAINTENANCE" => Ok(AvailabilityStatus::Maintenance),
            "OUT_OF_SERVICE" => Ok(AvailabilityStatus::OutOfService),
            _ => Err(format!("Invalid availability status: {}", s)),
        }
    }
}

/// Mutable live state per driver, superseded by newer writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAvailability {
    pub driver_id: Uuid,
    pub status: AvailabilityStatus,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub hours_worked_today: f64,
    pub hours_worked_week: f64,
    pub assigned_tractor_id: Option<Uuid>,
    pub assigned_trailer_id: Option<Uuid>,
    /// Rolling on-time delivery percentage, 0-100.
    pub on_time_delivery_rate: f64,
    /// Rolling dispatch acceptance percentage, 0-100.
    pub acceptance_rate: f64,
    pub completed_loads: i32,
    pub updated_at: DateTime<Utc>,
}

impl DriverAvailability {
    /// Driving hours left today under the 11-hour cap, clamped at 0.
    pub fn hours_available_today(&self) -> f64 {
        (DAILY_DRIVING_CAP_HOURS - self.hours_worked_today).max(0.0)
    }

    /// On-duty hours left this week under the 60-hour cap, clamped at 0.
    pub fn hours_available_week(&self) -> f64 {
        (WEEKLY_ON_DUTY_CAP_HOURS - self.hours_worked_week).max(0.0)
    }
}

/// Response payload for driver availability queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAvailabilityResponse {
    pub driver_id: Uuid,
    pub status: AvailabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_updated_at: Option<DateTime<Utc>>,
    pub hours_worked_today: f64,
    pub hours_worked_week: f64,
    pub hours_available_today: f64,
    pub hours_available_week: f64,
    pub on_time_delivery_rate: f64,
    pub acceptance_rate: f64,
    pub completed_loads: i32,
}

impl From<DriverAvailability> for DriverAvailabilityResponse {
    fn from(d: DriverAvailability) -> Self {
        let hours_available_today = d.hours_available_today();
        let hours_available_week = d.hours_available_week();
        Self {
            driver_id: d.driver_id,
            status: d.status,
            current_latitude: d.current_latitude,
            current_longitude: d.current_longitude,
            location_updated_at: d.location_updated_at,
            hours_worked_today: d.hours_worked_today,
            hours_worked_week: d.hours_worked_week,
            hours_available_today,
            hours_available_week,
            on_time_delivery_rate: d.on_time_delivery_rate,
            acceptance_rate: d.acceptance_rate,
            completed_loads: d.completed_loads,
        }
    }
}
