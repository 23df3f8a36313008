//! Hours-of-Service domain model.
//!
//! Duty statuses and violation rules follow FMCSA convention: 11-hour
//! driving / 14-hour on-duty daily limits, a 60-or-70-hour cycle, and the
//! 30-minute break rule after 8 hours of driving.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Duty Status
// ============================================================================

/// Driver duty status for a log interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HosStatus {
    OffDuty,
    SleeperBerth,
    Driving,
    OnDuty,
}

impl HosStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            HosStatus::OffDuty => "OFF_DUTY",
            HosStatus::SleeperBerth => "SLEEPER_BERTH",
            HosStatus::Driving => "DRIVING",
            HosStatus::OnDuty => "ON_DUTY",
        }
    }

    /// Counts against the 14-hour and cycle limits.
    pub fn is_working(&self) -> bool {
        matches!(self, HosStatus::Driving | HosStatus::OnDuty)
    }

    /// A rest status that can satisfy the 30-minute break rule.
    pub fn is_rest(&self) -> bool {
        matches!(self, HosStatus::OffDuty | HosStatus::SleeperBerth)
    }
}

impl fmt::Display for HosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HosStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFF_DUTY" => Ok(HosStatus::OffDuty),
            "SLEEPER_BERTH" => Ok(HosStatus::SleeperBerth),
            "DRIVING" => Ok(HosStatus::Driving),
            "ON_DUTY" => Ok(HosStatus::OnDuty),
            _ => Err(format!("Invalid HOS status: {}", s)),
        }
    }
}

/// How a log entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HosLogSource {
    Eld,
    Manual,
    Edited,
}

impl HosLogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HosLogSource::Eld => "ELD",
            HosLogSource::Manual => "MANUAL",
            HosLogSource::Edited => "EDITED",
        }
    }
}

impl std::str::FromStr for HosLogSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ELD" => Ok(HosLogSource::Eld),
            "MANUAL" => Ok(HosLogSource::Manual),
            "EDITED" => Ok(HosLogSource::Edited),
            _ => Err(format!("Invalid HOS log source: {}", s)),
        }
    }
}

/// A duty-status interval. At most one log per driver has `end_time == None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HosLog {
    pub log_id: Uuid,
    pub driver_id: Uuid,
    pub status: HosStatus,
    pub start_time: DateTime<Utc>,
    /// None while the interval is the driver's active log.
    pub end_time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub odometer: Option<f64>,
    pub source: HosLogSource,
    pub edit_reason: Option<String>,
    pub certified: bool,
    pub created_at: DateTime<Utc>,
}

impl HosLog {
    /// Duration of the interval as of `as_of`, clipped to `[start, as_of]`.
    pub fn duration_hours(&self, as_of: DateTime<Utc>) -> f64 {
        let end = self.end_time.unwrap_or(as_of).min(as_of);
        if end <= self.start_time {
            return 0.0;
        }
        (end - self.start_time).num_seconds() as f64 / 3600.0
    }
}

// ============================================================================
// Violations
// ============================================================================

/// Which HOS rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HosViolationType {
    DriveTimeExceeded,
    OnDutyTimeExceeded,
    CycleTimeExceeded,
    RequiredBreakMissed,
}

impl HosViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HosViolationType::DriveTimeExceeded => "DRIVE_TIME_EXCEEDED",
            HosViolationType::OnDutyTimeExceeded => "ON_DUTY_TIME_EXCEEDED",
            HosViolationType::CycleTimeExceeded => "CYCLE_TIME_EXCEEDED",
            HosViolationType::RequiredBreakMissed => "REQUIRED_BREAK_MISSED",
        }
    }
}

impl fmt::Display for HosViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HosViolationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRIVE_TIME_EXCEEDED" => Ok(HosViolationType::DriveTimeExceeded),
            "ON_DUTY_TIME_EXCEEDED" => Ok(HosViolationType::OnDutyTimeExceeded),
            "CYCLE_TIME_EXCEEDED" => Ok(HosViolationType::CycleTimeExceeded),
            "REQUIRED_BREAK_MISSED" => Ok(HosViolationType::RequiredBreakMissed),
            _ => Err(format!("Invalid HOS violation type: {}", s)),
        }
    }
}

/// Violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Warning,
    Critical,
}

impl ViolationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationSeverity::Warning => "WARNING",
            ViolationSeverity::Critical => "CRITICAL",
        }
    }

    /// Severity for a given overage: two hours or more past a limit is critical.
    pub fn for_overage(overage_hours: f64) -> Self {
        if overage_hours >= 2.0 {
            ViolationSeverity::Critical
        } else {
            ViolationSeverity::Warning
        }
    }
}

impl std::str::FromStr for ViolationSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WARNING" => Ok(ViolationSeverity::Warning),
            "CRITICAL" => Ok(ViolationSeverity::Critical),
            _ => Err(format!("Invalid violation severity: {}", s)),
        }
    }
}

/// A detected HOS violation. Created only by ledger evaluation; user input is
/// limited to resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HosViolation {
    pub violation_id: Uuid,
    pub driver_id: Uuid,
    pub violation_type: HosViolationType,
    pub severity: ViolationSeverity,
    pub actual_hours: f64,
    pub limit_hours: f64,
    pub overage_hours: f64,
    pub flagged_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Request payload for a duty status change.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordDutyStatusRequest {
    pub driver_id: Uuid,

    pub status: HosStatus,

    /// Timestamp in milliseconds since epoch.
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: i64,

    #[validate(custom(function = "crate::models::validate_optional_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "crate::models::validate_optional_longitude"))]
    pub longitude: Option<f64>,

    #[validate(custom(function = "crate::models::validate_optional_odometer"))]
    pub odometer: Option<f64>,

    #[serde(default = "default_log_source")]
    pub source: HosLogSource,
}

fn default_log_source() -> HosLogSource {
    HosLogSource::Eld
}

/// Request payload for editing a historical log. An edit reason is mandatory.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditHosLogRequest {
    #[validate(length(min = 1, max = 500, message = "Edit reason is required"))]
    pub edit_reason: String,

    pub status: Option<HosStatus>,

    pub start_time: Option<DateTime<Utc>>,

    pub end_time: Option<DateTime<Utc>>,

    #[validate(custom(function = "crate::models::validate_optional_odometer"))]
    pub odometer: Option<f64>,
}

/// Request payload for resolving a violation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveViolationRequest {
    #[validate(length(min = 1, max = 500, message = "Resolution note is required"))]
    pub note: String,
}

/// Response payload for HOS log reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HosLogResponse {
    pub log_id: Uuid,
    pub driver_id: Uuid,
    pub status: HosStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub source: HosLogSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_reason: Option<String>,
    pub certified: bool,
}

impl From<HosLog> for HosLogResponse {
    fn from(log: HosLog) -> Self {
        Self {
            log_id: log.log_id,
            driver_id: log.driver_id,
            status: log.status,
            start_time: log.start_time,
            end_time: log.end_time,
            source: log.source,
            edit_reason: log.edit_reason,
            certified: log.certified,
        }
    }
}

/// Rolling-window compliance summary for a driver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HosSummaryResponse {
    pub driver_id: Uuid,
    pub as_of: DateTime<Utc>,
    pub hours_driven_today: f64,
    pub hours_available_drive: f64,
    pub hours_on_duty_today: f64,
    pub hours_available_duty: f64,
    pub hours_in_cycle: f64,
    pub hours_available_cycle: f64,
    pub cycle_limit: f64,
    /// Driving hours left before a 30-minute break is required.
    pub hours_until_break_required: f64,
}

/// Compliance alert payload pushed to dashboards when a violation is flagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceAlertResponse {
    pub violation_id: Uuid,
    pub driver_id: Uuid,
    pub violation_type: HosViolationType,
    pub severity: ViolationSeverity,
    pub actual_value: f64,
    pub limit_value: f64,
    pub overage_amount: f64,
    pub flagged_at: DateTime<Utc>,
    pub resolved: bool,
}

impl From<HosViolation> for ComplianceAlertResponse {
    fn from(v: HosViolation) -> Self {
        Self {
            violation_id: v.violation_id,
            driver_id: v.driver_id,
            violation_type: v.violation_type,
            severity: v.severity,
            actual_value: v.actual_hours,
            limit_value: v.limit_hours,
            overage_amount: v.overage_hours,
            flagged_at: v.flagged_at,
            resolved: v.resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_hos_status_round_trip() {
        for status in [
            HosStatus::OffDuty,
            HosStatus::SleeperBerth,
            HosStatus::Driving,
            HosStatus::OnDuty,
        ] {
            assert_eq!(HosStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(HosStatus::Driving.is_working());
        assert!(HosStatus::OnDuty.is_working());
        assert!(!HosStatus::OffDuty.is_working());
        assert!(HosStatus::OffDuty.is_rest());
        assert!(HosStatus::SleeperBerth.is_rest());
        assert!(!HosStatus::Driving.is_rest());
    }

    #[test]
    fn test_violation_type_round_trip() {
        for vt in [
            HosViolationType::DriveTimeExceeded,
            HosViolationType::OnDutyTimeExceeded,
            HosViolationType::CycleTimeExceeded,
            HosViolationType::RequiredBreakMissed,
        ] {
            assert_eq!(HosViolationType::from_str(vt.as_str()), Ok(vt));
        }
    }

    #[test]
    fn test_severity_for_overage() {
        assert_eq!(ViolationSeverity::for_overage(0.5), ViolationSeverity::Warning);
        assert_eq!(ViolationSeverity::for_overage(1.99), ViolationSeverity::Warning);
        assert_eq!(ViolationSeverity::for_overage(2.0), ViolationSeverity::Critical);
        assert_eq!(ViolationSeverity::for_overage(5.0), ViolationSeverity::Critical);
    }

    #[test]
    fn test_log_duration_clipping() {
        let start = Utc::now() - chrono::Duration::hours(4);
        let log = HosLog {
            log_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            status: HosStatus::Driving,
            start_time: start,
            end_time: None,
            latitude: None,
            longitude: None,
            odometer: None,
            source: HosLogSource::Eld,
            edit_reason: None,
            certified: false,
            created_at: start,
        };

        // Open log accrues up to as_of
        let hours = log.duration_hours(Utc::now());
        assert!((hours - 4.0).abs() < 0.01);

        // as_of before start yields zero
        assert_eq!(log.duration_hours(start - chrono::Duration::hours(1)), 0.0);
    }

    #[test]
    fn test_edit_request_requires_reason() {
        use validator::Validate;
        let request = EditHosLogRequest {
            edit_reason: String::new(),
            status: None,
            start_time: None,
            end_time: None,
            odometer: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_record_request_default_source() {
        let json = format!(
            r#"{{
                "driverId": "550e8400-e29b-41d4-a716-446655440000",
                "status": "DRIVING",
                "timestamp": {}
            }}"#,
            Utc::now().timestamp_millis()
        );
        let request: RecordDutyStatusRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.status, HosStatus::Driving);
        assert_eq!(request.source, HosLogSource::Eld);
    }

    #[test]
    fn test_compliance_alert_from_violation() {
        let violation = HosViolation {
            violation_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            violation_type: HosViolationType::DriveTimeExceeded,
            severity: ViolationSeverity::Warning,
            actual_hours: 12.0,
            limit_hours: 11.0,
            overage_hours: 1.0,
            flagged_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            resolution_note: None,
        };
        let alert = ComplianceAlertResponse::from(violation);
        assert_eq!(alert.actual_value, 12.0);
        assert_eq!(alert.limit_value, 11.0);
        assert_eq!(alert.overage_amount, 1.0);

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"violationType\":\"DRIVE_TIME_EXCEEDED\""));
        assert!(json.contains("\"overageAmount\":1"));
    }
}
