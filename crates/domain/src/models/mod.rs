//! Domain models and request/response DTOs.

pub mod dispatch;
pub mod driver;
pub mod geofence;
pub mod hos;
pub mod load;
pub mod location;
pub mod note;

pub use dispatch::{
    AcceptDispatchRequest, AssignDispatchRequest, AutoMatchRequest, Dispatch, DispatchMethod,
    DispatchResponse, DispatchScores, DispatchStatus, RejectDispatchRequest,
};
pub use driver::{
    AvailabilityStatus, DriverAvailability, DriverAvailabilityResponse, DAILY_DRIVING_CAP_HOURS,
    WEEKLY_ON_DUTY_CAP_HOURS,
};
pub use geofence::{
    AcknowledgeAlertRequest, GeofenceAlert, GeofenceAlertResponse, GeofenceAlertType,
    PendingAlertsResponse, ZoneKind,
};
pub use hos::{
    ComplianceAlertResponse, EditHosLogRequest, HosLog, HosLogResponse, HosLogSource, HosStatus,
    HosSummaryResponse, HosViolation, HosViolationType, RecordDutyStatusRequest,
    ResolveViolationRequest, ViolationSeverity,
};
pub use load::{
    ChangeStatusRequest, Load, LoadPhase, LoadResponse, LoadStatus, LoadStatusHistory,
    StatusHistoryResponse, Stop, ValidTransitionsResponse,
};
pub use location::{
    ActiveTrackersResponse, DriverLocation, DriverLocationResponse, IngestLocationRequest,
    LocationHistoryQuery, LocationHistoryResponse,
};
pub use note::{AddNoteRequest, Note, NoteOwner, NoteResponse};

// Optional-field wrappers for the shared validators. The derive unwraps the
// Option and only calls these when a value is present.

pub fn validate_optional_latitude(lat: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_latitude(lat)
}

pub fn validate_optional_longitude(lon: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_longitude(lon)
}

pub fn validate_optional_speed(speed: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_speed(speed)
}

pub fn validate_optional_heading(heading: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_heading(heading)
}

pub fn validate_optional_odometer(odometer: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_odometer(odometer)
}
