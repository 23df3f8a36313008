//! Entity definitions (database row mappings).
//!
//! Entities mirror table columns one-to-one; conversion into domain models
//! parses the stored enum strings and fails with a `Persistence` error on a
//! corrupt value rather than panicking.

pub mod dispatch;
pub mod driver;
pub mod geofence_alert;
pub mod hos;
pub mod load;
pub mod location;
pub mod note;

pub use dispatch::DispatchEntity;
pub use driver::DriverAvailabilityEntity;
pub use geofence_alert::GeofenceAlertEntity;
pub use hos::{HosLogEntity, HosViolationEntity};
pub use load::{LoadEntity, LoadStatusHistoryEntity};
pub use location::DriverLocationEntity;
pub use note::NoteEntity;

use domain::error::DomainError;

/// Parses a stored enum string, mapping a stale/corrupt value to a
/// persistence error.
pub(crate) fn parse_enum<T>(value: &str, column: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| DomainError::Persistence(format!("Corrupt {} column: {}", column, e)))
}
