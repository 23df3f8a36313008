//! Postgres implementations of the domain repository traits.

pub mod dispatch;
pub mod driver_availability;
pub mod geofence_alert;
pub mod hos;
pub mod load;
pub mod location;
pub mod note;

pub use dispatch::PgDispatchRepository;
pub use driver_availability::PgDriverAvailabilityRepository;
pub use geofence_alert::PgGeofenceAlertRepository;
pub use hos::PgHosRepository;
pub use load::PgLoadRepository;
pub use location::PgLocationRepository;
pub use note::PgNoteRepository;

use domain::error::DomainError;

/// Maps a sqlx failure onto the domain taxonomy, logging the raw error.
pub(crate) fn db_err(context: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, context, "database query failed");
    DomainError::Persistence(format!("{}: {}", context, err))
}

/// True when the error is a unique-constraint violation, which the schema
/// uses to enforce the one-active-dispatch and one-active-log invariants.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}
