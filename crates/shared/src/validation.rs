//! Common validation utilities.

use chrono::{TimeZone, Utc};
use validator::ValidationError;

/// Maximum age of a reported timestamp in days.
const MAX_TIMESTAMP_AGE_DAYS: i64 = 7;

/// Maximum allowed future timestamp tolerance in seconds (clock skew).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 300;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that GPS accuracy is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("accuracy_range");
        err.message = Some("Accuracy must be non-negative".into());
        Err(err)
    }
}

/// Validates that heading is within valid range (0 to 360).
pub fn validate_heading(heading: f64) -> Result<(), ValidationError> {
    if (0.0..=360.0).contains(&heading) {
        Ok(())
    } else {
        let mut err = ValidationError::new("heading_range");
        err.message = Some("Heading must be between 0 and 360".into());
        Err(err)
    }
}

/// Validates that speed is non-negative.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("speed_range");
        err.message = Some("Speed must be non-negative".into());
        Err(err)
    }
}

/// Validates that an odometer reading is non-negative.
pub fn validate_odometer(odometer: f64) -> Result<(), ValidationError> {
    if odometer >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("odometer_range");
        err.message = Some("Odometer must be non-negative".into());
        Err(err)
    }
}

/// Validates that a timestamp (milliseconds since epoch) is within acceptable range.
/// - Must not be more than 5 minutes in the future (allows for clock skew)
/// - Must not be older than 7 days
pub fn validate_timestamp(timestamp_millis: i64) -> Result<(), ValidationError> {
    let now = Utc::now();

    let timestamp = match Utc.timestamp_millis_opt(timestamp_millis).single() {
        Some(ts) => ts,
        None => {
            let mut err = ValidationError::new("timestamp_invalid");
            err.message = Some("Invalid timestamp format".into());
            return Err(err);
        }
    };

    let future_limit = now + chrono::Duration::seconds(MAX_FUTURE_TOLERANCE_SECS);
    if timestamp > future_limit {
        let mut err = ValidationError::new("timestamp_future");
        err.message = Some("Timestamp cannot be in the future".into());
        return Err(err);
    }

    let past_limit = now - chrono::Duration::days(MAX_TIMESTAMP_AGE_DAYS);
    if timestamp < past_limit {
        let mut err = ValidationError::new("timestamp_old");
        err.message = Some("Timestamp cannot be older than 7 days".into());
        return Err(err);
    }

    Ok(())
}
