//! Domain error taxonomy.
//!
//! Services return these directly; the api crate maps them onto HTTP status
//! codes. The core never swallows a domain error — best-effort gateway
//! publishes are the only failures that get logged and dropped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input. Caller's fault, never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Concurrent mutation or duplicate-active-state violation.
    /// Caller should retry with fresh state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// State-machine rule violation. Not retryable without changing the request.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Driver is not available for assignment.
    #[error("Driver unavailable: {0}")]
    DriverUnavailable(String),

    /// Dispatch completion attempted before the load reached a delivered state.
    #[error("Premature completion: {0}")]
    PrematureCompletion(String),

    /// HOS timestamp precedes the currently active duty log.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Repository I/O failure. May be transient; safe to retry the operation.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    /// Short machine-readable code for logs and wire payloads.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvalidTransition(_) => "invalid_transition",
            DomainError::DriverUnavailable(_) => "driver_unavailable",
            DomainError::PrematureCompletion(_) => "premature_completion",
            DomainError::InvalidTimestamp(_) => "invalid_timestamp",
            DomainError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.as_ref().map(|m| m.to_string()).unwrap_or_default()
                    )
                })
            })
            .collect();
        DomainError::Validation(messages.join(", "))
    }
}
