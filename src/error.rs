//! Error types for schedule operations.

use thiserror::Error;

use crate::conflict::ConflictMessage;
use crate::models::RecurringDay;
use crate::validation::ValidationError;

/// Errors surfaced by the schedule engine.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Transport failure or timeout. Not retried.
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Input failed validation.
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    /// Conflicts were found and not confirmed.
    #[error("Schedule conflicts: {}", join(.0))]
    Conflict(Vec<ConflictMessage>),

    /// Some weekday rows were written and others were not.
    #[error("Successfully saved {succeeded} of {attempted} changes (failed: {})", join(.failed_days))]
    PartialFailure {
        succeeded: usize,
        attempted: usize,
        failed_days: Vec<RecurringDay>,
    },

    /// Unknown class definition.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A response payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ScheduleError {
    /// Whether the failure left some rows written.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialFailure { .. })
    }
}

impl From<reqwest::Error> for ScheduleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<config::ConfigError> for ScheduleError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_message() {
        let err = ScheduleError::PartialFailure {
            succeeded: 2,
            attempted: 3,
            failed_days: vec![RecurringDay::FRIDAY],
        };
        assert_eq!(
            err.to_string(),
            "Successfully saved 2 of 3 changes (failed: Friday)"
        );
        assert!(err.is_partial());
    }

    #[test]
    fn test_api_message() {
        let err = ScheduleError::Api {
            status: 422,
            message: "Room is required".into(),
        };
        assert_eq!(err.to_string(), "API error (422): Room is required");
        assert!(!err.is_partial());
    }
}
