//! Input validation for class definitions and availability.
//!
//! Checks structural integrity before conflict detection or persistence.
//! Detects:
//! - Missing subject or room
//! - Unknown teacher (non-positive id)
//! - Inverted or empty time ranges
//! - Definitions that materialize to nothing
//! - Out-of-range availability days
//! - Duplicate class group ids

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AvailabilityWindow, ClassDefinition};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// A required text field is blank.
    MissingField,
    /// The teacher id cannot refer to a user.
    InvalidTeacher,
    /// End is not after start.
    InvalidTimeRange,
    /// No recurring days and no school-day start date.
    NoOccurrences,
    /// Day of week outside 0-6.
    InvalidDay,
    /// Two definitions share the same group id.
    DuplicateId,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates one class definition.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_class(class: &ClassDefinition) -> ValidationResult {
    let mut errors = Vec::new();

    if class.subject.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingField,
            format!("Class '{}' has no subject", class.id),
        ));
    }
    if class.room.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingField,
            format!("Class '{}' has no room", class.id),
        ));
    }
    if class.teacher_id <= 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidTeacher,
            format!("Class '{}' references teacher {}", class.id, class.teacher_id),
        ));
    }
    if class.start_time >= class.end_time {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidTimeRange,
            format!(
                "Class '{}' ends at {} which is not after its start {}",
                class.id,
                class.end_time.format("%H:%M"),
                class.start_time.format("%H:%M")
            ),
        ));
    }
    if class.occurrence_days().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoOccurrences,
            format!("Class '{}' does not recur on any school day", class.id),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a set of definitions: each one, plus unique group ids.
pub fn validate_classes(classes: &[ClassDefinition]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids: HashSet<Uuid> = HashSet::new();

    for class in classes {
        if !ids.insert(class.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate class group ID: {}", class.id),
            ));
        }
        if let Err(mut class_errors) = validate_class(class) {
            errors.append(&mut class_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a class about to be stored next to `stored` classes.
///
/// Runs [`validate_class`] and rejects a group id that is already stored;
/// existing classes are changed through an update instead.
pub fn validate_new_class(class: &ClassDefinition, stored: &[ClassDefinition]) -> ValidationResult {
    let mut errors = validate_class(class).err().unwrap_or_default();
    if stored.iter().any(|s| s.id == class.id) {
        errors.push(ValidationError::new(
            ValidationErrorKind::DuplicateId,
            format!("Class '{}' is already stored", class.id),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates availability windows.
pub fn validate_availability(windows: &[AvailabilityWindow]) -> ValidationResult {
    let mut errors = Vec::new();

    for w in windows {
        if w.day_of_week > 6 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDay,
                format!("Teacher {} has a window on day {}", w.teacher_id, w.day_of_week),
            ));
        }
        if w.start_time >= w.end_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeRange,
                format!(
                    "Teacher {} window {}-{} is empty",
                    w.teacher_id,
                    w.start_time.format("%H:%M"),
                    w.end_time.format("%H:%M")
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
