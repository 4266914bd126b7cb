//! School class scheduling engine.
//!
//! Turns recurring class definitions into dated calendar events, labels
//! school days as A or B days, checks classes against teacher availability
//! and existing bookings, and persists each class as one stored row per
//! weekday through a schedule API.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `ClassDefinition`, `EventInstance`,
//!   `AvailabilityWindow`, `RecurringDay`, `AbDay`
//! - **`calendar`**: A/B day classification and recurring expansion
//! - **`conflict`**: Availability and double-booking detection
//! - **`validation`**: Input integrity checks (missing fields, time ranges, duplicate ids)
//! - **`orchestrator`**: Save/update/delete of classes against the schedule API
//! - **`config`**, **`error`**: Settings loading and the error taxonomy
//!
//! # Weekday encodings
//!
//! Availability uses 0=Sunday..6=Saturday; class recurrence uses
//! 0=Monday..4=Friday. Both convert to `chrono::Weekday` at the boundary.
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use class_schedule::calendar::expand;
//! use class_schedule::models::{ClassDefinition, RecurringDay};
//!
//! let math = ClassDefinition::new(
//!     "Math",
//!     7,
//!     "204",
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(9, 50, 0).unwrap(),
//! )
//! .with_days([RecurringDay::MONDAY, RecurringDay::WEDNESDAY]);
//!
//! let week = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
//! assert_eq!(expand(&math, week).len(), 2);
//! ```

pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod validation;

pub use conflict::{detect_conflicts, mark_conflicts, ConflictDetector, ConflictKind, ConflictMessage};
pub use error::{ScheduleError, ScheduleResult};
pub use orchestrator::{MutationReport, ScheduleApi, ScheduleOrchestrator};
