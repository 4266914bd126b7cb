//! Scheduling domain models.
//!
//! Provides the core data types of the school schedule engine: recurring
//! class definitions, their materialized calendar events, teacher
//! availability windows, and the weekday encodings that connect them.
//!
//! # Domain Mappings
//!
//! | Type | Master schedule UI | Stored form |
//! |------|--------------------|-------------|
//! | `ClassDefinition` | Class in the create/edit form | 1..5 schedule rows sharing a group id |
//! | `EventInstance` | Block on the weekly calendar | start/end of one row |
//! | `AvailabilityWindow` | Teacher availability slot | teacher availability record |

mod availability;
mod class;
mod event;
mod weekday;

pub use availability::{
    is_within_availability, merge_overlapping_windows, AvailabilityIndex, AvailabilityWindow,
};
pub use class::{AbDay, ClassDefinition, TeacherId};
pub use event::EventInstance;
pub use weekday::{
    normalize_day_of_week, recurring_day_to_weekday_number, weekday_from_number, DayValue,
    RecurringDay,
};
