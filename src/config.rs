//! Engine configuration.
//!
//! Loaded from defaults, an optional `class-schedule.toml`, and environment
//! variables prefixed with `CLASS_SCHEDULE_` (`__` separates sections, e.g.
//! `CLASS_SCHEDULE_API__BASE_URL`). A `.env` file is read first.

use std::time::Duration;

use chrono::NaiveDate;
use config::Config;
use serde::Deserialize;

use crate::calendar::{AbCalendar, Expander, WeekNumbering};
use crate::conflict::{ConflictDetector, DEFAULT_REFERENCE_WEEK};
use crate::error::ScheduleResult;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token attached to every request, if any.
    pub token: Option<String>,
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    /// Per-call timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Any date in the week used as the common timeline for conflict checks.
    pub reference_week: NaiveDate,
    pub week_numbering: WeekNumbering,
}

impl CalendarConfig {
    /// Expander labelling instances with the configured numbering.
    #[must_use]
    pub fn expander(&self) -> Expander {
        Expander::new(AbCalendar::new(self.week_numbering))
    }

    /// Conflict detector on the configured reference week.
    #[must_use]
    pub fn detector(&self) -> ConflictDetector {
        ConflictDetector::new(self.reference_week, self.expander())
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            reference_week: DEFAULT_REFERENCE_WEEK,
            week_numbering: WeekNumbering::Iso,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, `class-schedule.toml`, then the environment.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> ScheduleResult<Self> {
        Ok(Config::builder()
            .set_default("api.base_url", "http://localhost:8000/api")?
            .set_default("api.request_timeout_ms", 10_000)?
            .set_default("calendar.reference_week", DEFAULT_REFERENCE_WEEK.to_string())?
            .set_default("calendar.week_numbering", "iso")?
            .add_source(config::File::with_name("class-schedule.toml").required(false))
            .add_source(
                config::Environment::with_prefix("CLASS_SCHEDULE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// Loads `.env` (if present) and then [`Settings::load`].
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> ScheduleResult<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
