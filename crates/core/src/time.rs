use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Returns the calendar day the user is living in.
    ///
    /// The system clock uses the device's local timezone; a fixed clock is
    /// pinned to UTC so tests do not depend on the host timezone.
    #[must_use]
    pub fn today(&self) -> CalendarDay {
        match self {
            Clock::Default => CalendarDay::from_date(Local::now().date_naive()),
            Clock::Fixed(t) => CalendarDay::from_date(t.date_naive()),
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

//
// ─── CALENDAR DAY ──────────────────────────────────────────────────────────────
//

/// Format written to storage for day markers.
const ISO_FORMAT: &str = "%Y-%m-%d";

/// Marker format older clients wrote (`Mon Jan 01 2024`).
const LEGACY_FORMAT: &str = "%a %b %d %Y";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognised day marker: {raw:?}")]
pub struct CalendarDayError {
    pub raw: String,
}

/// A timezone-free calendar date identifying "today" for the daily program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a day from year, month and day-of-month.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parses a stored marker, accepting both ISO and the legacy format.
    ///
    /// # Errors
    ///
    /// Returns `CalendarDayError` when neither format matches.
    pub fn parse_marker(raw: &str) -> Result<Self, CalendarDayError> {
        let trimmed = raw.trim();
        NaiveDate::parse_from_str(trimmed, ISO_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(trimmed, LEGACY_FORMAT))
            .map(Self)
            .map_err(|_| CalendarDayError {
                raw: raw.to_owned(),
            })
    }

    /// Marker string written to storage.
    #[must_use]
    pub fn marker(&self) -> String {
        self.0.format(ISO_FORMAT).to_string()
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl fmt::Debug for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalendarDay({})", self.marker())
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marker())
    }
}

impl FromStr for CalendarDay {
    type Err = CalendarDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_marker(s)
    }
}

impl TryFrom<String> for CalendarDay {
    type Error = CalendarDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_marker(&value)
    }
}

impl From<CalendarDay> for String {
    fn from(value: CalendarDay) -> Self {
        value.marker()
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
