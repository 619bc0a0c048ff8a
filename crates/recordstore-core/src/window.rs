//! Half-open time windows and timestamp parsing.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{CoreError, Result};

/// A half-open interval `[start, end)` of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl TimeWindow {
    /// Creates a window, normalizing both bounds to UTC.
    ///
    /// Fails if a bound has no representable UTC value.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
        Ok(Self {
            start: to_utc(start)?,
            end: to_utc(end)?,
        })
    }

    /// Parses both bounds with [`parse_timestamp`].
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Returns `true` if `instant` is at or after `start` and strictly before `end`.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// A window whose end does not lie after its start matches nothing.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start.format(&Rfc3339).map_err(|_| fmt::Error)?;
        let end = self.end.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "[{start}, {end})")
    }
}

/// Where the exclusive upper bound of a calendar-day window sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayEnd {
    /// `23:59:59.999`, exclusive. A record stamped exactly at the last
    /// millisecond of the day falls outside the window.
    #[default]
    LastMillisecond,
    /// `00:00:00.000` of the following day, exclusive.
    NextMidnight,
}

/// Calendar periods a window can be computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The UTC calendar day.
    Day,
    /// The ISO week, Monday 00:00 to the following Monday 00:00.
    Week,
    /// The calendar month, 1st 00:00 to the 1st of the next month 00:00.
    Month,
}

impl Period {
    /// Computes the window of this period containing `instant` (taken in UTC).
    ///
    /// `day_end` only applies to [`Period::Day`].
    pub fn window_at(self, instant: OffsetDateTime, day_end: DayEnd) -> Result<TimeWindow> {
        let day_start = to_utc(instant)?.replace_time(Time::MIDNIGHT);

        match self {
            Period::Day => {
                let end = match day_end {
                    DayEnd::LastMillisecond => {
                        shift(day_start, Duration::DAY - Duration::MILLISECOND)?
                    }
                    DayEnd::NextMidnight => shift(day_start, Duration::DAY)?,
                };
                TimeWindow::new(day_start, end)
            }
            Period::Week => {
                let back = i64::from(day_start.weekday().number_days_from_monday());
                let start = shift(day_start, -Duration::days(back))?;
                TimeWindow::new(start, shift(start, Duration::WEEK)?)
            }
            Period::Month => {
                let first = day_start.date().replace_day(1)?;
                let next_first = if first.month() == time::Month::December {
                    Date::from_calendar_date(first.year() + 1, time::Month::January, 1)?
                } else {
                    Date::from_calendar_date(first.year(), first.month().next(), 1)?
                };
                TimeWindow::new(
                    first.midnight().assume_utc(),
                    next_first.midnight().assume_utc(),
                )
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

/// Parses a caller-supplied timestamp into a UTC instant.
///
/// Accepted forms:
/// - RFC 3339 (`2024-01-02T10:00:00Z`, `2024-01-02T12:00:00.5+02:00`)
/// - date-time without offset (`2024-01-02T10:00:00[.fff]`), taken as UTC
/// - date only (`2024-01-02`), UTC midnight
/// - integer Unix epoch milliseconds (`1704189600000`)
pub fn parse_timestamp(input: &str) -> Result<OffsetDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return Err(CoreError::invalid_timestamp("empty timestamp"));
    }

    if is_integer(s) {
        let millis: i64 = s
            .parse()
            .map_err(|e| CoreError::invalid_timestamp(format!("'{s}': {e}")))?;
        let nanos = i128::from(millis) * 1_000_000;
        return OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|e| CoreError::invalid_timestamp(format!("'{s}': {e}")));
    }

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return to_utc(dt);
    }

    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    if let Ok(dt) = PrimitiveDateTime::parse(s, &local) {
        return Ok(dt.assume_utc());
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(s, &date_only) {
        return Ok(date.midnight().assume_utc());
    }

    Err(CoreError::invalid_timestamp(format!(
        "'{s}' is not an RFC 3339 timestamp, a date, or epoch milliseconds"
    )))
}

/// Formats an instant as RFC 3339 in UTC.
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String> {
    to_utc(instant)?
        .format(&Rfc3339)
        .map_err(|e| CoreError::invalid_timestamp(e.to_string()))
}

/// Converts to UTC, failing when the result is outside the supported range.
pub fn to_utc(instant: OffsetDateTime) -> Result<OffsetDateTime> {
    instant.checked_to_offset(UtcOffset::UTC).ok_or_else(|| {
        CoreError::invalid_timestamp(format!("{instant} has no representable UTC value"))
    })
}

fn shift(instant: OffsetDateTime, by: Duration) -> Result<OffsetDateTime> {
    instant
        .checked_add(by)
        .ok_or_else(|| CoreError::invalid_timestamp(format!("{instant} shifted by {by} overflows")))
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
