//! Derived views over cached items.
//!
//! Every function here is pure: it takes a snapshot of collection items and
//! recomputes its result from scratch, so nothing can drift out of sync with
//! the cache.

mod contacts;
mod pipeline;
mod tasks;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::calendar::CalendarEvent;
use crate::error::{NexusError, Result};

pub use contacts::{filter_contacts_by_source, search_contacts};
pub use pipeline::{
    PipelineMetrics, StageSummary, conversion_rate, filter_by_stage, group_by_stage,
    stage_breakdown,
};
pub use tasks::{TaskFilter, TaskStats, filter_tasks, tasks_due_between};

/// Parses a server timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`), naive date-times (taken as UTC)
/// and plain dates (midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Inclusive time window used by the date-range filters.
///
/// Construction fails when `from` is after `to`, so an inverted range is
/// reported to the user instead of silently matching nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if from > to {
            return Err(NexusError::validation(
                "date_range",
                "Start date must be on or before end date",
            ));
        }
        Ok(Self { from, to })
    }

    /// Parses both bounds from user input.
    ///
    /// A plain-date upper bound covers that whole day.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let start = parse_timestamp(from).ok_or_else(|| {
            NexusError::validation("from", format!("Invalid start date '{}'", from))
        })?;
        let mut end = parse_timestamp(to)
            .ok_or_else(|| NexusError::validation("to", format!("Invalid end date '{}'", to)))?;
        if NaiveDate::parse_from_str(to.trim(), "%Y-%m-%d").is_ok() {
            end += chrono::Duration::days(1) - chrono::Duration::milliseconds(1);
        }
        Self::new(start, end)
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }

    /// True when `raw` parses and falls inside the range. Malformed or
    /// missing dates never match.
    pub fn contains_raw(&self, raw: Option<&str>) -> bool {
        raw.and_then(parse_timestamp)
            .is_some_and(|at| self.contains(at))
    }
}

/// Keeps the items whose date (as extracted by `date_of`) is inside `range`.
pub fn filter_by_date_range<'a, E, F>(items: &'a [E], range: &DateRange, date_of: F) -> Vec<&'a E>
where
    F: Fn(&E) -> Option<&str>,
{
    items
        .iter()
        .filter(|item| range.contains_raw(date_of(item)))
        .collect()
}

/// Calendar events starting inside `range`.
pub fn events_between<'a>(items: &'a [CalendarEvent], range: &DateRange) -> Vec<&'a CalendarEvent> {
    filter_by_date_range(items, range, |event| event.start_time.as_deref())
}
