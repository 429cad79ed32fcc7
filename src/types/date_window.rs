//! Defines the optional date window used to select streams by coverage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` date window where either bound may be omitted.
///
/// An omitted bound disables that side of the coverage filter, so
/// `DateWindow::default()` admits every stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    /// Requested first day (inclusive), if any.
    pub start: Option<NaiveDate>,
    /// Requested last day (inclusive), if any.
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A window with both bounds set.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns true when a coverage range `[coverage_start, coverage_end]`
    /// intersects this window.
    ///
    /// A stream is kept only if it starts on or before the requested end and
    /// ends on or after the requested start.
    pub fn overlaps(&self, coverage_start: NaiveDate, coverage_end: NaiveDate) -> bool {
        let starts_in_time = self.end.map_or(true, |end| coverage_start <= end);
        let ends_in_time = self.start.map_or(true, |start| coverage_end >= start);
        starts_in_time && ends_in_time
    }
}

/// A concrete, fully bounded reporting period used when requesting payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<ReportPeriod> for DateWindow {
    fn from(period: ReportPeriod) -> Self {
        DateWindow::between(period.start, period.end)
    }
}
