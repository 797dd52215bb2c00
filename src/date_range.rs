//! The optional date filter accepted by the income and expense lists.

use serde::Deserialize;
use time::Date;

use crate::validation::parse_date;

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// The raw `start_date` and `end_date` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// The range to filter by.
    ///
    /// Both dates must be present and valid, otherwise there is no filter.
    pub fn to_range(&self) -> Option<DateRange> {
        let start = parse_date(self.start_date.as_deref()?).ok()?;
        let end = parse_date(self.end_date.as_deref()?).ok()?;

        Some(DateRange { start, end })
    }
}
