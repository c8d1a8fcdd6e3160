use std::fmt::Display;

use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime,
};

use crate::result::{bail, err_msg, Result};

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A window of whole UTC days, from the start of `first` up to
/// (excluding) the start of the day after `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    first: Date,
    last: Date,
    after: Date,
}

impl TimeRange {
    /// Parse two `YYYY-MM-DD` dates.
    ///
    /// Both days are included. Fails if a date is malformed or if the
    /// start comes after the end.
    pub fn from_days(start: &str, end: &str) -> Result<Self> {
        let first = parse_day(start)?;
        let last = parse_day(end)?;

        if first > last {
            return bail(format!("Start date {first} is after the end date {last}"));
        }
        let Some(after) = last.next_day() else {
            return bail(format!("End date {last} is out of range"));
        };

        Ok(Self { first, last, after })
    }

    pub fn start(&self) -> OffsetDateTime {
        self.first.midnight().assume_utc()
    }

    /// Exclusive end of the window, midnight after the last day
    pub fn end(&self) -> OffsetDateTime {
        self.after.midnight().assume_utc()
    }

    /// `started_at` query value, e.g. `2024-01-01T00:00:00Z`
    pub fn started_at(&self) -> String {
        format_utc(self.start())
    }

    /// `ended_at` query value, e.g. `2024-01-03T00:00:00Z` for a range ending on the 2nd
    pub fn ended_at(&self) -> String {
        format_utc(self.end())
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.first, self.last)
    }
}

fn parse_day(input: &str) -> Result<Date> {
    Date::parse(input.trim(), DAY_FORMAT)
        .map_err(|_| err_msg(format!("Invalid date '{input}'. Please use YYYY-MM-DD")))
}

fn format_utc(instant: OffsetDateTime) -> String {
    // Rfc3339 writes the UTC offset as 'Z'
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| instant.unix_timestamp().to_string())
}
