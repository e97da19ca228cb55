use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialDateError {
    #[error("Month out of range: {0}")]
    Month(u32),
    #[error("Day out of range: {0}")]
    Day(u32),
}

/// A transaction date as printed on a statement line: month and day, no year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PartialDateFields")]
pub struct PartialDate {
    month: u32,
    day: u32,
}

impl PartialDate {
    pub fn new(month: u32, day: u32) -> Result<Self, PartialDateError> {
        if !(1..=12).contains(&month) {
            return Err(PartialDateError::Month(month));
        }
        if !(1..=31).contains(&day) {
            return Err(PartialDateError::Day(day));
        }
        Ok(PartialDate { month, day })
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn day(self) -> u32 {
        self.day
    }
}

#[derive(Deserialize)]
struct PartialDateFields {
    month: u32,
    day: u32,
}

impl TryFrom<PartialDateFields> for PartialDate {
    type Error = PartialDateError;

    fn try_from(fields: PartialDateFields) -> Result<Self, Self::Error> {
        PartialDate::new(fields.month, fields.day)
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.day)
    }
}

/// Places a partial date in the statement's year.
///
/// A month later than the reference month can only be a wrap into the
/// previous year (a January statement listing December activity). Anything
/// else belongs to the reference year. Returns `None` when `partial` is absent
/// or the result is not a real calendar day (Feb 29 outside a leap year).
pub fn resolve(partial: Option<PartialDate>, reference: NaiveDate) -> Option<NaiveDate> {
    let partial = partial?;
    let year = if partial.month > reference.month() {
        reference.year() - 1
    } else {
        reference.year()
    };
    NaiveDate::from_ymd_opt(year, partial.month, partial.day)
}
