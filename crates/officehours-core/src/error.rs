//! Error types for office-hour resolution.

use thiserror::Error;

use crate::office_hour::CalendarDate;
use crate::time_rules::DayTime;

/// Errors surfaced by rule stores, holiday oracles and the resolver.
#[derive(Debug, Error)]
pub enum Error {
    /// The referenced office hour does not exist.
    #[error("office hour not found: {0}")]
    NotFound(String),

    /// The office hour failed validation and was not persisted.
    #[error("invalid office hour: {0}")]
    InvalidRule(#[from] ValidationError),

    /// The rule store or holiday oracle could not be reached or failed.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl Error {
    /// Returns true for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Reasons an office hour is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Neither a weekday nor a date was given.
    #[error("missing selector: either day_of_week or date must be set")]
    MissingSelector,

    /// Both a weekday and a date were given.
    #[error("conflicting selector: only one of day_of_week or date may be set")]
    ConflictingSelector,

    /// The rule has no time ranges.
    #[error("missing time ranges")]
    NoTimeRanges,

    /// A time of day is out of range.
    #[error("time range {index}: invalid time of day {time}")]
    InvalidTime {
        /// Position of the offending range.
        index: usize,
        /// The rejected value.
        time: DayTime,
    },

    /// The calendar date does not exist.
    #[error("invalid date: {0}")]
    InvalidDate(CalendarDate),
}

/// Result type for office-hour operations.
pub type Result<T> = std::result::Result<T, Error>;
