//! Office-hour rule model.
//!
//! [`OfficeHour`] is always valid once constructed: it has exactly one
//! [`Selector`] and at least one well-formed time range. The wire and
//! persisted form is [`OfficeHourRecord`], which carries the selector as two
//! optional fields and is converted with `TryFrom`.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time_rules::{DayTimeRange, Weekday};

/// Year used to validate recurring dates, so that Feb 29 is accepted.
const LEAP_YEAR: i32 = 2000;

/// Pinned years that fit the four-digit storage key.
const PINNED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// A month/day, optionally pinned to one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    /// Month (1-12).
    pub month: u32,
    /// Day of month (1-31).
    pub day: u32,
    /// Pinned year. `None` recurs every year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl CalendarDate {
    /// A date that recurs annually.
    pub fn recurring(month: u32, day: u32) -> Self {
        Self {
            month,
            day,
            year: None,
        }
    }

    /// A date pinned to a single year.
    pub fn pinned(year: i32, month: u32, day: u32) -> Self {
        Self {
            month,
            day,
            year: Some(year),
        }
    }

    /// Storage key: `MM-DD` for recurring dates, `YYYY-MM-DD` for pinned ones.
    pub fn storage_key(&self) -> String {
        match self.year {
            Some(year) => format!("{:04}-{:02}-{:02}", year, self.month, self.day),
            None => format!("{:02}-{:02}", self.month, self.day),
        }
    }

    /// Parses a storage key produced by [`CalendarDate::storage_key`].
    pub fn parse_storage_key(key: &str) -> Option<Self> {
        let parts: Vec<&str> = key.split('-').collect();
        match parts.as_slice() {
            [month, day] => Some(Self::recurring(month.parse().ok()?, day.parse().ok()?)),
            [year, month, day] => Some(Self::pinned(
                year.parse().ok()?,
                month.parse().ok()?,
                day.parse().ok()?,
            )),
            _ => None,
        }
    }

    /// Both storage keys that select `date`: recurring first, then pinned.
    pub fn lookup_keys(date: NaiveDate) -> [String; 2] {
        [
            Self::recurring(date.month(), date.day()).storage_key(),
            Self::pinned(date.year(), date.month(), date.day()).storage_key(),
        ]
    }

    /// Returns true if this date selects `date`.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.month == date.month()
            && self.day == date.day()
            && self.year.map_or(true, |y| y == date.year())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.year.is_some_and(|y| !PINNED_YEARS.contains(&y)) {
            return Err(ValidationError::InvalidDate(*self));
        }

        let year = self.year.unwrap_or(LEAP_YEAR);
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .map(|_| ())
            .ok_or(ValidationError::InvalidDate(*self))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Which days a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Every occurrence of a weekday.
    Weekday(Weekday),
    /// A specific calendar date.
    CalendarDate(CalendarDate),
}

impl Selector {
    /// Returns true if this selector picks `date`.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Selector::Weekday(wd) => *wd == Weekday::from_chrono(date.weekday()),
            Selector::CalendarDate(cd) => cd.matches(date),
        }
    }
}

/// Whether a rule depends on the day being a public holiday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayCondition {
    /// Applies regardless of holiday status.
    #[default]
    Unspecified,
    /// Applies only on public holidays.
    HolidayOnly,
    /// Applies only on days that are not public holidays.
    Exclusive,
}

impl HolidayCondition {
    /// Holiday filter.
    pub fn applies(&self, is_holiday: bool) -> bool {
        match self {
            HolidayCondition::Unspecified => true,
            HolidayCondition::HolidayOnly => is_holiday,
            HolidayCondition::Exclusive => !is_holiday,
        }
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayCondition::Unspecified => "unspecified",
            HolidayCondition::HolidayOnly => "holiday_only",
            HolidayCondition::Exclusive => "exclusive",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unspecified" => Some(HolidayCondition::Unspecified),
            "holiday_only" => Some(HolidayCondition::HolidayOnly),
            "exclusive" => Some(HolidayCondition::Exclusive),
            _ => None,
        }
    }
}

/// A validated office-hour rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OfficeHourRecord", into = "OfficeHourRecord")]
pub struct OfficeHour {
    id: Option<String>,
    selector: Selector,
    holiday_condition: HolidayCondition,
    time_ranges: Vec<DayTimeRange>,
}

impl OfficeHour {
    /// Creates an unpersisted rule with [`HolidayCondition::Unspecified`].
    pub fn new(
        selector: Selector,
        time_ranges: Vec<DayTimeRange>,
    ) -> Result<Self, ValidationError> {
        if let Selector::CalendarDate(date) = &selector {
            date.validate()?;
        }
        if time_ranges.is_empty() {
            return Err(ValidationError::NoTimeRanges);
        }
        for (index, range) in time_ranges.iter().enumerate() {
            range.validate(index)?;
        }

        Ok(Self {
            id: None,
            selector,
            holiday_condition: HolidayCondition::Unspecified,
            time_ranges,
        })
    }

    /// Sets the id. An empty id is treated as absent.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
        self
    }

    /// Sets the holiday condition.
    pub fn with_holiday_condition(mut self, condition: HolidayCondition) -> Self {
        self.holiday_condition = condition;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn holiday_condition(&self) -> HolidayCondition {
        self.holiday_condition
    }

    pub fn time_ranges(&self) -> &[DayTimeRange] {
        &self.time_ranges
    }

    /// Returns true if the selector picks `date` and the holiday condition allows it.
    pub fn applies_on(&self, date: NaiveDate, is_holiday: bool) -> bool {
        self.selector.matches(date) && self.holiday_condition.applies(is_holiday)
    }
}

/// Wire and persisted form of an [`OfficeHour`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeHourRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<CalendarDate>,
    #[serde(default)]
    pub holiday_condition: HolidayCondition,
    #[serde(default)]
    pub time_ranges: Vec<DayTimeRange>,
}

impl TryFrom<OfficeHourRecord> for OfficeHour {
    type Error = ValidationError;

    fn try_from(record: OfficeHourRecord) -> Result<Self, Self::Error> {
        let selector = match (record.day_of_week, record.date) {
            (Some(wd), None) => Selector::Weekday(wd),
            (None, Some(date)) => Selector::CalendarDate(date),
            (None, None) => return Err(ValidationError::MissingSelector),
            (Some(_), Some(_)) => return Err(ValidationError::ConflictingSelector),
        };

        let rule = OfficeHour::new(selector, record.time_ranges)?
            .with_holiday_condition(record.holiday_condition);

        Ok(match record.id {
            Some(id) => rule.with_id(id),
            None => rule,
        })
    }
}

impl From<OfficeHour> for OfficeHourRecord {
    fn from(rule: OfficeHour) -> Self {
        let (day_of_week, date) = match rule.selector {
            Selector::Weekday(wd) => (Some(wd), None),
            Selector::CalendarDate(date) => (None, Some(date)),
        };

        Self {
            id: rule.id,
            day_of_week,
            date,
            holiday_condition: rule.holiday_condition,
            time_ranges: rule.time_ranges,
        }
    }
}
