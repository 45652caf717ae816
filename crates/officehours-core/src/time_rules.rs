//! Time-of-day ranges and their resolution against calendar days.
//!
//! A [`DayTimeRange`] carries no calendar component. Resolving it against a
//! concrete day reads both endpoints as wall-clock times on that day and
//! yields an [`AbsoluteInterval`], which is tested with a half-open
//! containment check.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Days of the week for rule scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Converts from chrono's Weekday.
    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monday" => Some(Weekday::Monday),
            "tuesday" => Some(Weekday::Tuesday),
            "wednesday" => Some(Weekday::Wednesday),
            "thursday" => Some(Weekday::Thursday),
            "friday" => Some(Weekday::Friday),
            "saturday" => Some(Weekday::Saturday),
            "sunday" => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time of day with second precision.
///
/// `24:00:00` is representable so that a range can run until the end of the
/// day; it is only accepted as the end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayTime {
    /// Hour (0-23, or 24 for end of day).
    pub hour: u8,
    /// Minute (0-59).
    #[serde(default)]
    pub minute: u8,
    /// Second (0-59).
    #[serde(default)]
    pub second: u8,
}

impl DayTime {
    /// The end of the day, `24:00:00`.
    pub const END_OF_DAY: DayTime = DayTime::new(24, 0, 0);

    /// Creates a new DayTime. Values are checked by [`DayTimeRange::validate`].
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Creates a DayTime from hour only.
    pub const fn from_hour(hour: u8) -> Self {
        Self::new(hour, 0, 0)
    }

    /// Creates a DayTime from hour and minute.
    pub const fn from_hm(hour: u8, minute: u8) -> Self {
        Self::new(hour, minute, 0)
    }

    /// Seconds elapsed since midnight.
    pub fn to_seconds(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }

    /// This time of day on `day` in `tz`. `24:00:00` is the next midnight.
    pub fn on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> DateTime<Tz> {
        if self.is_end_of_day() {
            return local_midnight(day.succ_opt().unwrap_or(day), tz);
        }

        let time = NaiveTime::from_hms_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
        .unwrap_or(NaiveTime::MIN);
        wall_clock(day.and_time(time), tz)
    }

    /// Returns true for `24:00:00`.
    pub fn is_end_of_day(&self) -> bool {
        *self == Self::END_OF_DAY
    }

    fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60 && self.second < 60
    }
}

impl PartialOrd for DayTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DayTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_seconds().cmp(&other.to_seconds())
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// A time range with start and end times of day.
///
/// When `end` is earlier than `start` the range is overnight: the end is
/// anchored to the day after the one the range is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayTimeRange {
    /// Start time of the range (inclusive).
    pub start: DayTime,
    /// End time of the range (exclusive).
    pub end: DayTime,
}

impl DayTimeRange {
    /// Creates a new time range.
    pub fn new(start: DayTime, end: DayTime) -> Self {
        Self { start, end }
    }

    /// Creates a time range from hour values.
    pub fn from_hours(start_hour: u8, end_hour: u8) -> Self {
        Self {
            start: DayTime::from_hour(start_hour),
            end: DayTime::from_hour(end_hour),
        }
    }

    /// Returns true if this is an overnight range (crosses midnight).
    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    /// Checks both endpoints. `index` is reported back in the error.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if !self.start.is_valid() {
            return Err(ValidationError::InvalidTime {
                index,
                time: self.start,
            });
        }
        if !(self.end.is_valid() || self.end.is_end_of_day()) {
            return Err(ValidationError::InvalidTime {
                index,
                time: self.end,
            });
        }
        Ok(())
    }

    /// Anchors this range to `day` in `tz`, reading both endpoints as local
    /// wall-clock times.
    pub fn resolve<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> AbsoluteInterval<Tz> {
        let start = self.start.on(day, tz);

        let end_day = if self.is_overnight() {
            day.succ_opt().unwrap_or(day)
        } else {
            day
        };
        let end = self.end.on(end_day, tz);

        AbsoluteInterval { start, end }
    }
}

/// A concrete `[start, end)` interval.
#[derive(Debug, Clone)]
pub struct AbsoluteInterval<Tz: TimeZone> {
    /// First instant inside the interval.
    pub start: DateTime<Tz>,
    /// First instant after the interval.
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> AbsoluteInterval<Tz> {
    /// Half-open containment: `start <= instant < end`.
    pub fn contains<Tz2: TimeZone>(&self, instant: &DateTime<Tz2>) -> bool {
        self.start <= *instant && *instant < self.end
    }
}

/// Midnight of `day` in `tz`.
pub fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    wall_clock(day.and_time(NaiveTime::MIN), tz)
}

/// The instant showing `local` on the clocks of `tz`.
///
/// Ambiguous times take the earlier instant. A time inside a DST gap keeps
/// the offset in force before the gap, so it lands the gap's length later.
fn wall_clock<Tz: TimeZone>(local: NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    if let Some(instant) = tz.from_local_datetime(&local).earliest() {
        return instant;
    }

    let before_gap = (1..=24)
        .map(|h| local - Duration::hours(h))
        .find_map(|probe| tz.from_local_datetime(&probe).earliest());

    match before_gap {
        Some(probe) => {
            let offset = probe.offset().fix().local_minus_utc();
            tz.from_utc_datetime(&(local - Duration::seconds(offset as i64)))
        }
        None => tz.from_utc_datetime(&local),
    }
}
