//! Office Hours Core - rules, holidays and open-state resolution.
//!
//! This crate holds everything needed to answer "are we open right now":
//!
//! - [`office_hour`] - the validated office-hour rule model
//! - [`time_rules`] - time-of-day ranges and their resolution to absolute intervals
//! - [`holiday`] - holiday records, the holiday oracle trait and its cache
//! - [`open_state`] - open/closed evaluation and next-edge prediction
//! - [`resolver`] - rule lookup with holiday filtering on top of a [`RuleStore`]
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use officehours_core::office_hour::{OfficeHour, Selector};
//! use officehours_core::open_state;
//! use officehours_core::time_rules::{DayTimeRange, Weekday};
//!
//! let monday = OfficeHour::new(
//!     Selector::Weekday(Weekday::Monday),
//!     vec![DayTimeRange::from_hours(8, 12), DayTimeRange::from_hours(13, 17)],
//! )
//! .unwrap();
//!
//! let nine_am = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
//! let state = open_state::evaluate(&nine_am, &[monday], &[]);
//! assert!(state.is_open);
//! ```

pub mod error;
pub mod holiday;
pub mod holiday_client;
pub mod office_hour;
pub mod open_state;
pub mod resolver;
pub mod store;
pub mod time_rules;

pub use error::{Error, Result, ValidationError};
pub use holiday::{CachingHolidayOracle, HolidayInfo, HolidayOracle, HolidayType, NoHolidays};
pub use holiday_client::HttpHolidayOracle;
pub use office_hour::{CalendarDate, HolidayCondition, OfficeHour, OfficeHourRecord, Selector};
pub use open_state::OpenState;
pub use resolver::{DayRanges, Resolver};
pub use store::RuleStore;
pub use time_rules::{AbsoluteInterval, DayTime, DayTimeRange, Weekday};
