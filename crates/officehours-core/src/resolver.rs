//! Rule resolution with holiday filtering.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::holiday::{is_public_holiday, HolidayOracle};
use crate::office_hour::OfficeHour;
use crate::open_state::{self, OpenState};
use crate::store::RuleStore;
use crate::time_rules::{AbsoluteInterval, Weekday};

/// The rule that governs a day and its ranges anchored to that day.
#[derive(Debug, Clone)]
pub struct DayRanges<Tz: TimeZone> {
    pub office_hour: Option<OfficeHour>,
    pub open_ranges: Vec<AbsoluteInterval<Tz>>,
}

/// Maps days to applicable rules using a [`RuleStore`] and a [`HolidayOracle`].
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn RuleStore>,
    holidays: Arc<dyn HolidayOracle>,
}

impl Resolver {
    pub fn new(store: Arc<dyn RuleStore>, holidays: Arc<dyn HolidayOracle>) -> Self {
        Self { store, holidays }
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// Rules applying on `date`: date matches first, then weekday matches,
    /// each in store order, filtered by holiday condition.
    pub async fn resolve_office_hours(&self, date: NaiveDate) -> Result<Vec<OfficeHour>> {
        let mut candidates = empty_if_not_found(self.store.find_by_calendar_date(date).await)?;
        candidates.extend(empty_if_not_found(
            self.store
                .find_by_weekday(Weekday::from_chrono(date.weekday()))
                .await,
        )?);

        if candidates.is_empty() {
            return Ok(candidates);
        }

        let is_holiday = self.is_holiday(date).await?;
        let total = candidates.len();
        candidates.retain(|rule| rule.holiday_condition().applies(is_holiday));

        debug!(
            %date,
            is_holiday,
            candidates = total,
            applicable = candidates.len(),
            "Resolved office hours"
        );
        Ok(candidates)
    }

    /// Returns true if the oracle lists `date` as a public holiday.
    pub async fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        let holidays = self.holidays.get_holidays(date.year(), date.month()).await?;
        Ok(is_public_holiday(&holidays, date))
    }

    /// Open state at `now`, including overnight ranges carried over from the previous day.
    pub async fn open_state_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<OpenState<Tz>> {
        let today = now.date_naive();
        let rules = self.resolve_office_hours(today).await?;

        let previous = match today.pred_opt() {
            Some(yesterday) => self.resolve_office_hours(yesterday).await?,
            None => Vec::new(),
        };

        Ok(open_state::evaluate(now, &rules, &previous))
    }

    /// The governing rule for `date` and its ranges anchored to `date` in `tz`.
    ///
    /// When more than one rule applies the first wins and a warning is logged.
    pub async fn office_hour_ranges<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<DayRanges<Tz>> {
        let rules = self.resolve_office_hours(date).await?;

        if rules.len() > 1 {
            warn!(
                %date,
                count = rules.len(),
                "Multiple office hours apply, using the first"
            );
        }

        let office_hour = rules.into_iter().next();
        let open_ranges = office_hour
            .as_ref()
            .map(|rule| {
                rule.time_ranges()
                    .iter()
                    .map(|range| range.resolve(date, tz))
                    .collect()
            })
            .unwrap_or_default();

        Ok(DayRanges {
            office_hour,
            open_ranges,
        })
    }
}

fn empty_if_not_found(result: Result<Vec<OfficeHour>>) -> Result<Vec<OfficeHour>> {
    match result {
        Err(Error::NotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}
