//! [`RuleStore`] implementation for [`Database`].

use async_trait::async_trait;
use chrono::NaiveDate;
use officehours_core::{OfficeHour, RuleStore, Weekday};

use crate::database::Database;
use crate::error::StorageError;

type CoreResult<T> = officehours_core::Result<T>;

#[async_trait]
impl RuleStore for Database {
    async fn upsert(&self, rule: OfficeHour) -> CoreResult<OfficeHour> {
        Ok(self.upsert_office_hour(&rule)?)
    }

    async fn list_all(&self) -> CoreResult<Vec<OfficeHour>> {
        Ok(self.get_all_office_hours()?)
    }

    async fn get(&self, id: &str) -> CoreResult<OfficeHour> {
        self.get_office_hour(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()).into())
    }

    async fn delete_by_id(&self, id: &str) -> CoreResult<()> {
        Ok(self.delete_office_hour(id)?)
    }

    async fn find_by_calendar_date(&self, date: NaiveDate) -> CoreResult<Vec<OfficeHour>> {
        Ok(self.get_office_hours_for_date(date)?)
    }

    async fn find_by_weekday(&self, weekday: Weekday) -> CoreResult<Vec<OfficeHour>> {
        Ok(self.get_office_hours_for_weekday(weekday)?)
    }
}
