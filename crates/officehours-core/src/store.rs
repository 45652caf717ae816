//! Rule store abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::office_hour::OfficeHour;
use crate::time_rules::Weekday;

/// Persistent storage for office-hour rules.
///
/// Sequences are returned in store order. Implementations must treat
/// "nothing matched" on the lookup methods as an empty result.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Inserts or fully replaces a rule. A rule without an id gets a new one.
    async fn upsert(&self, rule: OfficeHour) -> Result<OfficeHour>;

    /// All rules.
    async fn list_all(&self) -> Result<Vec<OfficeHour>>;

    /// One rule by id, or [`Error::NotFound`](crate::Error::NotFound).
    async fn get(&self, id: &str) -> Result<OfficeHour>;

    /// Deletes a rule by id, or fails with [`Error::NotFound`](crate::Error::NotFound).
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Rules whose calendar date selects `date`, recurring or pinned.
    async fn find_by_calendar_date(&self, date: NaiveDate) -> Result<Vec<OfficeHour>>;

    /// Rules selecting `weekday`.
    async fn find_by_weekday(&self, weekday: Weekday) -> Result<Vec<OfficeHour>>;
}

#[async_trait]
impl<T: RuleStore + ?Sized> RuleStore for Arc<T> {
    async fn upsert(&self, rule: OfficeHour) -> Result<OfficeHour> {
        (**self).upsert(rule).await
    }

    async fn list_all(&self) -> Result<Vec<OfficeHour>> {
        (**self).list_all().await
    }

    async fn get(&self, id: &str) -> Result<OfficeHour> {
        (**self).get(id).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        (**self).delete_by_id(id).await
    }

    async fn find_by_calendar_date(&self, date: NaiveDate) -> Result<Vec<OfficeHour>> {
        (**self).find_by_calendar_date(date).await
    }

    async fn find_by_weekday(&self, weekday: Weekday) -> Result<Vec<OfficeHour>> {
        (**self).find_by_weekday(weekday).await
    }
}
