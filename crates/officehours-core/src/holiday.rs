//! Holiday records and the holiday oracle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Holiday classification. Only public holidays affect rule filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayType {
    #[serde(alias = "PUBLIC", alias = "Public")]
    Public,
    #[serde(other)]
    Other,
}

/// A holiday as reported by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayInfo {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: HolidayType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HolidayInfo {
    pub fn new(date: NaiveDate, kind: HolidayType) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            kind,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Returns true if `holidays` lists `date` as a public holiday.
pub fn is_public_holiday(holidays: &[HolidayInfo], date: NaiveDate) -> bool {
    let key = date.format("%Y-%m-%d").to_string();
    holidays
        .iter()
        .any(|h| h.kind == HolidayType::Public && h.date == key)
}

/// Source of holidays for a given month.
#[async_trait]
pub trait HolidayOracle: Send + Sync {
    /// Returns the holidays in `month` (1-12) of `year`.
    async fn get_holidays(&self, year: i32, month: u32) -> Result<Vec<HolidayInfo>>;
}

#[async_trait]
impl<T: HolidayOracle + ?Sized> HolidayOracle for Arc<T> {
    async fn get_holidays(&self, year: i32, month: u32) -> Result<Vec<HolidayInfo>> {
        (**self).get_holidays(year, month).await
    }
}

/// Oracle for deployments without a holiday service. Every day is a regular day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

#[async_trait]
impl HolidayOracle for NoHolidays {
    async fn get_holidays(&self, _year: i32, _month: u32) -> Result<Vec<HolidayInfo>> {
        Ok(Vec::new())
    }
}

/// Default time a cached month stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

struct CachedMonth {
    fetched_at: Instant,
    holidays: Vec<HolidayInfo>,
}

/// Caches another oracle's answers per `(year, month)`.
///
/// Failed lookups are not cached.
pub struct CachingHolidayOracle<O> {
    inner: O,
    ttl: Duration,
    cache: RwLock<HashMap<(i32, u32), CachedMonth>>,
}

impl<O: HolidayOracle> CachingHolidayOracle<O> {
    pub fn new(inner: O) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: O, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Drops every cached month.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    fn cached(&self, key: (i32, u32)) -> Option<Vec<HolidayInfo>> {
        let cache = self.cache.read();
        cache
            .get(&key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.holidays.clone())
    }
}

#[async_trait]
impl<O: HolidayOracle> HolidayOracle for CachingHolidayOracle<O> {
    async fn get_holidays(&self, year: i32, month: u32) -> Result<Vec<HolidayInfo>> {
        if let Some(holidays) = self.cached((year, month)) {
            return Ok(holidays);
        }

        let holidays = self.inner.get_holidays(year, month).await?;
        tracing::debug!(year, month, count = holidays.len(), "Cached holidays");

        self.cache.write().insert(
            (year, month),
            CachedMonth {
                fetched_at: Instant::now(),
                holidays: holidays.clone(),
            },
        );
        Ok(holidays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Counts calls and optionally fails.
    struct CountingOracle {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingOracle {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl HolidayOracle for CountingOracle {
        async fn get_holidays(&self, year: i32, month: u32) -> Result<Vec<HolidayInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::UpstreamUnavailable("calendar down".into()));
            }
            Ok(vec![HolidayInfo::new(date(year, month, 1), HolidayType::Public)])
        }
    }

    // ==================== Holiday Matching Tests ====================

    #[test]
    fn public_holiday_on_date() {
        let holidays = vec![
            HolidayInfo::new(date(2024, 12, 24), HolidayType::Other),
            HolidayInfo::new(date(2024, 12, 25), HolidayType::Public).with_name("Christmas"),
        ];

        assert!(is_public_holiday(&holidays, date(2024, 12, 25)));
        assert!(!is_public_holiday(&holidays, date(2024, 12, 26)));
    }

    #[test]
    fn non_public_holiday_does_not_count() {
        let holidays = vec![HolidayInfo::new(date(2024, 12, 24), HolidayType::Other)];
        assert!(!is_public_holiday(&holidays, date(2024, 12, 24)));
    }

    #[test]
    fn holiday_type_deserialization() {
        let json = r#"[
            {"date": "2024-12-25", "type": "PUBLIC", "name": "Christmas"},
            {"date": "2024-12-26", "type": "public"},
            {"date": "2024-12-31", "type": "observance"}
        ]"#;
        let holidays: Vec<HolidayInfo> = serde_json::from_str(json).unwrap();

        assert_eq!(holidays[0].kind, HolidayType::Public);
        assert_eq!(holidays[0].name.as_deref(), Some("Christmas"));
        assert_eq!(holidays[1].kind, HolidayType::Public);
        assert_eq!(holidays[2].kind, HolidayType::Other);
    }

    // ==================== Cache Tests ====================

    #[test]
    fn cache_serves_repeated_months() {
        let cache = CachingHolidayOracle::new(CountingOracle::new(false));

        tokio_test::block_on(async {
            cache.get_holidays(2024, 12).await.unwrap();
            cache.get_holidays(2024, 12).await.unwrap();
            cache.get_holidays(2025, 1).await.unwrap();
        });

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_expires_after_ttl() {
        let cache = CachingHolidayOracle::with_ttl(CountingOracle::new(false), Duration::ZERO);

        tokio_test::block_on(async {
            cache.get_holidays(2024, 12).await.unwrap();
            cache.get_holidays(2024, 12).await.unwrap();
        });

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_does_not_store_errors() {
        let cache = CachingHolidayOracle::new(CountingOracle::new(true));

        tokio_test::block_on(async {
            assert!(cache.get_holidays(2024, 12).await.is_err());
            assert!(cache.get_holidays(2024, 12).await.is_err());
        });

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_forces_refetch() {
        let cache = CachingHolidayOracle::new(CountingOracle::new(false));

        tokio_test::block_on(async {
            cache.get_holidays(2024, 12).await.unwrap();
            cache.clear();
            cache.get_holidays(2024, 12).await.unwrap();
        });

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_holidays_is_empty() {
        let holidays = tokio_test::block_on(NoHolidays.get_holidays(2024, 12)).unwrap();
        assert!(holidays.is_empty());
    }
}
