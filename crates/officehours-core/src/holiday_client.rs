//! HTTP client for the external holiday calendar service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::holiday::{HolidayInfo, HolidayOracle};

/// Request timeout for calendar lookups.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepted response bodies: a bare array or `{"holidays": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HolidaysPayload {
    List(Vec<HolidayInfo>),
    Wrapped { holidays: Vec<HolidayInfo> },
}

impl HolidaysPayload {
    fn into_holidays(self) -> Vec<HolidayInfo> {
        match self {
            HolidaysPayload::List(holidays) => holidays,
            HolidaysPayload::Wrapped { holidays } => holidays,
        }
    }
}

/// Holiday oracle backed by `GET {base}/api/holidays?year=Y&month=M`.
#[derive(Debug, Clone)]
pub struct HttpHolidayOracle {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHolidayOracle {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("office-hours/{}", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(upstream)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn holidays_url(&self, year: i32, month: u32) -> String {
        format!("{}/api/holidays?year={}&month={}", self.base_url, year, month)
    }
}

#[async_trait]
impl HolidayOracle for HttpHolidayOracle {
    async fn get_holidays(&self, year: i32, month: u32) -> Result<Vec<HolidayInfo>> {
        let url = self.holidays_url(year, month);
        tracing::debug!(%url, "Fetching holidays");

        let payload: HolidaysPayload = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(payload.into_holidays())
    }
}

fn upstream(e: reqwest::Error) -> Error {
    Error::UpstreamUnavailable(format!("holiday service: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holiday::HolidayType;

    #[test]
    fn builds_month_url() {
        let oracle = HttpHolidayOracle::new("http://calendar.local:8080/").unwrap();
        assert_eq!(oracle.base_url(), "http://calendar.local:8080");
        assert_eq!(
            oracle.holidays_url(2024, 12),
            "http://calendar.local:8080/api/holidays?year=2024&month=12"
        );
    }

    #[test]
    fn parses_bare_array() {
        let json = r#"[{"date": "2024-12-25", "type": "public"}]"#;
        let payload: HolidaysPayload = serde_json::from_str(json).unwrap();
        let holidays = payload.into_holidays();

        assert_eq!(holidays.len(), 1);
        assert_eq!(holidays[0].kind, HolidayType::Public);
    }

    #[test]
    fn parses_wrapped_object() {
        let json = r#"{"holidays": [
            {"date": "2024-12-25", "type": "PUBLIC", "name": "Christmas"},
            {"date": "2024-12-24", "type": "bank"}
        ]}"#;
        let payload: HolidaysPayload = serde_json::from_str(json).unwrap();
        let holidays = payload.into_holidays();

        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[1].kind, HolidayType::Other);
    }
}
