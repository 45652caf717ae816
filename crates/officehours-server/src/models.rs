//! API request and response models.

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use officehours_core::OfficeHour;
use serde::{Deserialize, Serialize};

/// Response body for GET /api/office-hours.
#[derive(Debug, Serialize)]
pub struct OfficeHoursResponse {
    pub office_hours: Vec<OfficeHour>,
}

/// Query parameters for GET /api/office-hours/ranges.
#[derive(Debug, Deserialize)]
pub struct RangesQuery {
    /// Day to resolve (default: today).
    pub date: Option<NaiveDate>,
}

/// An absolute open interval.
#[derive(Debug, Serialize)]
pub struct OpenRange {
    pub from: DateTime<Local>,
    pub to: DateTime<Local>,
}

/// Response body for GET /api/office-hours/ranges.
#[derive(Debug, Serialize)]
pub struct RangesResponse {
    /// Rule governing the day, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_hour: Option<OfficeHour>,
    pub open_ranges: Vec<OpenRange>,
}

/// Query parameters for GET /api/open.
#[derive(Debug, Deserialize)]
pub struct OpenQuery {
    /// RFC 3339 instant (default: now).
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// Response body for GET /api/open.
#[derive(Debug, Serialize)]
pub struct OpenResponse {
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_hour: Option<OfficeHour>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
