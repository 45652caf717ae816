//! Open-state change notification.

use chrono::{DateTime, Utc};
use officehours_core::OfficeHour;
use serde::{Deserialize, Serialize};

/// Published once per detected open/closed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChangeEvent {
    pub is_open: bool,
    /// The rule that made the business open, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_hour: Option<OfficeHour>,
    pub changed_at: DateTime<Utc>,
}

impl OpenChangeEvent {
    pub fn new(is_open: bool, office_hour: Option<OfficeHour>, changed_at: DateTime<Utc>) -> Self {
        Self {
            is_open,
            office_hour,
            changed_at,
        }
    }
}
