//! Office hours repository.

use chrono::Utc;
use officehours_core::{
    CalendarDate, HolidayCondition, OfficeHour, OfficeHourRecord, Weekday,
};
use rand::Rng;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::warn;

use crate::error::{Result, StorageError};

const COLUMNS: &str = "id, day_of_week, date, holiday_condition, time_ranges";

/// Generates a new rule id: 8 hex digits of the unix timestamp followed by
/// 16 random hex digits.
pub fn generate_id() -> String {
    let secs = Utc::now().timestamp() as u32;
    let tail: u64 = rand::thread_rng().gen();
    format!("{:08x}{:016x}", secs, tail)
}

/// A raw `office_hours` row.
struct OfficeHourRow {
    id: String,
    day_of_week: Option<String>,
    date: Option<String>,
    holiday_condition: String,
    time_ranges: String,
}

impl OfficeHourRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            day_of_week: row.get(1)?,
            date: row.get(2)?,
            holiday_condition: row.get(3)?,
            time_ranges: row.get(4)?,
        })
    }

    fn into_office_hour(self) -> Result<OfficeHour> {
        let corrupt = |reason: String| StorageError::Corrupt {
            id: self.id.clone(),
            reason,
        };

        let day_of_week = match &self.day_of_week {
            Some(s) => Some(
                Weekday::parse(s).ok_or_else(|| corrupt(format!("unknown weekday '{}'", s)))?,
            ),
            None => None,
        };
        let date = match &self.date {
            Some(s) => Some(
                CalendarDate::parse_storage_key(s)
                    .ok_or_else(|| corrupt(format!("unknown date '{}'", s)))?,
            ),
            None => None,
        };
        let holiday_condition = HolidayCondition::parse(&self.holiday_condition).ok_or_else(|| {
            corrupt(format!(
                "unknown holiday condition '{}'",
                self.holiday_condition
            ))
        })?;
        let time_ranges = serde_json::from_str(&self.time_ranges)?;

        let record = OfficeHourRecord {
            id: Some(self.id.clone()),
            day_of_week,
            date,
            holiday_condition,
            time_ranges,
        };

        OfficeHour::try_from(record).map_err(|e| corrupt(e.to_string()))
    }
}

/// Repository for office hour operations.
pub struct OfficeHoursRepo;

impl OfficeHoursRepo {
    /// Insert or fully replace a rule, generating an id when it has none.
    ///
    /// Replacing keeps the row (and so its store position and `created_at`).
    pub fn upsert(conn: &Connection, rule: &OfficeHour) -> Result<OfficeHour> {
        let id = rule.id().map(str::to_string).unwrap_or_else(generate_id);
        let record = OfficeHourRecord::from(rule.clone());

        let day_of_week = record.day_of_week.map(|wd| wd.as_str());
        let date = record.date.map(|d| d.storage_key());
        let time_ranges = serde_json::to_string(&record.time_ranges)?;

        conn.execute(
            "INSERT INTO office_hours (id, day_of_week, date, holiday_condition, time_ranges)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                day_of_week = excluded.day_of_week,
                date = excluded.date,
                holiday_condition = excluded.holiday_condition,
                time_ranges = excluded.time_ranges,
                updated_at = datetime('now')",
            params![
                id,
                day_of_week,
                date,
                record.holiday_condition.as_str(),
                time_ranges
            ],
        )?;

        Ok(rule.clone().with_id(id))
    }

    /// Get a rule by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<OfficeHour>> {
        let row = conn
            .query_row(
                &format!("SELECT {} FROM office_hours WHERE id = ?1", COLUMNS),
                [id],
                OfficeHourRow::from_row,
            )
            .optional()?;

        row.map(OfficeHourRow::into_office_hour).transpose()
    }

    /// Get all rules in store order.
    pub fn get_all(conn: &Connection) -> Result<Vec<OfficeHour>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM office_hours ORDER BY rowid",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map([], OfficeHourRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Self::decode_all(rows))
    }

    /// Get rules whose stored date equals any of `keys`, in store order.
    pub fn find_by_date_keys(conn: &Connection, keys: &[String]) -> Result<Vec<OfficeHour>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM office_hours WHERE date IN ({}) ORDER BY rowid",
            COLUMNS, placeholders
        ))?;
        let rows = stmt
            .query_map(params_from_iter(keys.iter()), OfficeHourRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Self::decode_all(rows))
    }

    /// Get rules for a weekday, in store order.
    pub fn find_by_weekday(conn: &Connection, weekday: Weekday) -> Result<Vec<OfficeHour>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM office_hours WHERE day_of_week = ?1 ORDER BY rowid",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map([weekday.as_str()], OfficeHourRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Self::decode_all(rows))
    }

    /// Delete a rule.
    pub fn delete(conn: &Connection, id: &str) -> Result<()> {
        let deleted = conn.execute("DELETE FROM office_hours WHERE id = ?1", [id])?;

        if deleted == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }

        Ok(())
    }

    /// Count total rules.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM office_hours", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Decodes rows, skipping (and logging) any that no longer validate.
    fn decode_all(rows: Vec<OfficeHourRow>) -> Vec<OfficeHour> {
        rows.into_iter()
            .filter_map(|row| match row.into_office_hour() {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!("Skipping stored office hour: {}", e);
                    None
                }
            })
            .collect()
    }
}
