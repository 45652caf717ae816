//! High-level database interface.

use std::path::PathBuf;

use chrono::NaiveDate;
use directories::ProjectDirs;
use officehours_core::{CalendarDate, OfficeHour, Weekday};
use tracing::info;

use crate::error::{Result, StorageError};
use crate::pool::ConnectionPool;
use crate::repository::OfficeHoursRepo;

/// High-level database interface for the office hours service.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new database in the default app data directory.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_db_path()?)
    }

    /// Create a new database at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory()?;
        Ok(Self { pool })
    }

    /// Get the default database path.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "office-hours", "office-hours")
            .ok_or_else(|| StorageError::Config("Could not determine app data directory".into()))?;

        Ok(proj_dirs.data_dir().join("office-hours.db"))
    }

    // === Office hours ===

    /// Insert or replace an office hour. Returns it with its id set.
    pub fn upsert_office_hour(&self, rule: &OfficeHour) -> Result<OfficeHour> {
        let conn = self.pool.get()?;
        OfficeHoursRepo::upsert(&conn, rule)
    }

    /// Get an office hour by ID.
    pub fn get_office_hour(&self, id: &str) -> Result<Option<OfficeHour>> {
        let conn = self.pool.get()?;
        OfficeHoursRepo::get_by_id(&conn, id)
    }

    /// Get all office hours.
    pub fn get_all_office_hours(&self) -> Result<Vec<OfficeHour>> {
        let conn = self.pool.get()?;
        OfficeHoursRepo::get_all(&conn)
    }

    /// Get office hours selecting `date`, recurring or pinned to its year.
    pub fn get_office_hours_for_date(&self, date: NaiveDate) -> Result<Vec<OfficeHour>> {
        let conn = self.pool.get()?;
        let keys = CalendarDate::lookup_keys(date);
        OfficeHoursRepo::find_by_date_keys(&conn, &keys)
    }

    /// Get office hours for a weekday.
    pub fn get_office_hours_for_weekday(&self, weekday: Weekday) -> Result<Vec<OfficeHour>> {
        let conn = self.pool.get()?;
        OfficeHoursRepo::find_by_weekday(&conn, weekday)
    }

    /// Delete an office hour.
    pub fn delete_office_hour(&self, id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        OfficeHoursRepo::delete(&conn, id)
    }

    /// Count office hours.
    pub fn count_office_hours(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        OfficeHoursRepo::count(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use officehours_core::{DayTimeRange, Selector};

    fn rule(selector: Selector) -> OfficeHour {
        OfficeHour::new(selector, vec![DayTimeRange::from_hours(9, 17)]).unwrap()
    }

    #[test]
    fn test_office_hours_crud() {
        let db = Database::in_memory().unwrap();

        // Create
        let saved = db
            .upsert_office_hour(&rule(Selector::Weekday(Weekday::Monday)))
            .unwrap();
        let id = saved.id().unwrap().to_string();

        // Read
        let loaded = db.get_office_hour(&id).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(db.count_office_hours().unwrap(), 1);

        // Update
        let updated = rule(Selector::Weekday(Weekday::Tuesday)).with_id(id.clone());
        db.upsert_office_hour(&updated).unwrap();
        assert_eq!(db.get_office_hour(&id).unwrap().unwrap(), updated);
        assert_eq!(db.count_office_hours().unwrap(), 1);

        // Delete
        db.delete_office_hour(&id).unwrap();
        assert!(db.get_office_hour(&id).unwrap().is_none());
        assert!(db.get_all_office_hours().unwrap().is_empty());
    }

    #[test]
    fn test_office_hours_for_date() {
        let db = Database::in_memory().unwrap();
        let xmas = db
            .upsert_office_hour(&rule(Selector::CalendarDate(CalendarDate::recurring(12, 25))))
            .unwrap();
        db.upsert_office_hour(&rule(Selector::CalendarDate(CalendarDate::pinned(2023, 12, 25))))
            .unwrap();
        db.upsert_office_hour(&rule(Selector::Weekday(Weekday::Wednesday)))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(db.get_office_hours_for_date(date).unwrap(), vec![xmas]);
        assert_eq!(
            db.get_office_hours_for_weekday(Weekday::Wednesday)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_with_path_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("office-hours.db");

        let db = Database::with_path(&path).unwrap();
        db.upsert_office_hour(&rule(Selector::Weekday(Weekday::Friday)))
            .unwrap();

        assert!(path.exists());
        let reopened = Database::with_path(&path).unwrap();
        assert_eq!(reopened.count_office_hours().unwrap(), 1);
    }
}
