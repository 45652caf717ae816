//! Office Hours Storage - SQLite rule store.
//!
//! Persists office-hour rules in a single `office_hours` table and implements
//! [`officehours_core::RuleStore`] on top of it.
//!
//! # Example
//!
//! ```no_run
//! use officehours_core::{DayTimeRange, OfficeHour, Selector, Weekday};
//! use officehours_storage::Database;
//!
//! let db = Database::in_memory().unwrap();
//!
//! let rule = OfficeHour::new(
//!     Selector::Weekday(Weekday::Monday),
//!     vec![DayTimeRange::from_hours(9, 17)],
//! )
//! .unwrap();
//!
//! let saved = db.upsert_office_hour(&rule).unwrap();
//! assert!(saved.id().is_some());
//! ```

mod database;
pub mod error;
mod pool;
pub mod repository;
mod schema;
mod store;

pub use database::Database;
pub use error::{Result, StorageError};
pub use pool::ConnectionPool;
pub use repository::{generate_id, OfficeHoursRepo};
