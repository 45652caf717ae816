//! Database repositories for each table.

pub mod office_hours;

pub use office_hours::{generate_id, OfficeHoursRepo};
