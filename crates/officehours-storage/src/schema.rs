//! Database schema and migrations.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

type Migration = fn(&Connection) -> Result<()>;

/// Migrations by the version they produce, oldest first.
const MIGRATIONS: &[(i32, Migration)] = &[(1, migrate_v1)];

/// Brings the schema up to [`SCHEMA_VERSION`]. Pending steps run in one
/// transaction, so a failed step leaves the previous version intact.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(from = current, to = SCHEMA_VERSION, "Migrating office hours database");

    let tx = conn.unchecked_transaction()?;
    for (version, migrate) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        info!(version, "Applying migration");
        migrate(&tx)?;
    }
    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION])?;
    tx.commit()?;

    Ok(())
}

/// Stored schema version, 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;

    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

/// v1: the office_hours table.
///
/// Exactly one of `day_of_week` / `date` is set. `date` holds `MM-DD` for
/// recurring dates and `YYYY-MM-DD` for pinned ones. Store order is rowid.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS office_hours (
            id TEXT PRIMARY KEY,
            day_of_week TEXT,
            date TEXT,
            holiday_condition TEXT NOT NULL DEFAULT 'unspecified',
            time_ranges TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((day_of_week IS NULL) <> (date IS NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_office_hours_day_of_week ON office_hours (day_of_week);
        CREATE INDEX IF NOT EXISTS idx_office_hours_date ON office_hours (date);",
    )?;
    Ok(())
}
