//! Database schema migrations.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Schema version after all migrations have run.
pub const CURRENT_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// Expects the v1 tables to exist already; `ScheduleDb` creates them before
/// calling this.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        set_schema_version(conn, 1)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a database that has never been migrated.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0)) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> SqliteResult<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Migration v2: record the day a homework task was finished.
///
/// Completed tasks occupy that day's capacity retroactively. Existing
/// completed rows have no known day and stay NULL.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    if !has_column(&tx, "deadline_tasks", "completed_on")? {
        tx.execute_batch("ALTER TABLE deadline_tasks ADD COLUMN completed_on TEXT;")?;
    }

    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: subject column and lookup index on revision slots.
///
/// The subject is backfilled from the exam row when it still exists.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    if !has_column(&tx, "revision_slots", "subject")? {
        tx.execute_batch("ALTER TABLE revision_slots ADD COLUMN subject TEXT NOT NULL DEFAULT '';")?;
    }
    tx.execute(
        "UPDATE revision_slots
         SET subject = COALESCE(
             (SELECT COALESCE(e.subject, e.competitive_name, 'Exam') FROM exams e WHERE e.id = revision_slots.exam_id),
             'Exam')
         WHERE subject = ''",
        [],
    )?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_revision_slots_user_date
         ON revision_slots (user_id, date);",
    )?;

    set_schema_version(&tx, 3)?;
    tx.commit()
}
