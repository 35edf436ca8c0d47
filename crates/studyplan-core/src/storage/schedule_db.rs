//! SQLite-based storage for study entities, committed revision slots,
//! the completion ledger and capacity settings.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::data_dir;
use super::migrations;
use crate::calendar::{date_key, parse_date_key};
use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::schedule::{DeadlineStatus, DeadlineTask, Exam, ExamType, Project, ProjectStatus, RecurringTask, Topic};
use crate::scheduler::{CapacityConfig, PlanInputs};
use crate::stats::CompletionLedger;
use crate::sync::{PlanStore, RevisionSlotRow};

const CAPACITY_KEY: &str = "capacity";

// === Helper Functions ===

fn conversion_error(idx: usize, err: ValidationError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date_key(&raw).map_err(|e| conversion_error(idx, e))
}

fn opt_date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_date_key(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn label_column<T: FromStr<Err = ValidationError>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn topics_column(row: &Row, idx: usize) -> rusqlite::Result<Vec<Topic>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_recurring(row: &Row) -> rusqlite::Result<RecurringTask> {
    Ok(RecurringTask {
        id: row.get(0)?,
        name: row.get(1)?,
        weekday: row.get(2)?,
        duration_minutes: row.get(3)?,
        subject: row.get(4)?,
        color: row.get(5)?,
    })
}

fn row_to_deadline(row: &Row) -> rusqlite::Result<DeadlineTask> {
    Ok(DeadlineTask {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
        due_date: date_column(row, 3)?,
        estimated_minutes: row.get(4)?,
        completed_minutes: row.get(5)?,
        status: label_column(row, 6)?,
        scheduled_date: opt_date_column(row, 7)?,
        is_fixed: row.get::<_, i32>(8)? != 0,
        completed_on: opt_date_column(row, 9)?,
    })
}

fn row_to_exam(row: &Row) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: row.get(0)?,
        subject: row.get(1)?,
        exam_type: label_column::<ExamType>(row, 2)?,
        board: row.get(3)?,
        competitive_name: row.get(4)?,
        date: date_column(row, 5)?,
        color: row.get(6)?,
        preparedness: row.get(7)?,
        topics: topics_column(row, 8)?,
    })
}

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
        due_date: date_column(row, 3)?,
        estimated_minutes: row.get(4)?,
        completed_minutes: row.get(5)?,
        status: label_column(row, 6)?,
    })
}

fn row_to_slot(row: &Row) -> rusqlite::Result<RevisionSlotRow> {
    Ok(RevisionSlotRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        exam_id: row.get(2)?,
        date: date_column(row, 3)?,
        duration_minutes: row.get(4)?,
        label: row.get(5)?,
        completed: row.get::<_, i32>(6)? != 0,
        subject: row.get(7)?,
    })
}

const DEADLINE_COLUMNS: &str = "id, name, subject, due_date, estimated_minutes, completed_minutes,
     status, scheduled_date, is_fixed, completed_on";
const EXAM_COLUMNS: &str = "id, subject, exam_type, board, competitive_name, date, color, preparedness, topics";
const PROJECT_COLUMNS: &str = "id, name, subject, due_date, estimated_minutes, completed_minutes, status";
const SLOT_COLUMNS: &str = "id, user_id, exam_id, date, duration_minutes, label, completed, subject";

/// SQLite database for planner storage.
pub struct ScheduleDb {
    conn: Connection,
}

impl ScheduleDb {
    /// Open the database at `<data dir>/studyplan.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studyplan.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        // v1 tables; later columns are added by `migrations`
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS recurring_tasks (
                    id                TEXT PRIMARY KEY,
                    name              TEXT NOT NULL,
                    weekday           INTEGER NOT NULL,
                    duration_minutes  INTEGER NOT NULL,
                    subject           TEXT,
                    color             TEXT
                );

                CREATE TABLE IF NOT EXISTS deadline_tasks (
                    id                 TEXT PRIMARY KEY,
                    name               TEXT NOT NULL,
                    subject            TEXT,
                    due_date           TEXT NOT NULL,
                    estimated_minutes  INTEGER NOT NULL,
                    completed_minutes  INTEGER NOT NULL DEFAULT 0,
                    status             TEXT NOT NULL DEFAULT 'active',
                    scheduled_date     TEXT,
                    is_fixed           INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS exams (
                    id                TEXT PRIMARY KEY,
                    subject           TEXT,
                    exam_type         TEXT NOT NULL,
                    board             TEXT,
                    competitive_name  TEXT,
                    date              TEXT NOT NULL,
                    color             TEXT,
                    preparedness      INTEGER,
                    topics            TEXT NOT NULL DEFAULT '[]'
                );

                CREATE TABLE IF NOT EXISTS projects (
                    id                 TEXT PRIMARY KEY,
                    name               TEXT NOT NULL,
                    subject            TEXT,
                    due_date           TEXT NOT NULL,
                    estimated_minutes  INTEGER NOT NULL,
                    completed_minutes  INTEGER NOT NULL DEFAULT 0,
                    status             TEXT NOT NULL DEFAULT 'active'
                );

                CREATE TABLE IF NOT EXISTS revision_slots (
                    id                TEXT PRIMARY KEY,
                    user_id           TEXT NOT NULL,
                    exam_id           TEXT NOT NULL,
                    date              TEXT NOT NULL,
                    duration_minutes  INTEGER NOT NULL,
                    label             TEXT NOT NULL,
                    completed         INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS completions (
                    date      TEXT NOT NULL,
                    item_key  TEXT NOT NULL,
                    PRIMARY KEY (date, item_key)
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key    TEXT PRIMARY KEY,
                    value  TEXT NOT NULL
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Run `f` inside `BEGIN IMMEDIATE` ... `COMMIT`, rolling back on error.
    fn transactional<T>(&self, f: impl FnOnce() -> rusqlite::Result<T>) -> rusqlite::Result<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    // === Recurring tasks ===

    pub fn upsert_recurring(&self, task: &RecurringTask) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO recurring_tasks (id, name, weekday, duration_minutes, subject, color)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![task.id, task.name, task.weekday, task.duration_minutes, task.subject, task.color],
        )?;
        Ok(())
    }

    pub fn list_recurring(&self) -> Result<Vec<RecurringTask>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, weekday, duration_minutes, subject, color
             FROM recurring_tasks ORDER BY weekday, name",
        )?;
        let rows = stmt.query_map([], row_to_recurring)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns `false` if no task had that id.
    pub fn delete_recurring(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM recurring_tasks WHERE id = ?1", params![id])? > 0)
    }

    // === Deadline tasks ===

    pub fn upsert_deadline(&self, task: &DeadlineTask) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO deadline_tasks (
                id, name, subject, due_date, estimated_minutes, completed_minutes,
                status, scheduled_date, is_fixed, completed_on
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.id,
                task.name,
                task.subject,
                date_key(task.due_date),
                task.estimated_minutes,
                task.completed_minutes,
                task.status.as_str(),
                task.scheduled_date.map(date_key),
                task.is_fixed,
                task.completed_on.map(date_key),
            ],
        )?;
        Ok(())
    }

    pub fn get_deadline(&self, id: &str) -> Result<Option<DeadlineTask>, DatabaseError> {
        let sql = format!("SELECT {DEADLINE_COLUMNS} FROM deadline_tasks WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_deadline)
            .optional()?)
    }

    pub fn list_deadlines(&self) -> Result<Vec<DeadlineTask>, DatabaseError> {
        let sql = format!("SELECT {DEADLINE_COLUMNS} FROM deadline_tasks ORDER BY due_date, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_deadline)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete_deadline(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM deadline_tasks WHERE id = ?1", params![id])? > 0)
    }

    /// Mark a homework task completed on `on`.
    pub fn complete_deadline(&self, id: &str, on: NaiveDate) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE deadline_tasks SET status = ?2, completed_on = ?3 WHERE id = ?1",
            params![id, DeadlineStatus::Completed.as_str(), date_key(on)],
        )?;
        Ok(changed > 0)
    }

    /// Add logged minutes to a homework task.
    pub fn log_deadline_minutes(&self, id: &str, minutes: u32) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE deadline_tasks SET completed_minutes = completed_minutes + ?2 WHERE id = ?1",
            params![id, minutes],
        )?;
        Ok(changed > 0)
    }

    // === Exams ===

    pub fn upsert_exam(&self, exam: &Exam) -> Result<(), CoreError> {
        let topics = serde_json::to_string(&exam.topics)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO exams (
                    id, subject, exam_type, board, competitive_name, date, color, preparedness, topics
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    exam.id,
                    exam.subject,
                    exam.exam_type.as_str(),
                    exam.board,
                    exam.competitive_name,
                    date_key(exam.date),
                    exam.color,
                    exam.preparedness,
                    topics,
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    pub fn list_exams(&self) -> Result<Vec<Exam>, DatabaseError> {
        let sql = format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY date, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_exam)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Deletes the exam and its open revision slots.
    pub fn delete_exam(&self, id: &str) -> Result<bool, DatabaseError> {
        let deleted = self.transactional(|| {
            self.conn.execute(
                "DELETE FROM revision_slots WHERE exam_id = ?1 AND completed = 0",
                params![id],
            )?;
            self.conn.execute("DELETE FROM exams WHERE id = ?1", params![id])
        })?;
        Ok(deleted > 0)
    }

    pub fn set_preparedness(&self, id: &str, preparedness: u8) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE exams SET preparedness = ?2 WHERE id = ?1",
            params![id, preparedness.min(100)],
        )?;
        Ok(changed > 0)
    }

    // === Projects ===

    pub fn upsert_project(&self, project: &Project) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO projects (
                id, name, subject, due_date, estimated_minutes, completed_minutes, status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.name,
                project.subject,
                date_key(project.due_date),
                project.estimated_minutes,
                project.completed_minutes,
                project.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY due_date, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_project)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete_project(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM projects WHERE id = ?1", params![id])? > 0)
    }

    pub fn set_project_status(&self, id: &str, status: ProjectStatus) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(changed > 0)
    }

    pub fn log_project_minutes(&self, id: &str, minutes: u32) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects SET completed_minutes = completed_minutes + ?2 WHERE id = ?1",
            params![id, minutes],
        )?;
        Ok(changed > 0)
    }

    // === Revision slots ===

    pub fn list_slots(&self, user_id: &str) -> Result<Vec<RevisionSlotRow>, DatabaseError> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM revision_slots WHERE user_id = ?1 ORDER BY date, exam_id, label");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], row_to_slot)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn complete_slot(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("UPDATE revision_slots SET completed = 1 WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Delete-then-insert in one transaction.
    pub fn replace_open_slots(
        &self,
        user_id: &str,
        from: NaiveDate,
        rows: &[RevisionSlotRow],
    ) -> Result<usize, DatabaseError> {
        let from_key = date_key(from);
        let removed = self.transactional(|| {
            let removed = self.conn.execute(
                "DELETE FROM revision_slots WHERE user_id = ?1 AND date >= ?2 AND completed = 0",
                params![user_id, from_key],
            )?;
            let mut stmt = self.conn.prepare(
                "INSERT INTO revision_slots (id, user_id, exam_id, date, duration_minutes, label, completed, subject)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.user_id,
                    row.exam_id,
                    date_key(row.date),
                    row.duration_minutes,
                    row.label,
                    row.completed,
                    row.subject,
                ])?;
            }
            Ok(removed)
        })?;
        Ok(removed)
    }

    // === Completion ledger ===

    pub fn mark_done(&self, date: NaiveDate, item_key: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO completions (date, item_key) VALUES (?1, ?2)",
            params![date_key(date), item_key],
        )?;
        Ok(())
    }

    pub fn unmark_done(&self, date: NaiveDate, item_key: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "DELETE FROM completions WHERE date = ?1 AND item_key = ?2",
            params![date_key(date), item_key],
        )?;
        Ok(changed > 0)
    }

    /// Ledger entries dated `from` through `to`, inclusive.
    pub fn load_ledger(&self, from: NaiveDate, to: NaiveDate) -> Result<CompletionLedger, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, item_key FROM completions WHERE date >= ?1 AND date <= ?2 ORDER BY date, item_key",
        )?;
        let rows = stmt.query_map(params![date_key(from), date_key(to)], |row| {
            Ok((date_column(row, 0)?, row.get::<_, String>(1)?))
        })?;
        let mut ledger = CompletionLedger::default();
        for entry in rows {
            let (date, key) = entry?;
            ledger.mark(date, key);
        }
        Ok(ledger)
    }

    // === Key-value store ===

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Stored capacity settings, or the defaults if none were saved.
    pub fn load_capacity(&self) -> Result<CapacityConfig, CoreError> {
        match self.kv_get(CAPACITY_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                CoreError::from(DatabaseError::CorruptRow {
                    table: "kv".into(),
                    message: format!("{CAPACITY_KEY}: {e}"),
                })
            }),
            None => Ok(CapacityConfig::default()),
        }
    }

    pub fn save_capacity(&self, capacity: &CapacityConfig) -> Result<(), CoreError> {
        capacity.validate()?;
        let json = serde_json::to_string(capacity)?;
        self.kv_set(CAPACITY_KEY, &json)?;
        Ok(())
    }

    /// Everything the planner needs, read in one go.
    pub fn load_inputs(&self) -> Result<PlanInputs, CoreError> {
        Ok(PlanInputs {
            recurring: self.list_recurring()?,
            deadlines: self.list_deadlines()?,
            exams: self.list_exams()?,
            projects: self.list_projects()?,
            capacity: self.load_capacity()?,
        })
    }
}

impl PlanStore for ScheduleDb {
    fn has_slots_on(&self, user_id: &str, date: NaiveDate) -> crate::error::Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM revision_slots WHERE user_id = ?1 AND date = ?2",
                params![user_id, date_key(date)],
                |row| row.get(0),
            )
            .map_err(DatabaseError::from)?;
        Ok(count > 0)
    }

    fn replace_open_slots_from(
        &mut self,
        user_id: &str,
        from: NaiveDate,
        rows: &[RevisionSlotRow],
    ) -> crate::error::Result<usize> {
        Ok(self.replace_open_slots(user_id, from, rows)?)
    }

    fn set_scheduled_date(&mut self, task_id: &str, date: Option<NaiveDate>) -> crate::error::Result<()> {
        self.conn
            .execute(
                "UPDATE deadline_tasks SET scheduled_date = ?2 WHERE id = ?1",
                params![task_id, date.map(date_key)],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}
