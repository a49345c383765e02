mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::{Connection, Row};

use crate::error::{Error, Result};
use crate::models::*;

/// The task store: a single SQLite connection behind a mutex.
///
/// Commands execute one at a time; each acquires the lock exactly once, does
/// all of its reads and writes under that acquisition (multi-statement
/// commands inside one transaction) and releases on every exit path. The
/// full-text index is mirrored by triggers, so any statement that touches a
/// task row updates its index entry in the same atomic step.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "tameboard")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("tameboard.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn create_task(&self, input: TaskInput) -> Result<Task> {
        validate_task_input(&input)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO tasks (title, due_date, sp, description, status, sprint)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                &input.title,
                input.due_date.map(|d| d.to_string()),
                input.estimate,
                &input.description,
                input.status.as_str(),
                input.in_sprint,
            ),
        )?;
        let id = conn.last_insert_rowid();

        Ok(Task {
            id,
            title: input.title,
            due_date: input.due_date,
            estimate: input.estimate,
            description: input.description,
            status: input.status,
            in_sprint: input.in_sprint,
        })
    }

    /// Overwrite every mutable field of an existing task.
    pub fn update_task(&self, id: i64, input: TaskInput) -> Result<Task> {
        validate_task_input(&input)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE tasks
             SET title = ?, due_date = ?, sp = ?, description = ?, status = ?, sprint = ?
             WHERE id = ?",
            (
                &input.title,
                input.due_date.map(|d| d.to_string()),
                input.estimate,
                &input.description,
                input.status.as_str(),
                input.in_sprint,
                id,
            ),
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id));
        }

        Ok(Task {
            id,
            title: input.title,
            due_date: input.due_date,
            estimate: input.estimate,
            description: input.description,
            status: input.status,
            in_sprint: input.in_sprint,
        })
    }

    /// Idempotent: deleting a task that does not exist is a successful no-op.
    pub fn delete_task(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute("DELETE FROM tasks WHERE id = ?", [id])?;
        Ok(())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        read_task(&conn, id)
    }

    /// List tasks ordered by due date ascending with undated tasks last,
    /// then by id.
    pub fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut sql = String::from(
            "SELECT id, title, due_date, sp, description, status, sprint FROM tasks",
        );
        let mut clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(in_sprint) = filter.in_sprint {
            clauses.push("sprint = ?");
            params.push(Box::new(in_sprint));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY due_date ASC NULLS LAST, id");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let tasks = stmt
            .query_map(params_ref.as_slice(), |row| raw_task_from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(finish_task)
            .collect();
        tasks
    }

    /// Move a task to a new status. Moving to the status it already has is a
    /// true no-op: nothing is written and the index is untouched.
    pub fn change_status(&self, id: i64, status: Status) -> Result<Task> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let task = read_task(&conn, id)?.ok_or(Error::NotFound(id))?;
        if task.status == status {
            return Ok(task);
        }

        conn.execute(
            "UPDATE tasks SET status = ? WHERE id = ?",
            (status.as_str(), id),
        )?;

        Ok(Task { status, ..task })
    }

    /// Flip a task between sprint and backlog.
    pub fn toggle_sprint(&self, id: i64) -> Result<Task> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let task = read_task(&conn, id)?.ok_or(Error::NotFound(id))?;
        let in_sprint = !task.in_sprint;

        conn.execute("UPDATE tasks SET sprint = ? WHERE id = ?", (in_sprint, id))?;

        Ok(Task { in_sprint, ..task })
    }

    // ============================================================
    // Settings operations
    // ============================================================

    pub fn get_setting(&self, name: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        Ok(read_setting(&conn, name)?)
    }

    pub fn set_setting(&self, name: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO settings (name, value) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            (name, value),
        )?;
        Ok(())
    }

    // ============================================================
    // Sprint operations
    // ============================================================

    /// The open sprint window, if any. Both dates are present or the sprint
    /// is closed; a half-set or unreadable window is an error, never a
    /// silent "closed".
    pub fn sprint_window(&self) -> Result<Option<SprintWindow>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        read_sprint_window(&conn)
    }

    /// Open a new sprint. Rejected while one is already open. The existence
    /// check and the writes share one transaction under one lock
    /// acquisition, so two concurrent starts cannot both pass the check.
    pub fn start_sprint(&self, input: StartSprintInput) -> Result<SprintWindow> {
        if input.end_date <= input.start_date {
            return Err(Error::Validation(
                "sprint end date must be after the start date".to_string(),
            ));
        }

        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        if read_sprint_window(&tx)?.is_some() {
            return Err(Error::Conflict("a sprint is already open".to_string()));
        }
        for (name, value) in [
            ("sprint_start", input.start_date.to_string()),
            ("sprint_end", input.end_date.to_string()),
        ] {
            tx.execute(
                "INSERT INTO settings (name, value) VALUES (?, ?)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                (name, value),
            )?;
        }
        tx.commit()?;

        Ok(SprintWindow {
            start: input.start_date,
            end: input.end_date,
        })
    }

    /// Close the open sprint. Completed tasks are swept out of the sprint;
    /// everything not Done carries over to the next one.
    pub fn close_sprint(&self) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        if read_sprint_window(&tx)?.is_none() {
            return Err(Error::Conflict("no sprint is open".to_string()));
        }
        tx.execute(
            "UPDATE tasks SET sprint = 0 WHERE sprint = 1 AND status = ?",
            [Status::Done.as_str()],
        )?;
        tx.execute(
            "DELETE FROM settings WHERE name = 'sprint_start' OR name = 'sprint_end'",
            [],
        )?;
        tx.commit()?;

        Ok(())
    }

    /// Estimate totals per status over the tasks currently in the sprint.
    pub fn workload_summary(&self) -> Result<WorkloadSummary> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT status, SUM(sp) FROM tasks WHERE sprint = 1 GROUP BY status",
        )?;

        let mut summary = WorkloadSummary::default();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let status: String = row.get(0)?;
            let total: f64 = row.get(1)?;
            let status = Status::from_str(&status)
                .ok_or_else(|| Error::Corrupt(format!("unknown stored status {:?}", status)))?;
            match status {
                Status::ToDo => summary.to_do += total,
                Status::InProgress => summary.in_progress += total,
                Status::Blocked => summary.blocked += total,
                Status::Done => summary.done += total,
            }
        }
        summary.remaining = summary.to_do + summary.in_progress + summary.blocked;

        Ok(summary)
    }

    // ============================================================
    // Search
    // ============================================================

    /// Ranked full-text lookup over title and description.
    ///
    /// Each whitespace-separated token is an exact phrase and all of them
    /// must match. Results come back best match first, with title hits
    /// weighted above description hits. A blank query returns no results
    /// rather than an error.
    pub fn search_tasks(&self, query: &str) -> Result<Vec<Task>> {
        let phrases: Vec<String> = query
            .split_whitespace()
            .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
            .collect();
        if phrases.is_empty() {
            return Ok(Vec::new());
        }
        let match_expr = phrases.join(" ");

        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT tasks.id, tasks.title, tasks.due_date, tasks.sp,
                    tasks.description, tasks.status, tasks.sprint
             FROM tasks JOIN tasks_fts ON tasks.id = tasks_fts.id
             WHERE tasks_fts MATCH ?
             ORDER BY bm25(tasks_fts, 0.0, 5.0, 1.0)",
        )?;

        let tasks = stmt
            .query_map([match_expr], |row| raw_task_from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(finish_task)
            .collect();
        tasks
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn validate_task_input(input: &TaskInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(Error::Validation("task title must not be empty".to_string()));
    }
    if input.estimate < 0.0 {
        return Err(Error::Validation(
            "estimated duration must not be negative".to_string(),
        ));
    }
    Ok(())
}

// Raw column values, converted outside the rusqlite callback so the closure
// stays a plain rusqlite::Result.
type RawTask = (i64, String, Option<String>, f64, String, String, i32);

fn raw_task_from_row(row: &Row<'_>) -> rusqlite::Result<RawTask> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn finish_task(raw: RawTask) -> Result<Task> {
    let (id, title, due_date, estimate, description, status, sprint) = raw;
    let status = Status::from_str(&status)
        .ok_or_else(|| Error::Corrupt(format!("task {} has unknown status {:?}", id, status)))?;
    let due_date = due_date
        .map(|s| {
            s.parse().map_err(|e| {
                Error::Corrupt(format!("task {} has an invalid due date {:?}: {}", id, s, e))
            })
        })
        .transpose()?;

    Ok(Task {
        id,
        title,
        due_date,
        estimate,
        description,
        status,
        in_sprint: sprint != 0,
    })
}

fn read_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, due_date, sp, description, status, sprint
         FROM tasks WHERE id = ?",
    )?;

    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(finish_task(raw_task_from_row(row)?)?))
    } else {
        Ok(None)
    }
}

fn read_setting(conn: &Connection, name: &str) -> rusqlite::Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE name = ?")?;
    let mut rows = stmt.query([name])?;
    if let Some(row) = rows.next()? {
        row.get(0)
    } else {
        Ok(None)
    }
}

fn parse_stored_date(name: &str, value: &str) -> Result<NaiveDate> {
    value.parse().map_err(|e| {
        Error::Corrupt(format!("setting {} is not a date ({:?}): {}", name, value, e))
    })
}

fn read_sprint_window(conn: &Connection) -> Result<Option<SprintWindow>> {
    let start = read_setting(conn, "sprint_start")?
        .map(|s| parse_stored_date("sprint_start", &s))
        .transpose()?;
    let end = read_setting(conn, "sprint_end")?
        .map(|s| parse_stored_date("sprint_end", &s))
        .transpose()?;

    Ok(start.zip(end).map(|(start, end)| SprintWindow { start, end }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn raw_execute(db: &Database, sql: &str) {
        db.conn
            .lock()
            .unwrap()
            .execute(sql, [])
            .expect("raw statement failed");
    }

    fn task_input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            due_date: None,
            estimate: 1.0,
            description: String::new(),
            status: Status::ToDo,
            in_sprint: true,
        }
    }

    #[test]
    fn unknown_stored_status_is_an_error_not_a_default() {
        let db = setup();
        let created = db.create_task(task_input("Task")).unwrap();
        raw_execute(&db, "UPDATE tasks SET status = 'archived'");

        assert!(matches!(db.get_task(created.id), Err(Error::Corrupt(_))));
        assert!(matches!(db.workload_summary(), Err(Error::Corrupt(_))));
    }

    #[test]
    fn invalid_stored_due_date_is_an_error() {
        let db = setup();
        let created = db.create_task(task_input("Task")).unwrap();
        raw_execute(&db, "UPDATE tasks SET due_date = 'next tuesday'");

        assert!(matches!(db.get_task(created.id), Err(Error::Corrupt(_))));
    }

    #[test]
    fn unreadable_sprint_dates_are_an_error_not_a_closed_window() {
        let db = setup();
        db.set_setting("sprint_start", "not-a-date").unwrap();
        db.set_setting("sprint_end", "2024-01-14").unwrap();

        assert!(matches!(db.sprint_window(), Err(Error::Corrupt(_))));

        // A corrupt window must not be silently overwritten by a new sprint
        let err = db
            .start_sprint(StartSprintInput {
                start_date: "2024-02-01".parse().unwrap(),
                end_date: "2024-02-14".parse().unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
        assert_eq!(
            db.get_setting("sprint_start").unwrap().as_deref(),
            Some("not-a-date")
        );
    }
}
