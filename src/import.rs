//! Offline bulk loader for task dumps exported from an external tracker.
//!
//! The dump is a JSON array of records; each one is fed through the same
//! `create_task` operation a user command would take, landing in the backlog.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::Database;
use crate::models::{Status, TaskInput};

#[derive(Debug, Deserialize)]
struct ImportRecord {
    title: String,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    estimate: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    /// Accepts wire values ("to_do") or human labels ("To Do").
    #[serde(default)]
    status: Option<String>,
}

/// Load every record from `path` into the store. Returns the number of tasks
/// created.
pub fn import_file(db: &Database, path: &Path) -> Result<usize> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<ImportRecord> =
        serde_json::from_str(&data).context("Import file is not a JSON array of tasks")?;

    let mut imported = 0;
    for record in records {
        let status = match record.status.as_deref() {
            Some(label) => Status::from_label(label)
                .ok_or_else(|| anyhow::anyhow!("Unknown status label: {}", label))?,
            None => Status::default(),
        };

        db.create_task(TaskInput {
            title: record.title,
            due_date: record.due_date,
            estimate: record.estimate.unwrap_or(1.0),
            description: record.description.unwrap_or_default(),
            status,
            in_sprint: false,
        })?;
        imported += 1;
    }

    tracing::info!("Imported {} tasks from {}", imported, path.display());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskFilter;
    use std::io::Write;

    #[test]
    fn imports_records_into_the_backlog() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"title": "Ship release", "due_date": "2024-04-01", "estimate": 3.0, "status": "In Progress"}},
                {{"title": "Write docs", "description": "user guide"}}
            ]"#
        )
        .unwrap();

        let imported = import_file(&db, file.path()).unwrap();
        assert_eq!(imported, 2);

        let tasks = db.list_tasks(TaskFilter::default()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| !t.in_sprint));
        assert_eq!(tasks[0].title, "Ship release");
        assert_eq!(tasks[0].status, Status::InProgress);
        assert_eq!(tasks[1].estimate, 1.0);
    }

    #[test]
    fn rejects_unknown_status_labels() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"title": "Task", "status": "Someday"}}]"#).unwrap();

        assert!(import_file(&db, file.path()).is_err());
    }
}
