use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::lifecycle::Urgency;

/// A card on the board.
///
/// Tasks are permanent records: they are created and deleted only by explicit
/// user commands, and every other mutation goes through a dedicated command
/// (edit, status change, sprint toggle). A task is either part of the current
/// sprint (`in_sprint = true`) or sits in the backlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Allocated by the store on creation; monotonically increasing, never reused.
    pub id: i64,
    pub title: String,
    /// Calendar date with no time component. `None` means "no deadline".
    pub due_date: Option<NaiveDate>,
    /// Estimated duration in hours.
    pub estimate: f64,
    pub description: String,
    pub status: Status,
    pub in_sprint: bool,
}

/// Position of a task in the status pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    ToDo,
    InProgress,
    Blocked,
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::InProgress,
        Status::Blocked,
        Status::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "to_do",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "to_do" => Some(Self::ToDo),
            "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Parse either the wire value or the human label external trackers export.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::from_str(s).or(match s {
            "To Do" => Some(Self::ToDo),
            "In Progress" => Some(Self::InProgress),
            "Blocked" => Some(Self::Blocked),
            "Done" => Some(Self::Done),
            _ => None,
        })
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ToDo
    }
}

fn default_estimate() -> f64 {
    1.0
}

/// Input for creating or fully updating a task.
///
/// Updates are whole-record overwrites: the edit form always submits every
/// field, so there are no partial-update semantics to reason about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Estimated duration in hours. Defaults to 1.
    #[serde(default = "default_estimate")]
    pub estimate: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub in_sprint: bool,
}

/// Input for a status transition command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusInput {
    pub status: Status,
}

/// A task decorated with its deadline urgency, as list views render it.
///
/// Urgency is derived from (due date, status, today) on every read and is
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub urgency: Urgency,
}

impl TaskView {
    pub fn new(task: Task, today: NaiveDate) -> Self {
        let urgency = crate::lifecycle::classify(task.due_date, task.status, today);
        Self { task, urgency }
    }
}

/// Filters for listing tasks. `None` means "don't filter on this field".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TaskFilter {
    /// Matches the `sprint` query parameter of the list endpoint.
    #[serde(rename = "sprint")]
    pub in_sprint: Option<bool>,
    pub status: Option<Status>,
}
