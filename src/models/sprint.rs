use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The currently open sprint window.
///
/// At most one sprint is open at a time. Both dates are set when a sprint is
/// started and cleared together when it is closed; a half-set window never
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Input for opening a new sprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSprintInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Estimate totals over the tasks currently in the sprint, grouped by status.
///
/// Done tasks are part of the raw per-status totals but excluded from
/// `remaining`, which is the figure the UI surfaces as outstanding work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub to_do: f64,
    pub in_progress: f64,
    pub blocked: f64,
    pub done: f64,
    pub remaining: f64,
}

/// Sprint state as the UI consumes it: the window (if open) plus workload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintStatus {
    pub window: Option<SprintWindow>,
    pub workload: WorkloadSummary,
}
