//! Domain models for TameBoard.
//!
//! - [`Task`]: a card on the board, moving through the fixed status pipeline
//!   To Do → In Progress → Blocked → Done and flagged as sprint or backlog.
//! - [`SprintWindow`] / [`WorkloadSummary`]: the single time-boxed sprint and
//!   its estimate accounting.
//! - [`TaskView`]: a task plus its derived deadline urgency, recomputed on
//!   every read.

mod sprint;
mod task;

pub use sprint::*;
pub use task::*;
