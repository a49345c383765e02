//! Pure derivation rules for task state.
//!
//! Nothing here touches storage: urgency is a function of
//! (due date, status, today) and is recomputed on every read.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Status;

/// How close a task is to its deadline, relative to its status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Done, or no deadline. Rendered neutral.
    None,
    /// Due today or earlier.
    Overdue,
    /// Due within the next two days.
    DueSoon,
    OnTrack,
}

/// Classify a task's deadline urgency as of `today`.
pub fn classify(due_date: Option<NaiveDate>, status: Status, today: NaiveDate) -> Urgency {
    let Some(due) = due_date else {
        return Urgency::None;
    };
    if status == Status::Done {
        return Urgency::None;
    }
    if due <= today {
        Urgency::Overdue
    } else if due <= today + Days::new(2) {
        Urgency::DueSoon
    } else {
        Urgency::OnTrack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn no_due_date_is_neutral() {
        assert_eq!(
            classify(None, Status::InProgress, date("2024-03-10")),
            Urgency::None
        );
    }

    #[test]
    fn done_is_neutral_even_when_overdue() {
        assert_eq!(
            classify(Some(date("2024-03-01")), Status::Done, date("2024-03-10")),
            Urgency::None
        );
    }

    #[test]
    fn due_today_is_overdue() {
        assert_eq!(
            classify(Some(date("2024-03-10")), Status::ToDo, date("2024-03-10")),
            Urgency::Overdue
        );
    }

    #[test]
    fn due_in_the_past_is_overdue() {
        assert_eq!(
            classify(Some(date("2024-03-02")), Status::Blocked, date("2024-03-10")),
            Urgency::Overdue
        );
    }

    #[test]
    fn due_within_two_days_is_due_soon() {
        assert_eq!(
            classify(Some(date("2024-03-11")), Status::ToDo, date("2024-03-10")),
            Urgency::DueSoon
        );
        assert_eq!(
            classify(Some(date("2024-03-12")), Status::ToDo, date("2024-03-10")),
            Urgency::DueSoon
        );
    }

    #[test]
    fn due_beyond_two_days_is_on_track() {
        assert_eq!(
            classify(Some(date("2024-03-13")), Status::ToDo, date("2024-03-10")),
            Urgency::OnTrack
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let due = Some(date("2024-03-11"));
        let today = date("2024-03-10");
        assert_eq!(
            classify(due, Status::InProgress, today),
            classify(due, Status::InProgress, today)
        );
    }
}
