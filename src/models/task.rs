use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::TaskType;

/// A derived calendar entry. Regenerated on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTask {
    /// Composite id: source prefix, source id, date and optional time.
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// `HH:MM`, absent for all-day entries.
    pub time: Option<String>,
    /// Owning recurring definition, for medication and activity entries.
    pub original_id: Option<String>,
}

/// A calendar entry on today's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayTask {
    #[serde(flatten)]
    pub task: CalendarTask,
    pub subtitle: String,
    pub completed: bool,
}
