//! Completion tracking for generated occurrences.
//!
//! Recurring medications and activities record completion per instance,
//! keyed by composite occurrence id, so checking off Monday's dose leaves
//! Tuesday's untouched. Appointments and labs keep completion in their own
//! `status` field; `appointment_id_from_task` maps a task id back to it.

use std::collections::BTreeSet;

use crate::models::CompletionRecord;

/// Outcome of a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    Added,
    Removed,
    Unchanged,
}

/// Set of completed occurrence ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    ids: BTreeSet<String>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[CompletionRecord]) -> Self {
        Self {
            ids: records.iter().map(|r| r.id.clone()).collect(),
        }
    }

    pub fn is_completed(&self, occurrence_id: &str) -> bool {
        self.ids.contains(occurrence_id)
    }

    /// Mark or unmark an occurrence. Repeating the same state is a no-op.
    pub fn set(&mut self, occurrence_id: &str, completed: bool) -> CompletionChange {
        if completed {
            if self.ids.insert(occurrence_id.to_string()) {
                CompletionChange::Added
            } else {
                CompletionChange::Unchanged
            }
        } else if self.ids.remove(occurrence_id) {
            CompletionChange::Removed
        } else {
            CompletionChange::Unchanged
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Strip the `apt-` / `lab-` prefix from a calendar task id.
///
/// Ids without a known prefix are returned unchanged so callers may
/// pass raw appointment ids too.
pub fn appointment_id_from_task(task_id: &str) -> &str {
    task_id
        .strip_prefix("apt-")
        .or_else(|| task_id.strip_prefix("lab-"))
        .unwrap_or(task_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_complete_twice_is_idempotent() {
        let mut set = CompletionSet::new();
        assert_eq!(set.set("med-m1-2026-03-12-08:00", true), CompletionChange::Added);
        assert_eq!(
            set.set("med-m1-2026-03-12-08:00", true),
            CompletionChange::Unchanged
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn instances_are_isolated() {
        let mut set = CompletionSet::new();
        set.set("med-m1-2026-03-12", true);
        assert!(set.is_completed("med-m1-2026-03-12"));
        assert!(!set.is_completed("med-m1-2026-03-13"));
    }

    #[test]
    fn uncomplete_removes() {
        let mut set = CompletionSet::from_records(&[CompletionRecord {
            id: "act-e1-2026-03-12".into(),
            completed_at: "2026-03-12T09:00:00Z".into(),
        }]);
        assert_eq!(set.set("act-e1-2026-03-12", false), CompletionChange::Removed);
        assert_eq!(set.set("act-e1-2026-03-12", false), CompletionChange::Unchanged);
        assert!(set.is_empty());
    }

    #[test]
    fn strips_appointment_prefixes() {
        assert_eq!(appointment_id_from_task("apt-1234"), "1234");
        assert_eq!(appointment_id_from_task("lab-abcd"), "abcd");
        assert_eq!(appointment_id_from_task("raw-id"), "raw-id");
    }
}
