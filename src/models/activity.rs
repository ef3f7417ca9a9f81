use serde::{Deserialize, Serialize};

use super::enums::{deserialize_clearable, deserialize_frequency, FrequencyType};

/// A user-defined activity (exercise, physio, a reminder to call the pharmacy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Anchor / first day.
    pub date: String,
    /// `HH:MM`; ignored when `all_day` is set.
    pub time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, deserialize_with = "deserialize_frequency")]
    pub frequency_type: Option<FrequencyType>,
    #[serde(default)]
    pub selected_days: Vec<u8>,
    pub end_date: Option<String>,
}

impl CustomEvent {
    pub fn is_recurring(&self) -> bool {
        self.frequency_type != Some(FrequencyType::Once)
    }

    /// Time of day used for generation, `None` for all-day activities.
    pub fn timed_at(&self) -> Option<&str> {
        if self.all_day {
            None
        } else {
            self.time.as_deref().filter(|t| !t.trim().is_empty())
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityInput {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, deserialize_with = "deserialize_frequency")]
    pub frequency_type: Option<FrequencyType>,
    #[serde(default)]
    pub selected_days: Vec<u8>,
    pub end_date: Option<String>,
}

impl ActivityInput {
    pub fn into_event(self, id: String) -> CustomEvent {
        CustomEvent {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            all_day: self.all_day,
            frequency_type: self.frequency_type,
            selected_days: self.selected_days,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub all_day: Option<bool>,
    pub frequency_type: Option<FrequencyType>,
    pub selected_days: Option<Vec<u8>>,
    /// `null` clears the end date and resumes the series.
    #[serde(
        default,
        deserialize_with = "deserialize_clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<String>>,
}

impl ActivityPatch {
    pub fn apply(self, event: &mut CustomEvent) {
        if let Some(v) = self.title {
            event.title = v;
        }
        if let Some(v) = self.description {
            event.description = Some(v);
        }
        if let Some(v) = self.date {
            event.date = v;
        }
        if let Some(v) = self.time {
            event.time = Some(v);
        }
        if let Some(v) = self.all_day {
            event.all_day = v;
        }
        if let Some(v) = self.frequency_type {
            event.frequency_type = Some(v);
        }
        if let Some(v) = self.selected_days {
            event.selected_days = v;
        }
        if let Some(v) = self.end_date {
            event.end_date = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk() -> CustomEvent {
        ActivityInput {
            title: "Walk".into(),
            date: "2026-03-02".into(),
            time: Some("07:30".into()),
            frequency_type: Some(FrequencyType::Daily),
            ..Default::default()
        }
        .into_event("e1".into())
    }

    #[test]
    fn all_day_hides_time() {
        let mut event = walk();
        assert_eq!(event.timed_at(), Some("07:30"));
        event.all_day = true;
        assert_eq!(event.timed_at(), None);
    }

    #[test]
    fn blank_time_is_timeless() {
        let mut event = walk();
        event.time = Some("  ".into());
        assert_eq!(event.timed_at(), None);
    }

    #[test]
    fn patch_switches_to_weekly() {
        let mut event = walk();
        ActivityPatch {
            frequency_type: Some(FrequencyType::Weekly),
            selected_days: Some(vec![2, 4]),
            ..Default::default()
        }
        .apply(&mut event);
        assert_eq!(event.frequency_type, Some(FrequencyType::Weekly));
        assert_eq!(event.selected_days, vec![2, 4]);
        assert!(event.is_recurring());
    }

    #[test]
    fn patch_can_set_and_clear_end_date() {
        let mut event = walk();
        let set: ActivityPatch = serde_json::from_str(r#"{"end_date":"2026-04-01"}"#).unwrap();
        set.apply(&mut event);
        assert_eq!(event.end_date.as_deref(), Some("2026-04-01"));

        ActivityPatch {
            end_date: Some(None),
            ..Default::default()
        }
        .apply(&mut event);
        assert_eq!(event.end_date, None);
    }
}
