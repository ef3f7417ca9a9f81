//! Occurrence generation: expands recurring medications and activities
//! into dated (optionally timed) occurrences inside a rolling window.
//!
//! Generation is pure: the same definition and the same `today` always
//! produce the same occurrence ids, so completion tracking and reminder
//! dedup keyed on those ids stay stable across regenerations.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::dates;
use crate::models::enums::{FrequencyType, TaskType};
use crate::models::{CalendarTask, CustomEvent, Medication};

// ═══════════════════════════════════════════
// Window
// ═══════════════════════════════════════════

/// Half-open range of calendar days `[first_day, first_day + days)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationWindow {
    pub first_day: NaiveDate,
    pub days: u32,
}

impl GenerationWindow {
    /// Window positioned around `today` using the configured offsets.
    /// Saturates at the earliest representable date.
    pub fn around(today: NaiveDate, config: &EngineConfig) -> Self {
        let first_day = today
            .checked_sub_signed(Duration::days(i64::from(config.past_days)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            first_day,
            days: config.window_days,
        }
    }

    /// `[today - 5d, today + 55d)`.
    pub fn standard(today: NaiveDate) -> Self {
        Self::around(today, &EngineConfig::default())
    }

    /// First day after the window.
    pub fn end(&self) -> NaiveDate {
        self.first_day
            .checked_add_signed(Duration::days(i64::from(self.days)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date < self.end()
    }
}

// ═══════════════════════════════════════════
// Occurrence
// ═══════════════════════════════════════════

/// Which kind of definition an occurrence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceKind {
    Medication,
    Activity,
}

impl SourceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Medication => "med",
            Self::Activity => "act",
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Medication => TaskType::Medication,
            Self::Activity => TaskType::Activity,
        }
    }
}

/// One concrete instance of a recurring definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Composite id, see [`occurrence_id`].
    pub id: String,
    pub kind: SourceKind,
    pub source_id: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub title: String,
    /// Dosage for medications, description for activities.
    pub detail: Option<String>,
}

impl Occurrence {
    /// Local wall-clock time, `None` for timeless occurrences.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.time.map(|t| self.date.and_time(t))
    }

    pub fn to_calendar_task(&self) -> CalendarTask {
        CalendarTask {
            id: self.id.clone(),
            date: self.date,
            title: self.title.clone(),
            task_type: self.kind.task_type(),
            time: self.time.map(dates::time_key),
            original_id: Some(self.source_id.clone()),
        }
    }
}

/// Deterministic id: `<prefix>-<source id>-<YYYY-MM-DD>[-<HH:MM>]`.
pub fn occurrence_id(
    kind: SourceKind,
    source_id: &str,
    date: NaiveDate,
    time: Option<NaiveTime>,
) -> String {
    match time {
        Some(t) => format!(
            "{}-{}-{}-{}",
            kind.prefix(),
            source_id,
            dates::date_key(date),
            dates::time_key(t)
        ),
        None => format!("{}-{}-{}", kind.prefix(), source_id, dates::date_key(date)),
    }
}

// ═══════════════════════════════════════════
// Recurrence
// ═══════════════════════════════════════════

/// Recurrence rule extracted from a medication or activity.
#[derive(Debug, Clone)]
pub struct Recurrence<'a> {
    pub kind: SourceKind,
    pub source_id: &'a str,
    pub title: &'a str,
    pub detail: Option<&'a str>,
    pub frequency: Option<FrequencyType>,
    /// Inclusive lower bound; `None` means unbounded.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound; `None` means open-ended.
    pub end: Option<NaiveDate>,
    /// Day a `once` definition fires, and the weekday reference for weekly
    /// rules without selected days.
    pub anchor: NaiveDate,
    pub selected_days: &'a [u8],
    /// Empty means one timeless occurrence per included day.
    pub times: Vec<NaiveTime>,
}

impl<'a> Recurrence<'a> {
    /// Rule for a medication. Inactive medications yield `None`.
    pub fn from_medication(med: &'a Medication, now: NaiveDateTime) -> Option<Self> {
        if !med.active {
            return None;
        }
        let start = med
            .start_date
            .as_deref()
            .map(|raw| dates::local_date_or_today(raw, now));
        let end = med
            .end_date
            .as_deref()
            .map(|raw| dates::local_date_or_today(raw, now));
        Some(Self {
            kind: SourceKind::Medication,
            source_id: &med.id,
            title: &med.name,
            detail: Some(med.dosage.as_str()).filter(|d| !d.is_empty()),
            frequency: med.frequency_type,
            start,
            end,
            anchor: start.unwrap_or_else(|| now.date()),
            selected_days: &med.selected_days,
            times: parse_times(med.times.iter().map(String::as_str), &med.id),
        })
    }

    /// Rule for a custom activity.
    pub fn from_activity(event: &'a CustomEvent, now: NaiveDateTime) -> Self {
        let start = dates::local_date_or_today(&event.date, now);
        let end = event
            .end_date
            .as_deref()
            .map(|raw| dates::local_date_or_today(raw, now));
        Self {
            kind: SourceKind::Activity,
            source_id: &event.id,
            title: &event.title,
            detail: event.description.as_deref().filter(|d| !d.is_empty()),
            frequency: event.frequency_type,
            start: Some(start),
            end,
            anchor: start,
            selected_days: &event.selected_days,
            times: parse_times(event.timed_at(), &event.id),
        }
    }

    /// Lazy occurrence sequence. `once` rules ignore the window and emit
    /// on the anchor day only.
    pub fn occurrences(&self, window: GenerationWindow) -> Occurrences<'_> {
        let (first_day, days) = match self.frequency {
            Some(FrequencyType::Once) => (self.anchor, 1),
            _ => (window.first_day, window.days),
        };
        Occurrences {
            recurrence: self,
            next_day: Some(first_day),
            remaining_days: days,
            current_day: None,
            slot: 0,
        }
    }

    /// Whether `day` carries occurrences under this rule.
    pub fn includes(&self, day: NaiveDate) -> bool {
        if self.frequency == Some(FrequencyType::Once) {
            return day == self.anchor;
        }
        if self.start.is_some_and(|start| day < start) {
            return false;
        }
        if self.end.is_some_and(|end| day > end) {
            return false;
        }
        match self.frequency {
            Some(FrequencyType::Weekly) => {
                let weekday = day.weekday().num_days_from_sunday();
                if self.selected_days.is_empty() {
                    weekday == self.anchor.weekday().num_days_from_sunday()
                } else {
                    self.selected_days.iter().any(|d| u32::from(*d) == weekday)
                }
            }
            _ => true,
        }
    }

    fn occurrence(&self, date: NaiveDate, time: Option<NaiveTime>) -> Occurrence {
        Occurrence {
            id: occurrence_id(self.kind, self.source_id, date, time),
            kind: self.kind,
            source_id: self.source_id.to_string(),
            date,
            time,
            title: self.title.to_string(),
            detail: self.detail.map(str::to_string),
        }
    }
}

fn parse_times<'s>(raw: impl IntoIterator<Item = &'s str>, source_id: &str) -> Vec<NaiveTime> {
    let mut times: Vec<NaiveTime> = Vec::new();
    for entry in raw {
        match dates::parse_time_of_day(entry) {
            Some(t) if !times.contains(&t) => times.push(t),
            Some(_) => {}
            None => tracing::warn!(source_id, time = entry, "Ignoring unparsable time of day"),
        }
    }
    times
}

// ═══════════════════════════════════════════
// Iterator
// ═══════════════════════════════════════════

/// Occurrences of one rule, day by day, one per time slot.
///
/// Cloning restarts from the clone point; the sequence is finite.
#[derive(Debug, Clone)]
pub struct Occurrences<'r> {
    recurrence: &'r Recurrence<'r>,
    next_day: Option<NaiveDate>,
    remaining_days: u32,
    current_day: Option<NaiveDate>,
    slot: usize,
}

impl Iterator for Occurrences<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            if let Some(day) = self.current_day {
                let times = &self.recurrence.times;
                if times.is_empty() && self.slot == 0 {
                    self.slot = 1;
                    return Some(self.recurrence.occurrence(day, None));
                }
                if let Some(time) = times.get(self.slot).copied() {
                    self.slot += 1;
                    return Some(self.recurrence.occurrence(day, Some(time)));
                }
                self.current_day = None;
            }

            if self.remaining_days == 0 {
                return None;
            }
            let day = self.next_day?;
            self.remaining_days -= 1;
            self.next_day = day.succ_opt();
            if self.recurrence.includes(day) {
                self.current_day = Some(day);
                self.slot = 0;
            }
        }
    }
}

// ═══════════════════════════════════════════
// Collection helpers
// ═══════════════════════════════════════════

/// All occurrences of all active medications in the window.
pub fn medication_occurrences(
    meds: &[Medication],
    window: GenerationWindow,
    now: NaiveDateTime,
) -> Vec<Occurrence> {
    meds.iter()
        .filter_map(|m| Recurrence::from_medication(m, now))
        .flat_map(|rule| rule.occurrences(window).collect::<Vec<_>>())
        .collect()
}

/// All occurrences of all activities in the window.
pub fn activity_occurrences(
    events: &[CustomEvent],
    window: GenerationWindow,
    now: NaiveDateTime,
) -> Vec<Occurrence> {
    events
        .iter()
        .map(|e| Recurrence::from_activity(e, now))
        .flat_map(|rule| rule.occurrences(window).collect::<Vec<_>>())
        .collect()
}
