//! Trigger rules: which reminders are due at a given instant.
//!
//! Every rule is an offset before the scheduled time plus a tolerance,
//! so a scan that runs a little early or late still catches it.

use chrono::{Duration, NaiveDateTime};

use crate::dates;
use crate::models::enums::AppointmentKind;
use crate::models::Appointment;
use crate::occurrence::{Occurrence, SourceKind};

/// A reminder offset relative to a scheduled time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerRule {
    MedicationDue,
    ActivitySoon,
    ActivityDue,
    AppointmentDayBefore,
    AppointmentHourBefore,
    AppointmentDue,
}

pub const MEDICATION_RULES: &[TriggerRule] = &[TriggerRule::MedicationDue];

pub const ACTIVITY_RULES: &[TriggerRule] = &[TriggerRule::ActivitySoon, TriggerRule::ActivityDue];

pub const APPOINTMENT_RULES: &[TriggerRule] = &[
    TriggerRule::AppointmentDayBefore,
    TriggerRule::AppointmentHourBefore,
    TriggerRule::AppointmentDue,
];

impl TriggerRule {
    /// How long before the scheduled time the rule fires.
    pub fn lead(&self) -> Duration {
        match self {
            Self::MedicationDue | Self::ActivityDue | Self::AppointmentDue => Duration::zero(),
            Self::ActivitySoon => Duration::minutes(30),
            Self::AppointmentDayBefore => Duration::hours(24),
            Self::AppointmentHourBefore => Duration::hours(1),
        }
    }

    /// Accepted distance from the exact firing instant, either side.
    pub fn tolerance(&self) -> Duration {
        match self {
            Self::AppointmentDayBefore => Duration::minutes(6),
            _ => Duration::seconds(60),
        }
    }

    /// Whether a scheduled time `until` away from now falls in this rule.
    pub fn matches(&self, until: Duration) -> bool {
        (until - self.lead()).abs() <= self.tolerance()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::MedicationDue => "med-due",
            Self::ActivitySoon => "act-30m",
            Self::ActivityDue => "act-due",
            Self::AppointmentDayBefore => "apt-24h",
            Self::AppointmentHourBefore => "apt-1h",
            Self::AppointmentDue => "apt-due",
        }
    }
}

/// A reminder that should fire now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Occurrence id, or the `apt-`/`lab-` task id for appointments.
    pub occurrence_id: String,
    pub rule: TriggerRule,
    pub scheduled_at: NaiveDateTime,
    pub title: String,
    pub message: String,
}

impl Reminder {
    /// Ledger key: occurrence, rule, and the scheduled day/hour/minute.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.occurrence_id,
            self.rule.tag(),
            self.scheduled_at.format("%Y-%m-%d-%H-%M")
        )
    }
}

/// Evaluate every rule against `now`.
pub fn due_reminders(
    now: NaiveDateTime,
    medication_occurrences: &[Occurrence],
    activity_occurrences: &[Occurrence],
    appointments: &[Appointment],
) -> Vec<Reminder> {
    let mut due = Vec::new();

    for occ in medication_occurrences.iter().chain(activity_occurrences) {
        let Some(at) = occ.scheduled_at() else {
            continue;
        };
        let rules = match occ.kind {
            SourceKind::Medication => MEDICATION_RULES,
            SourceKind::Activity => ACTIVITY_RULES,
        };
        for rule in rules.iter().filter(|r| r.matches(at - now)) {
            let (title, message) = occurrence_text(*rule, occ);
            due.push(Reminder {
                occurrence_id: occ.id.clone(),
                rule: *rule,
                scheduled_at: at,
                title,
                message,
            });
        }
    }

    for apt in appointments.iter().filter(|a| !a.is_closed()) {
        let Some(at) = apt.scheduled_at() else {
            continue;
        };
        for rule in APPOINTMENT_RULES.iter().filter(|r| r.matches(at - now)) {
            let (title, message) = appointment_text(*rule, apt, at);
            due.push(Reminder {
                occurrence_id: apt.task_id(),
                rule: *rule,
                scheduled_at: at,
                title,
                message,
            });
        }
    }

    due
}

fn occurrence_text(rule: TriggerRule, occ: &Occurrence) -> (String, String) {
    match rule {
        TriggerRule::MedicationDue => {
            let message = match occ.detail.as_deref() {
                Some(dose) => format!("Time to take {} ({dose})", occ.title),
                None => format!("Time to take {}", occ.title),
            };
            ("Medication Reminder".to_string(), message)
        }
        TriggerRule::ActivitySoon => (
            "Upcoming Activity".to_string(),
            format!("{} starts in 30 minutes", occ.title),
        ),
        _ => (
            "Activity Reminder".to_string(),
            format!("{} is starting now", occ.title),
        ),
    }
}

fn appointment_text(rule: TriggerRule, apt: &Appointment, at: NaiveDateTime) -> (String, String) {
    let noun = match apt.kind {
        AppointmentKind::Appointment => "Appointment",
        AppointmentKind::Lab => "Lab Work",
    };
    let name = apt.display_name();
    let time = dates::time_key(at.time());
    match rule {
        TriggerRule::AppointmentDayBefore => (
            format!("{noun} Tomorrow"),
            format!("{name} tomorrow at {time}"),
        ),
        TriggerRule::AppointmentHourBefore => (
            format!("{noun} in 1 Hour"),
            format!("{name} at {time}"),
        ),
        _ => (format!("{noun} Now"), format!("{name} is scheduled now")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AppointmentStatus, FrequencyType};
    use crate::models::{ActivityInput, AppointmentInput, MedicationInput};
    use crate::occurrence::{activity_occurrences, medication_occurrences, GenerationWindow};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 12)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn med_occ(now: NaiveDateTime) -> Vec<Occurrence> {
        let med = MedicationInput {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency_type: Some(FrequencyType::Daily),
            times: vec!["08:00".into()],
            start_date: Some("2026-03-12".into()),
            ..Default::default()
        }
        .into_medication("m1".into());
        medication_occurrences(&[med], GenerationWindow::standard(now.date()), now)
    }

    fn act_occ(now: NaiveDateTime, all_day: bool) -> Vec<Occurrence> {
        let event = ActivityInput {
            title: "Yoga".into(),
            date: "2026-03-12".into(),
            time: Some("18:00".into()),
            all_day,
            frequency_type: Some(FrequencyType::Daily),
            ..Default::default()
        }
        .into_event("e1".into());
        activity_occurrences(&[event], GenerationWindow::standard(now.date()), now)
    }

    fn visit(date: &str, status: Option<AppointmentStatus>) -> Appointment {
        AppointmentInput {
            date: Some(date.into()),
            doctor_name: Some("Dr. Patel".into()),
            status,
            ..Default::default()
        }
        .into_appointment("a1".into(), AppointmentKind::Appointment)
    }

    #[test]
    fn rule_windows() {
        assert!(TriggerRule::MedicationDue.matches(Duration::seconds(-60)));
        assert!(TriggerRule::MedicationDue.matches(Duration::seconds(60)));
        assert!(!TriggerRule::MedicationDue.matches(Duration::seconds(61)));
        assert!(TriggerRule::ActivitySoon.matches(Duration::minutes(29)));
        assert!(TriggerRule::ActivitySoon.matches(Duration::minutes(31)));
        assert!(!TriggerRule::ActivitySoon.matches(Duration::minutes(32)));
        assert!(TriggerRule::AppointmentDayBefore.matches(Duration::hours(24) + Duration::minutes(6)));
        assert!(!TriggerRule::AppointmentDayBefore.matches(Duration::hours(24) + Duration::minutes(7)));
        assert!(TriggerRule::AppointmentHourBefore.matches(Duration::minutes(59)));
    }

    #[test]
    fn medication_due_at_time() {
        let now = at(8, 0, 30);
        let due = due_reminders(now, &med_occ(now), &[], &[]);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "Medication Reminder");
        assert_eq!(due[0].message, "Time to take Metformin (500mg)");
        assert_eq!(due[0].occurrence_id, "med-m1-2026-03-12-08:00");

        let later = at(8, 2, 0);
        assert!(due_reminders(later, &med_occ(later), &[], &[]).is_empty());
    }

    #[test]
    fn activity_fires_thirty_minutes_before_and_at_time() {
        let early = at(17, 30, 0);
        let due = due_reminders(early, &[], &act_occ(early, false), &[]);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].rule, TriggerRule::ActivitySoon);
        assert_eq!(due[0].message, "Yoga starts in 30 minutes");

        let on_time = at(18, 0, 10);
        let due = due_reminders(on_time, &[], &act_occ(on_time, false), &[]);
        assert_eq!(due[0].rule, TriggerRule::ActivityDue);
    }

    #[test]
    fn all_day_activities_never_fire() {
        let now = at(18, 0, 0);
        assert!(due_reminders(now, &[], &act_occ(now, true), &[]).is_empty());
    }

    #[test]
    fn appointment_day_before() {
        let now = at(9, 0, 0);
        // 24h01m ahead
        let apt = visit("2026-03-13T09:01:00", Some(AppointmentStatus::Upcoming));
        let due = due_reminders(now, &[], &[], &[apt]);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "Appointment Tomorrow");
        assert_eq!(due[0].message, "Dr. Patel tomorrow at 09:01");
        assert_eq!(due[0].occurrence_id, "apt-a1");
    }

    #[test]
    fn closed_appointments_never_fire() {
        let now = at(9, 0, 0);
        for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            let soon = visit("2026-03-12T10:00:00", Some(status));
            let tomorrow = visit("2026-03-13T09:01:00", Some(status));
            let exact = visit("2026-03-12T09:00:00", Some(status));
            assert!(due_reminders(now, &[], &[], &[soon, tomorrow, exact]).is_empty());
        }
    }

    #[test]
    fn appointment_hour_before_and_at_time() {
        let now = at(9, 0, 0);
        let hour = visit("2026-03-12T10:00:30", None);
        let due = due_reminders(now, &[], &[], &[hour]);
        assert_eq!(due[0].rule, TriggerRule::AppointmentHourBefore);
        assert_eq!(due[0].title, "Appointment in 1 Hour");

        let mut lab = visit("2026-03-12T08:59:30", None);
        lab.kind = AppointmentKind::Lab;
        let due = due_reminders(now, &[], &[], &[lab]);
        assert_eq!(due[0].rule, TriggerRule::AppointmentDue);
        assert_eq!(due[0].title, "Lab Work Now");
        assert_eq!(due[0].occurrence_id, "lab-a1");
    }

    #[test]
    fn dedup_key_is_stable_across_the_window() {
        let first = at(9, 0, 0);
        let second = at(9, 4, 0);
        let apt = visit("2026-03-13T09:01:00", None);
        let a = due_reminders(first, &[], &[], std::slice::from_ref(&apt));
        let b = due_reminders(second, &[], &[], std::slice::from_ref(&apt));
        assert_eq!(a[0].dedup_key(), b[0].dedup_key());
        assert_eq!(a[0].dedup_key(), "apt-a1|apt-24h|2026-03-13-09-01");
    }

    #[test]
    fn malformed_appointment_date_never_fires() {
        let apt = visit("13/03/2026 09:00", None);
        for minute in 0..3 {
            assert!(due_reminders(at(9, minute, 0), &[], &[], std::slice::from_ref(&apt)).is_empty());
        }
    }
}
