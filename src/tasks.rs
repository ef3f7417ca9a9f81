//! Task aggregation: merges appointments with generated medication and
//! activity occurrences into the calendar view and today's checklist.
//!
//! Both views are derived on demand and never written back.

use chrono::NaiveDateTime;

use crate::completion::CompletionSet;
use crate::dates;
use crate::models::enums::{AppointmentKind, AppointmentStatus};
use crate::models::{Appointment, CalendarTask, TodayTask};
use crate::occurrence::{Occurrence, SourceKind};

/// Calendar entry for an appointment or lab. Cancelled visits and visits
/// without a parsable date have none.
pub fn appointment_task(apt: &Appointment) -> Option<CalendarTask> {
    if apt.is_cancelled() {
        return None;
    }
    let Some(at) = apt.scheduled_at() else {
        if let Some(raw) = apt.date.as_deref() {
            tracing::debug!(id = %apt.id, date = raw, "Unparsable appointment date, not scheduled");
        }
        return None;
    };
    Some(CalendarTask {
        id: apt.task_id(),
        date: at.date(),
        title: apt.display_name(),
        task_type: apt.kind.into(),
        time: appointment_time(apt, at),
        original_id: None,
    })
}

/// `HH:MM` when the stored date carries a time of day.
fn appointment_time(apt: &Appointment, at: NaiveDateTime) -> Option<String> {
    let has_time = apt.date.as_deref().is_some_and(|d| d.trim().len() > 10);
    has_time.then(|| dates::time_key(at.time()))
}

/// Every calendar entry: appointments, then medications, then activities.
/// Consumers bucket by date; order is not significant.
pub fn calendar_tasks(
    appointments: &[Appointment],
    medication_occurrences: &[Occurrence],
    activity_occurrences: &[Occurrence],
) -> Vec<CalendarTask> {
    appointments
        .iter()
        .filter_map(appointment_task)
        .chain(medication_occurrences.iter().map(Occurrence::to_calendar_task))
        .chain(activity_occurrences.iter().map(Occurrence::to_calendar_task))
        .collect()
}

/// Today's checklist, grouped appointments → medications → activities.
///
/// Appointment completion reflects the appointment's own status;
/// occurrence completion comes from the completion set.
pub fn today_tasks(
    appointments: &[Appointment],
    medication_occurrences: &[Occurrence],
    activity_occurrences: &[Occurrence],
    completions: &CompletionSet,
    now: NaiveDateTime,
) -> Vec<TodayTask> {
    let today = now.date();

    let visits = appointments.iter().filter_map(|apt| {
        let task = appointment_task(apt)?;
        (task.date == today).then(|| TodayTask {
            subtitle: appointment_subtitle(apt, task.time.as_deref()),
            completed: apt.effective_status(now) == AppointmentStatus::Completed,
            task,
        })
    });

    let occurrences = medication_occurrences
        .iter()
        .chain(activity_occurrences.iter())
        .filter(|occ| occ.date == today)
        .map(|occ| TodayTask {
            task: occ.to_calendar_task(),
            subtitle: occurrence_subtitle(occ),
            completed: completions.is_completed(&occ.id),
        });

    visits.chain(occurrences).collect()
}

fn appointment_subtitle(apt: &Appointment, time: Option<&str>) -> String {
    let lead = match apt.kind {
        AppointmentKind::Appointment => apt
            .specialty
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Doctor visit".to_string()),
        AppointmentKind::Lab => "Lab work".to_string(),
    };
    match time {
        Some(t) => format!("{lead} · {t}"),
        None => lead,
    }
}

fn occurrence_subtitle(occ: &Occurrence) -> String {
    let when = match (occ.time, occ.kind) {
        (Some(t), _) => dates::time_key(t),
        (None, SourceKind::Medication) => "Any time".to_string(),
        (None, SourceKind::Activity) => "All day".to_string(),
    };
    match occ.detail.as_deref() {
        Some(detail) => format!("{detail} · {when}"),
        None => when,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{FrequencyType, TaskType};
    use crate::models::{ActivityInput, AppointmentInput, MedicationInput};
    use crate::occurrence::{activity_occurrences, medication_occurrences, GenerationWindow};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 12)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn visit(id: &str, date: &str, status: Option<AppointmentStatus>) -> Appointment {
        AppointmentInput {
            date: Some(date.into()),
            doctor_name: Some("Dr. Lee".into()),
            specialty: Some("Cardiology".into()),
            status,
            ..Default::default()
        }
        .into_appointment(id.into(), AppointmentKind::Appointment)
    }

    fn meds() -> Vec<Occurrence> {
        let med = MedicationInput {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency_type: Some(FrequencyType::Daily),
            times: vec!["08:00".into(), "20:00".into()],
            start_date: Some("2026-03-10".into()),
            ..Default::default()
        }
        .into_medication("m1".into());
        medication_occurrences(&[med], GenerationWindow::standard(now().date()), now())
    }

    fn activities() -> Vec<Occurrence> {
        let walk = ActivityInput {
            title: "Walk".into(),
            date: "2026-03-12".into(),
            all_day: true,
            frequency_type: Some(FrequencyType::Once),
            ..Default::default()
        }
        .into_event("e1".into());
        activity_occurrences(&[walk], GenerationWindow::standard(now().date()), now())
    }

    #[test]
    fn calendar_skips_cancelled_and_undated() {
        let mut undated = visit("a3", "", None);
        undated.date = None;
        let apts = vec![
            visit("a1", "2026-03-15T09:30", None),
            visit("a2", "2026-03-16T09:30", Some(AppointmentStatus::Cancelled)),
            undated,
            visit("a4", "next tuesday", None),
        ];
        let tasks = calendar_tasks(&apts, &[], &[]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "apt-a1");
        assert_eq!(tasks[0].time.as_deref(), Some("09:30"));
        assert_eq!(tasks[0].task_type, TaskType::Appointment);
    }

    #[test]
    fn calendar_unions_all_sources() {
        let apts = vec![visit("a1", "2026-03-15", None)];
        let med_occ = meds();
        let act_occ = activities();
        let tasks = calendar_tasks(&apts, &med_occ, &act_occ);
        assert_eq!(tasks.len(), 1 + med_occ.len() + act_occ.len());
        assert_eq!(tasks[0].time, None);
    }

    #[test]
    fn today_groups_and_annotates() {
        let apts = vec![
            visit("a1", "2026-03-12T14:00", None),
            visit("a2", "2026-03-13T14:00", None),
        ];
        let mut done = CompletionSet::new();
        done.set("med-m1-2026-03-12-08:00", true);

        let tasks = today_tasks(&apts, &meds(), &activities(), &done, now());
        let kinds: Vec<_> = tasks.iter().map(|t| t.task.task_type).collect();
        assert_eq!(
            kinds,
            vec![
                TaskType::Appointment,
                TaskType::Medication,
                TaskType::Medication,
                TaskType::Activity
            ]
        );
        assert_eq!(tasks[0].subtitle, "Cardiology · 14:00");
        assert!(!tasks[0].completed);
        assert_eq!(tasks[1].subtitle, "500mg · 08:00");
        assert!(tasks[1].completed);
        assert!(!tasks[2].completed);
        assert_eq!(tasks[3].subtitle, "All day");
    }

    #[test]
    fn appointment_completion_follows_status() {
        let apts = vec![
            visit("a1", "2026-03-12T08:00", None),
            visit("a2", "2026-03-12T16:00", Some(AppointmentStatus::Completed)),
            visit("a3", "2026-03-12T07:00", Some(AppointmentStatus::Upcoming)),
        ];
        let tasks = today_tasks(&apts, &[], &[], &CompletionSet::new(), now());
        let done: Vec<_> = tasks.iter().map(|t| t.completed).collect();
        // a1 is past with no explicit status, so derived as completed.
        assert_eq!(done, vec![true, true, false]);
    }

    #[test]
    fn lab_subtitle() {
        let mut lab = visit("l1", "2026-03-12", None);
        lab.kind = AppointmentKind::Lab;
        lab.lab_type = Some("CBC".into());
        let tasks = today_tasks(&[lab], &[], &[], &CompletionSet::new(), now());
        assert_eq!(tasks[0].task.id, "lab-l1");
        assert_eq!(tasks[0].task.title, "CBC");
        assert_eq!(tasks[0].subtitle, "Lab work");
    }

    #[test]
    fn malformed_appointment_date_stays_off_today() {
        let apts = vec![visit("a1", "someday", None), visit("a2", "2026-03-12T16:00", None)];
        let tasks = today_tasks(&apts, &[], &[], &CompletionSet::new(), now());
        let ids: Vec<_> = tasks.iter().map(|t| t.task.id.as_str()).collect();
        assert_eq!(ids, vec!["apt-a2"]);
    }
}
