use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentKind, AppointmentStatus};
use crate::dates;

/// A doctor visit or a piece of lab work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    /// ISO date or timestamp; `None` for visits not yet scheduled.
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: AppointmentKind,
    pub doctor_name: Option<String>,
    pub lab_type: Option<String>,
    pub specialty: Option<String>,
    /// Explicit status. When absent, the status is derived from the date.
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    /// For labs: the appointment that ordered the work.
    pub attached_provider_id: Option<String>,
}

impl Appointment {
    /// Local wall-clock time of the visit, if a parsable date is set.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(dates::parse_local_datetime)
    }

    /// Explicit status, or `completed`/`upcoming` by comparing the date to `now`.
    pub fn effective_status(&self, now: NaiveDateTime) -> AppointmentStatus {
        if let Some(status) = self.status {
            return status;
        }
        match self.scheduled_at() {
            Some(at) if at < now => AppointmentStatus::Completed,
            _ => AppointmentStatus::Upcoming,
        }
    }

    /// Whether the visit was explicitly closed out (completed or cancelled).
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            Some(AppointmentStatus::Completed | AppointmentStatus::Cancelled)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == Some(AppointmentStatus::Cancelled)
    }

    /// Prefix of calendar task ids derived from this record.
    pub fn task_prefix(&self) -> &'static str {
        match self.kind {
            AppointmentKind::Appointment => "apt",
            AppointmentKind::Lab => "lab",
        }
    }

    pub fn task_id(&self) -> String {
        format!("{}-{}", self.task_prefix(), self.id)
    }

    /// Human name for lists and reminders.
    pub fn display_name(&self) -> String {
        match self.kind {
            AppointmentKind::Appointment => self
                .doctor_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Appointment".to_string()),
            AppointmentKind::Lab => self
                .lab_type
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Lab Work".to_string()),
        }
    }
}

/// Form or extraction payload for a new appointment or lab.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentInput {
    pub date: Option<String>,
    pub doctor_name: Option<String>,
    pub lab_type: Option<String>,
    pub specialty: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    pub attached_provider_id: Option<String>,
}

impl AppointmentInput {
    pub fn into_appointment(self, id: String, kind: AppointmentKind) -> Appointment {
        Appointment {
            id,
            date: self.date,
            kind,
            doctor_name: self.doctor_name,
            lab_type: self.lab_type,
            specialty: self.specialty,
            status: self.status,
            reason: self.reason,
            notes: self.notes,
            diagnosis: self.diagnosis,
            instructions: self.instructions,
            medications: self.medications,
            attached_provider_id: self.attached_provider_id,
        }
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentPatch {
    pub date: Option<String>,
    pub doctor_name: Option<String>,
    pub lab_type: Option<String>,
    pub specialty: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub diagnosis: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub attached_provider_id: Option<String>,
}

impl AppointmentPatch {
    pub fn apply(self, apt: &mut Appointment) {
        if let Some(v) = self.date {
            apt.date = Some(v);
        }
        if let Some(v) = self.doctor_name {
            apt.doctor_name = Some(v);
        }
        if let Some(v) = self.lab_type {
            apt.lab_type = Some(v);
        }
        if let Some(v) = self.specialty {
            apt.specialty = Some(v);
        }
        if let Some(v) = self.status {
            apt.status = Some(v);
        }
        if let Some(v) = self.reason {
            apt.reason = Some(v);
        }
        if let Some(v) = self.notes {
            apt.notes = Some(v);
        }
        if let Some(v) = self.diagnosis {
            apt.diagnosis = v;
        }
        if let Some(v) = self.instructions {
            apt.instructions = v;
        }
        if let Some(v) = self.medications {
            apt.medications = v;
        }
        if let Some(v) = self.attached_provider_id {
            apt.attached_provider_id = Some(v);
        }
    }
}
