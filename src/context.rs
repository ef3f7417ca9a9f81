//! CareContext: the session service behind the calendar, the daily
//! checklist and the notification inbox.
//!
//! Holds the authoritative in-memory collections and writes every change
//! through to the injected stores. Store failures are logged and
//! swallowed: the session state stays correct and the next successful
//! write catches the store up for that record. Derived views (calendar,
//! today) are recomputed from the definitions on every read.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::completion::{appointment_id_from_task, CompletionChange, CompletionSet};
use crate::config::EngineConfig;
use crate::dates;
use crate::models::enums::{AppointmentKind, AppointmentStatus, TaskType};
use crate::models::{
    Appointment, CalendarTask, CompletionRecord, CustomEvent, Document, EventUpdate, Medication,
    NewEvent, Notification, TodayTask, Transcript,
};
use crate::occurrence::{self, GenerationWindow, Occurrence, SourceKind};
use crate::reminders::{PlatformNotifier, ReminderScanner, SoundPlayer};
use crate::store::{Record, RecordStore, StoreError, Stores};
use crate::tasks;

/// Context shared between the caller and the reminder loop.
pub type SharedContext = Arc<Mutex<CareContext>>;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Context lock poisoned")]
    LockPoisoned,
}

/// Wrap a context for sharing with the reminder loop.
pub fn share(context: CareContext) -> SharedContext {
    Arc::new(Mutex::new(context))
}

/// Lock a shared context.
pub fn lock(shared: &SharedContext) -> Result<MutexGuard<'_, CareContext>, ContextError> {
    shared.lock().map_err(|_| ContextError::LockPoisoned)
}

pub struct CareContext {
    stores: Stores,
    clock: Box<dyn Clock>,
    config: EngineConfig,
    appointments: Vec<Appointment>,
    medications: Vec<Medication>,
    activities: Vec<CustomEvent>,
    documents: Vec<Document>,
    transcripts: Vec<Transcript>,
    completions: CompletionSet,
    notifications: Vec<Notification>,
    scanner: ReminderScanner,
}

impl CareContext {
    /// Load every collection from `stores`. A collection that fails to
    /// load starts empty.
    pub fn load(stores: Stores, clock: Box<dyn Clock>, config: EngineConfig) -> Self {
        let appointments = load_collection(stores.appointments.as_ref());
        let medications = load_collection(stores.medications.as_ref());
        let activities = load_collection(stores.activities.as_ref());
        let documents = load_collection(stores.documents.as_ref());
        let transcripts = load_collection(stores.transcripts.as_ref());
        let completions = CompletionSet::from_records(&load_collection(stores.completions.as_ref()));
        let notifications = load_collection(stores.notifications.as_ref());

        tracing::info!(
            appointments = appointments.len(),
            medications = medications.len(),
            activities = activities.len(),
            completions = completions.len(),
            notifications = notifications.len(),
            "Care context loaded"
        );

        Self {
            scanner: ReminderScanner::new(&config),
            stores,
            clock,
            config,
            appointments,
            medications,
            activities,
            documents,
            transcripts,
            completions,
            notifications,
        }
    }

    // ── Collaborators ───────────────────────────────────────

    pub fn set_notifier(&mut self, notifier: Box<dyn PlatformNotifier>) {
        self.scanner.set_notifier(notifier);
    }

    pub fn set_sound_player(&mut self, sound: Box<dyn SoundPlayer>) {
        self.scanner.set_sound(sound);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Generation window around the current day.
    pub fn window(&self) -> GenerationWindow {
        GenerationWindow::around(self.now().date(), &self.config)
    }

    // ── Raw collections ─────────────────────────────────────

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn activities(&self) -> &[CustomEvent] {
        &self.activities
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn transcripts(&self) -> &[Transcript] {
        &self.transcripts
    }

    pub fn completions(&self) -> &CompletionSet {
        &self.completions
    }

    // ── Derived views ───────────────────────────────────────

    pub fn medication_occurrences(&self) -> Vec<Occurrence> {
        occurrence::medication_occurrences(&self.medications, self.window(), self.now())
    }

    pub fn activity_occurrences(&self) -> Vec<Occurrence> {
        occurrence::activity_occurrences(&self.activities, self.window(), self.now())
    }

    pub fn calendar_tasks(&self) -> Vec<CalendarTask> {
        tasks::calendar_tasks(
            &self.appointments,
            &self.medication_occurrences(),
            &self.activity_occurrences(),
        )
    }

    pub fn today_tasks(&self) -> Vec<TodayTask> {
        tasks::today_tasks(
            &self.appointments,
            &self.medication_occurrences(),
            &self.activity_occurrences(),
            &self.completions,
            self.now(),
        )
    }

    // ── Events ──────────────────────────────────────────────

    /// Create an appointment, lab, medication or activity. Returns its id.
    pub fn add_event(&mut self, event: NewEvent) -> String {
        let id = Uuid::new_v4().to_string();
        match event {
            NewEvent::Appointment(input) => {
                let apt = input.into_appointment(id.clone(), AppointmentKind::Appointment);
                persist(self.stores.appointments.create(&apt), Appointment::COLLECTION);
                self.appointments.push(apt);
            }
            NewEvent::Lab(input) => {
                let lab = input.into_appointment(id.clone(), AppointmentKind::Lab);
                persist(self.stores.appointments.create(&lab), Appointment::COLLECTION);
                self.appointments.push(lab);
            }
            NewEvent::Medication(input) => {
                let med = input.into_medication(id.clone());
                persist(self.stores.medications.create(&med), Medication::COLLECTION);
                self.medications.push(med);
            }
            NewEvent::Activity(input) => {
                let event = input.into_event(id.clone());
                persist(self.stores.activities.create(&event), CustomEvent::COLLECTION);
                self.activities.push(event);
            }
        }
        tracing::debug!(id = %id, "Event added");
        id
    }

    /// Apply a partial update. Returns `false` when nothing matches `id`.
    pub fn update_event(&mut self, id: &str, update: EventUpdate) -> bool {
        match update {
            EventUpdate::Appointment(patch) => {
                let id = appointment_id_from_task(id);
                let Some(apt) = self.appointments.iter_mut().find(|a| a.id == id) else {
                    return lookup_miss(id, "appointment");
                };
                patch.apply(apt);
                persist(self.stores.appointments.update(apt), Appointment::COLLECTION);
            }
            EventUpdate::Medication(patch) => {
                let Some(med) = self.medications.iter_mut().find(|m| m.id == id) else {
                    return lookup_miss(id, "medication");
                };
                patch.apply(med);
                persist(self.stores.medications.update(med), Medication::COLLECTION);
            }
            EventUpdate::Activity(patch) => {
                let Some(event) = self.activities.iter_mut().find(|e| e.id == id) else {
                    return lookup_miss(id, "activity");
                };
                patch.apply(event);
                persist(self.stores.activities.update(event), CustomEvent::COLLECTION);
            }
        }
        true
    }

    /// Delete an event.
    ///
    /// - Appointments and labs are removed; their documents are detached,
    ///   their transcripts deleted and labs ordered by them unlinked.
    /// - A recurring medication is stopped by ending it yesterday, so past
    ///   occurrences and their completion records stay valid. One-off
    ///   medications are removed.
    /// - Activities are removed.
    ///
    /// With `delete_series == Some(false)` and an `instance_date`, a
    /// recurring medication or activity ends the day before that instance
    /// instead; an instance on or before the first day removes the whole
    /// series as above.
    pub fn delete_event(
        &mut self,
        id: &str,
        task_type: TaskType,
        delete_series: Option<bool>,
        instance_date: Option<&str>,
    ) -> bool {
        let today = self.now().date();
        let cut_at = match (delete_series, instance_date) {
            (Some(false), Some(raw)) => Some(dates::local_date_or_today(raw, self.now())),
            _ => None,
        };

        match task_type {
            TaskType::Appointment | TaskType::Lab => {
                self.delete_appointment(appointment_id_from_task(id))
            }
            TaskType::Medication => {
                let now = self.now();
                let Some(idx) = self.medications.iter().position(|m| m.id == id) else {
                    return lookup_miss(id, "medication");
                };
                let med = &mut self.medications[idx];
                if med.is_recurring() {
                    let start = med
                        .start_date
                        .as_deref()
                        .map(|raw| dates::local_date_or_today(raw, now));
                    let last_day = match cut_at {
                        Some(cut) if start.map_or(true, |s| cut > s) => cut - Duration::days(1),
                        _ => today - Duration::days(1),
                    };
                    end_no_later_than(&mut med.end_date, last_day, now);
                    tracing::info!(id, end_date = ?med.end_date, "Medication stopped");
                    persist(self.stores.medications.update(med), Medication::COLLECTION);
                } else {
                    self.medications.remove(idx);
                    persist(self.stores.medications.delete(id), Medication::COLLECTION);
                }
                true
            }
            TaskType::Activity => {
                let now = self.now();
                let Some(idx) = self.activities.iter().position(|e| e.id == id) else {
                    return lookup_miss(id, "activity");
                };
                let event = &mut self.activities[idx];
                let start = dates::local_date_or_today(&event.date, now);
                match cut_at {
                    Some(cut) if event.is_recurring() && cut > start => {
                        end_no_later_than(&mut event.end_date, cut - Duration::days(1), now);
                        persist(self.stores.activities.update(event), CustomEvent::COLLECTION);
                    }
                    _ => {
                        self.activities.remove(idx);
                        persist(self.stores.activities.delete(id), CustomEvent::COLLECTION);
                    }
                }
                true
            }
        }
    }

    fn delete_appointment(&mut self, id: &str) -> bool {
        let Some(idx) = self.appointments.iter().position(|a| a.id == id) else {
            return lookup_miss(id, "appointment");
        };
        self.appointments.remove(idx);
        persist(self.stores.appointments.delete(id), Appointment::COLLECTION);

        for doc in self
            .documents
            .iter_mut()
            .filter(|d| d.appointment_id.as_deref() == Some(id))
        {
            doc.appointment_id = None;
            persist(self.stores.documents.update(doc), Document::COLLECTION);
        }

        let (owned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.transcripts)
            .into_iter()
            .partition(|t| t.appointment_id.as_deref() == Some(id));
        self.transcripts = kept;
        for transcript in &owned {
            persist(
                self.stores.transcripts.delete(&transcript.id),
                Transcript::COLLECTION,
            );
        }

        for lab in self
            .appointments
            .iter_mut()
            .filter(|a| a.attached_provider_id.as_deref() == Some(id))
        {
            lab.attached_provider_id = None;
            persist(self.stores.appointments.update(lab), Appointment::COLLECTION);
        }

        tracing::info!(id, transcripts_deleted = owned.len(), "Appointment deleted");
        true
    }

    // ── Completion ──────────────────────────────────────────

    /// Check or uncheck a calendar task.
    ///
    /// Appointments and labs flip their own status between completed and
    /// upcoming. Medication and activity occurrences are tracked per
    /// composite id. Returns `false` when the backing record is gone.
    pub fn toggle_task_completion(&mut self, id: &str, task_type: TaskType, completed: bool) -> bool {
        if task_type.is_appointment_like() {
            let apt_id = appointment_id_from_task(id);
            let Some(apt) = self.appointments.iter_mut().find(|a| a.id == apt_id) else {
                return lookup_miss(apt_id, "appointment");
            };
            apt.status = Some(if completed {
                AppointmentStatus::Completed
            } else {
                AppointmentStatus::Upcoming
            });
            persist(self.stores.appointments.update(apt), Appointment::COLLECTION);
            return true;
        }

        if !self.has_definition_for(id, task_type) {
            return lookup_miss(id, task_type.as_str());
        }

        match self.completions.set(id, completed) {
            CompletionChange::Added => {
                let record = CompletionRecord {
                    id: id.to_string(),
                    completed_at: dates::to_iso_timestamp(self.now()),
                };
                persist(self.stores.completions.create(&record), CompletionRecord::COLLECTION);
            }
            CompletionChange::Removed => {
                persist(self.stores.completions.delete(id), CompletionRecord::COLLECTION);
            }
            CompletionChange::Unchanged => {}
        }
        true
    }

    fn has_definition_for(&self, occurrence_id: &str, task_type: TaskType) -> bool {
        let (kind, ids): (SourceKind, Vec<&str>) = match task_type {
            TaskType::Medication => (
                SourceKind::Medication,
                self.medications.iter().map(|m| m.id.as_str()).collect(),
            ),
            _ => (
                SourceKind::Activity,
                self.activities.iter().map(|e| e.id.as_str()).collect(),
            ),
        };
        ids.into_iter().any(|source_id| {
            occurrence_id.starts_with(&format!("{}-{}-", kind.prefix(), source_id))
        })
    }

    // ── Documents & transcripts ─────────────────────────────

    /// Register a document, optionally attached to an appointment.
    pub fn add_document(&mut self, name: &str, appointment_id: Option<&str>) -> String {
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            appointment_id: appointment_id.map(str::to_string),
            uploaded_at: dates::to_iso_timestamp(self.now()),
        };
        persist(self.stores.documents.create(&doc), Document::COLLECTION);
        let id = doc.id.clone();
        self.documents.push(doc);
        id
    }

    /// Store a visit transcript owned by `appointment_id`.
    pub fn add_transcript(&mut self, appointment_id: &str, text: &str) -> String {
        let transcript = Transcript {
            id: Uuid::new_v4().to_string(),
            appointment_id: Some(appointment_id.to_string()),
            text: text.to_string(),
            created_at: dates::to_iso_timestamp(self.now()),
        };
        persist(self.stores.transcripts.create(&transcript), Transcript::COLLECTION);
        let id = transcript.id.clone();
        self.transcripts.push(transcript);
        id
    }

    // ── Notifications ───────────────────────────────────────

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn remove_notification(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        if self.notifications.len() == before {
            return lookup_miss(id, "notification");
        }
        persist(self.stores.notifications.delete(id), Notification::COLLECTION);
        true
    }

    pub fn mark_notification_read(&mut self, id: &str) -> bool {
        let Some(note) = self.notifications.iter_mut().find(|n| n.id == id) else {
            return lookup_miss(id, "notification");
        };
        if !note.read {
            note.read = true;
            persist(self.stores.notifications.update(note), Notification::COLLECTION);
        }
        true
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
        persist(self.stores.notifications.clear(), Notification::COLLECTION);
    }

    /// Run one reminder pass at the current time and append what fired
    /// to the inbox.
    pub fn run_reminder_scan(&mut self) -> Vec<Notification> {
        let now = self.now();
        let med_occ = self.medication_occurrences();
        let act_occ = self.activity_occurrences();
        let fired = self.scanner.scan(now, &med_occ, &act_occ, &self.appointments);
        for note in &fired {
            persist(self.stores.notifications.create(note), Notification::COLLECTION);
        }
        self.notifications.extend(fired.iter().cloned());
        fired
    }
}

/// Clamp an optional end date so the series stops no later than `last_day`.
fn end_no_later_than(end_date: &mut Option<String>, last_day: NaiveDate, now: NaiveDateTime) {
    let current = end_date
        .as_deref()
        .map(|raw| dates::local_date_or_today(raw, now));
    if current.map_or(true, |end| end > last_day) {
        *end_date = Some(dates::date_key(last_day));
    }
}

fn load_collection<T: Record>(store: &dyn RecordStore<T>) -> Vec<T> {
    match store.list() {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(collection = T::COLLECTION, error = %e, "Failed to load collection");
            Vec::new()
        }
    }
}

fn persist(result: Result<(), StoreError>, collection: &str) {
    if let Err(e) = result {
        tracing::warn!(collection, error = %e, "Persist failed, keeping session state");
    }
}

fn lookup_miss(id: &str, what: &str) -> bool {
    tracing::debug!(id, what, "No matching record, ignoring");
    false
}
