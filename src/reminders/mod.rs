//! Reminder scanner: evaluates trigger rules against the current
//! occurrence set and fires each reminder at most once.
//!
//! A firing has three independent best-effort effects: a sound, a
//! platform notification (when permitted) and an inbox entry. Failures of
//! the first two are logged and never block the third.

pub mod background;
pub mod rules;

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dates;
use crate::models::{Appointment, Notification};
use crate::occurrence::Occurrence;

pub use background::{start_reminder_loop, ReminderLoopHandle};
pub use rules::{due_reminders, Reminder, TriggerRule};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Notification backend unavailable: {0}")]
    Unavailable(String),

    #[error("Sound playback failed: {0}")]
    Playback(String),
}

// ═══════════════════════════════════════════════════════════
// Side-effect collaborators
// ═══════════════════════════════════════════════════════════

/// Platform notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
}

/// OS-level notification surface.
pub trait PlatformNotifier: Send {
    fn permission(&self) -> Permission;

    /// Ask the user. Called at most once per scanner.
    fn request_permission(&self) -> Permission;

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Audible cue played on each firing.
pub trait SoundPlayer: Send {
    fn play(&self) -> Result<(), NotifyError>;
}

/// Notifier that writes reminders to the log. Always permitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl PlatformNotifier for LogNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(title, body, "Reminder");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Scanner
// ═══════════════════════════════════════════════════════════

/// Session-scoped reminder scanner holding the dedup ledger.
pub struct ReminderScanner {
    /// Dedup key → instant the reminder fired.
    ledger: HashMap<String, NaiveDateTime>,
    retention: Duration,
    notifier: Option<Box<dyn PlatformNotifier>>,
    sound: Option<Box<dyn SoundPlayer>>,
    /// Resolved on first use, then reused.
    permission: Option<Permission>,
}

impl ReminderScanner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ledger: HashMap::new(),
            retention: Duration::hours(i64::from(config.ledger_retention_hours)),
            notifier: None,
            sound: None,
            permission: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn PlatformNotifier>) -> Self {
        self.set_notifier(notifier);
        self
    }

    pub fn with_sound(mut self, sound: Box<dyn SoundPlayer>) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn PlatformNotifier>) {
        self.notifier = Some(notifier);
        self.permission = None;
    }

    pub fn set_sound(&mut self, sound: Box<dyn SoundPlayer>) {
        self.sound = Some(sound);
    }

    /// Number of reminders remembered as fired.
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    /// Fire every due reminder not already in the ledger and return the
    /// inbox entries to append.
    pub fn scan(
        &mut self,
        now: NaiveDateTime,
        medication_occurrences: &[Occurrence],
        activity_occurrences: &[Occurrence],
        appointments: &[Appointment],
    ) -> Vec<Notification> {
        self.prune(now);

        let due = due_reminders(now, medication_occurrences, activity_occurrences, appointments);
        let mut fired = Vec::new();
        for reminder in due {
            let key = reminder.dedup_key();
            if self.ledger.contains_key(&key) {
                continue;
            }
            self.ledger.insert(key, now);
            fired.push(self.fire(&reminder, now));
        }
        fired
    }

    fn fire(&mut self, reminder: &Reminder, now: NaiveDateTime) -> Notification {
        tracing::info!(
            occurrence = %reminder.occurrence_id,
            rule = reminder.rule.tag(),
            "Firing reminder"
        );

        if let Some(sound) = &self.sound {
            if let Err(e) = sound.play() {
                tracing::warn!(error = %e, "Reminder sound failed");
            }
        }

        if self.platform_permission() == Permission::Granted {
            if let Some(notifier) = &self.notifier {
                if let Err(e) = notifier.show(&reminder.title, &reminder.message) {
                    tracing::warn!(error = %e, "Platform notification failed");
                }
            }
        }

        Notification {
            id: Uuid::new_v4().to_string(),
            title: reminder.title.clone(),
            message: reminder.message.clone(),
            timestamp: dates::to_iso_timestamp(now),
            read: false,
        }
    }

    fn platform_permission(&mut self) -> Permission {
        if let Some(p) = self.permission {
            return p;
        }
        let Some(notifier) = &self.notifier else {
            return Permission::Denied;
        };
        let mut permission = notifier.permission();
        if permission == Permission::Undetermined {
            permission = notifier.request_permission();
        }
        if permission != Permission::Granted {
            tracing::warn!(?permission, "Platform notifications disabled");
        }
        self.permission = Some(permission);
        permission
    }

    fn prune(&mut self, now: NaiveDateTime) {
        let retention = self.retention;
        self.ledger.retain(|_, fired_at| now - *fired_at < retention);
    }
}
