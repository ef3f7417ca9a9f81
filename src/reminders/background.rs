//! Background reminder loop: periodic scan trigger.
//!
//! Spawns a thread that scans the shared context once on start and then
//! every configured interval. The thread sleeps in short increments so a
//! shutdown request (or dropping the handle) stops it promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::SharedContext;

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(250);

/// Handle for the background reminder thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on `Drop`.
/// Keep it next to the context it scans so both go away together.
pub struct ReminderLoopHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReminderLoopHandle {
    /// Request shutdown. A scan in progress completes; no new scan starts.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ReminderLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start scanning `context` every `interval` on a separate thread.
pub fn start_reminder_loop(context: SharedContext, interval: Duration) -> ReminderLoopHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            interval_secs = interval.as_secs(),
            "Reminder loop started"
        );
        reminder_loop(&context, interval, &flag);
    });

    ReminderLoopHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn reminder_loop(context: &SharedContext, interval: Duration, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        run_scan(context);

        let mut slept = Duration::ZERO;
        while slept < interval {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("Reminder loop shutting down");
                return;
            }
            let step = SLEEP_GRANULARITY.min(interval - slept);
            std::thread::sleep(step);
            slept += step;
        }
    }
    tracing::info!("Reminder loop shutting down");
}

fn run_scan(context: &SharedContext) {
    match context.lock() {
        Ok(mut ctx) => {
            let fired = ctx.run_reminder_scan();
            if !fired.is_empty() {
                tracing::debug!(count = fired.len(), "Reminder scan fired notifications");
            }
        }
        Err(_) => tracing::warn!("Context lock poisoned, skipping reminder scan"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::EngineConfig;
    use crate::context::CareContext;
    use crate::models::enums::FrequencyType;
    use crate::models::{MedicationInput, NewEvent};
    use crate::store::Stores;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use std::time::Instant;

    fn notification_count(ctx: &SharedContext) -> usize {
        ctx.lock().unwrap().notifications().len()
    }

    fn wait_for<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        cond()
    }

    #[test]
    fn loop_fires_and_stops_on_shutdown() {
        let clock = FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 3, 12)
                .unwrap()
                .and_hms_opt(8, 0, 30)
                .unwrap(),
        );
        let mut ctx = CareContext::load(
            Stores::in_memory(),
            Box::new(clock.clone()),
            EngineConfig::default(),
        );
        ctx.add_event(NewEvent::Medication(MedicationInput {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency_type: Some(FrequencyType::Daily),
            times: vec!["08:00".into()],
            start_date: Some("2026-03-12".into()),
            ..Default::default()
        }));
        let shared: SharedContext = Arc::new(Mutex::new(ctx));

        let handle = start_reminder_loop(shared.clone(), Duration::from_millis(300));
        assert!(wait_for(|| notification_count(&shared) == 1, Duration::from_secs(5)));

        // Same minute bucket on later scans: nothing new.
        clock.advance(chrono::Duration::seconds(30));
        std::thread::sleep(Duration::from_millis(700));
        assert_eq!(notification_count(&shared), 1);

        handle.shutdown();
        assert!(wait_for(|| !handle.is_running(), Duration::from_secs(2)));
    }

    #[test]
    fn dropping_handle_joins_thread() {
        let ctx = CareContext::load(
            Stores::in_memory(),
            Box::new(FixedClock::new(
                NaiveDate::from_ymd_opt(2026, 3, 12)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
            )),
            EngineConfig::default(),
        );
        let shared: SharedContext = Arc::new(Mutex::new(ctx));
        let handle = start_reminder_loop(shared.clone(), Duration::from_secs(60));
        let started = Instant::now();
        drop(handle);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
