use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "CareScribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Days before today included in the occurrence window.
pub const DEFAULT_PAST_DAYS: u32 = 5;

/// Total length of the rolling occurrence window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 60;

/// Reminder scan cadence: once per minute.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

/// Upper bound for `past_days` and `window_days`.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// How long a fired reminder stays in the dedup ledger.
pub const DEFAULT_LEDGER_RETENTION_HOURS: u32 = 48;

/// Get the application data directory
/// ~/CareScribe/ on all platforms. Falls back to the working directory
/// when no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the SQLite file holding all records.
pub fn database_path() -> PathBuf {
    app_data_dir().join("carescribe.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carescribe_lib=info,carescribe=info"
}

// ═══════════════════════════════════════════════════════════
// EngineConfig
// ═══════════════════════════════════════════════════════════

/// Tuning for occurrence generation and the reminder loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Days before today where the window starts.
    pub past_days: u32,
    /// Window length in days (`[today - past_days, today - past_days + window_days)`).
    pub window_days: u32,
    /// Seconds between two reminder scans.
    pub scan_interval_secs: u64,
    /// Hours a dedup ledger entry is kept before pruning.
    pub ledger_retention_hours: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            past_days: DEFAULT_PAST_DAYS,
            window_days: DEFAULT_WINDOW_DAYS,
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            ledger_retention_hours: DEFAULT_LEDGER_RETENTION_HOURS,
        }
    }
}

impl EngineConfig {
    /// Read overrides from `CARESCRIBE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparsable values
    /// keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            past_days: clamp_days(
                "CARESCRIBE_PAST_DAYS",
                read_var(&lookup, "CARESCRIBE_PAST_DAYS", defaults.past_days),
            ),
            window_days: clamp_days(
                "CARESCRIBE_WINDOW_DAYS",
                read_var(&lookup, "CARESCRIBE_WINDOW_DAYS", defaults.window_days),
            )
            .max(1),
            scan_interval_secs: read_var(
                &lookup,
                "CARESCRIBE_SCAN_INTERVAL_SECS",
                defaults.scan_interval_secs,
            )
            .max(1),
            ledger_retention_hours: read_var(
                &lookup,
                "CARESCRIBE_LEDGER_RETENTION_HOURS",
                defaults.ledger_retention_hours,
            ),
        }
    }
}

fn clamp_days(key: &str, value: u32) -> u32 {
    if value > MAX_WINDOW_DAYS {
        tracing::warn!(key, value, max = MAX_WINDOW_DAYS, "Clamping out-of-range config value");
        return MAX_WINDOW_DAYS;
    }
    value
}

fn read_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring unparsable config value");
                default
            }
        },
        None => default,
    }
}
