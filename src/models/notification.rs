use serde::{Deserialize, Serialize};

/// An inbox entry produced by the reminder scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    /// ISO timestamp of when the reminder fired.
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
}

/// One completed occurrence of a recurring medication or activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Composite occurrence id.
    pub id: String,
    pub completed_at: String,
}
