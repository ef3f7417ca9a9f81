use serde::{Deserialize, Serialize};

/// An uploaded file, optionally attached to an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub appointment_id: Option<String>,
    pub uploaded_at: String,
}

/// A transcribed visit recording. Owned by its appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub appointment_id: Option<String>,
    pub text: String,
    pub created_at: String,
}
