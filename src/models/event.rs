//! Typed payloads accepted by the context's add/update operations.

use serde::{Deserialize, Serialize};

use super::activity::{ActivityInput, ActivityPatch};
use super::appointment::{AppointmentInput, AppointmentPatch};
use super::medication::{MedicationInput, MedicationPatch};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NewEvent {
    Appointment(AppointmentInput),
    Lab(AppointmentInput),
    Medication(MedicationInput),
    Activity(ActivityInput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventUpdate {
    /// Applies to both appointments and labs.
    Appointment(AppointmentPatch),
    Medication(MedicationPatch),
    Activity(ActivityPatch),
}
