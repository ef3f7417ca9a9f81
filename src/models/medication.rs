use serde::{Deserialize, Serialize};

use super::enums::{deserialize_clearable, deserialize_frequency, FrequencyType};

fn default_active() -> bool {
    true
}

/// A medication schedule. One occurrence per listed time per active day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    /// Free-text frequency as written on the prescription ("twice daily").
    #[serde(default)]
    pub frequency: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, deserialize_with = "deserialize_frequency")]
    pub frequency_type: Option<FrequencyType>,
    /// `HH:MM` entries.
    #[serde(default)]
    pub times: Vec<String>,
    pub start_date: Option<String>,
    /// Inclusive last day.
    pub end_date: Option<String>,
    /// Sunday-indexed weekdays (0-6), used for weekly schedules.
    #[serde(default)]
    pub selected_days: Vec<u8>,
    pub prescribed_by: Option<String>,
    pub prescribed_date: Option<String>,
    pub appointment_id: Option<String>,
    pub reason: Option<String>,
}

impl Medication {
    /// Everything except one-shot doses recurs.
    pub fn is_recurring(&self) -> bool {
        self.frequency_type != Some(FrequencyType::Once)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationInput {
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_frequency")]
    pub frequency_type: Option<FrequencyType>,
    #[serde(default)]
    pub times: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub selected_days: Vec<u8>,
    pub prescribed_by: Option<String>,
    pub prescribed_date: Option<String>,
    pub appointment_id: Option<String>,
    pub reason: Option<String>,
}

impl MedicationInput {
    pub fn into_medication(self, id: String) -> Medication {
        Medication {
            id,
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            active: self.active.unwrap_or(true),
            frequency_type: self.frequency_type,
            times: self.times,
            start_date: self.start_date,
            end_date: self.end_date,
            selected_days: self.selected_days,
            prescribed_by: self.prescribed_by,
            prescribed_date: self.prescribed_date,
            appointment_id: self.appointment_id,
            reason: self.reason,
        }
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub active: Option<bool>,
    pub frequency_type: Option<FrequencyType>,
    pub times: Option<Vec<String>>,
    pub start_date: Option<String>,
    /// `null` clears the end date and resumes the series.
    #[serde(
        default,
        deserialize_with = "deserialize_clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<String>>,
    pub selected_days: Option<Vec<u8>>,
    pub reason: Option<String>,
}

impl MedicationPatch {
    pub fn apply(self, med: &mut Medication) {
        if let Some(v) = self.name {
            med.name = v;
        }
        if let Some(v) = self.dosage {
            med.dosage = v;
        }
        if let Some(v) = self.frequency {
            med.frequency = v;
        }
        if let Some(v) = self.active {
            med.active = v;
        }
        if let Some(v) = self.frequency_type {
            med.frequency_type = Some(v);
        }
        if let Some(v) = self.times {
            med.times = v;
        }
        if let Some(v) = self.start_date {
            med.start_date = Some(v);
        }
        if let Some(v) = self.end_date {
            med.end_date = v;
        }
        if let Some(v) = self.selected_days {
            med.selected_days = v;
        }
        if let Some(v) = self.reason {
            med.reason = Some(v);
        }
    }
}
