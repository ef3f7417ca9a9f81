use serde::{Deserialize, Deserializer, Serialize};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(FrequencyType {
    Daily => "daily",
    Weekly => "weekly",
    Once => "once",
});

str_enum!(AppointmentKind {
    Appointment => "appointment",
    Lab => "lab",
});

str_enum!(AppointmentStatus {
    Upcoming => "upcoming",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(TaskType {
    Appointment => "appointment",
    Lab => "lab",
    Medication => "medication",
    Activity => "activity",
});

impl TaskType {
    /// Whether completion is tracked on the appointment record itself.
    pub fn is_appointment_like(&self) -> bool {
        matches!(self, Self::Appointment | Self::Lab)
    }
}

impl From<AppointmentKind> for TaskType {
    fn from(kind: AppointmentKind) -> Self {
        match kind {
            AppointmentKind::Appointment => Self::Appointment,
            AppointmentKind::Lab => Self::Lab,
        }
    }
}

/// Deserialize a frequency type, mapping unknown or missing values to `None`.
///
/// Definitions with no recognised frequency recur every day.
pub fn deserialize_frequency<'de, D>(deserializer: D) -> Result<Option<FrequencyType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Patch field that distinguishes "absent" from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_clearable")]`:
/// a missing key stays `None`, `null` becomes `Some(None)`.
pub fn deserialize_clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
