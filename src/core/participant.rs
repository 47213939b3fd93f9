use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Attendance state as recorded by the API.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParticipantStatus {
    #[default]
    Registered,
    Attended,
    NoShow,
}

/// A single registration for an event
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Opaque participant ID, unique within an event
    pub id: String,

    #[serde(default)]
    pub event_id: String,

    pub first_name: String,
    pub last_name: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,

    #[serde(default)]
    pub checked_in: bool,

    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub checked_in_at: Option<OffsetDateTime>,

    #[serde(default)]
    pub status: ParticipantStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
}

impl Participant {
    /// "First Last", the form searched by the roster filter
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn mark_checked_in(&mut self, at: OffsetDateTime) {
        self.checked_in = true;
        self.checked_in_at = Some(at);
    }

    pub fn apply_patch(&mut self, patch: &ParticipantPatch) {
        if let Some(first_name) = &patch.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
    }
}

/// Operator-editable fields of a participant. `None` leaves a field as is.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ParticipantPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}
