use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, Time};

use super::validation::ValidationErrors;

/// Longest accepted event description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Physical,
    Virtual,
    Hybrid,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Ongoing,
    Completed,
    Cancelled,
}

/// Single event as served by the API
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub venue: String,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_face_id_check_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_live_stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_stream_url: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub total_registrations: u64,
    #[serde(default)]
    pub total_attendees: u64,
    #[serde(default)]
    pub organizer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
}

/// Per-event figures computed by the API
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_registrations: u64,
    pub total_attendees: u64,
    /// Percentage
    pub registration_rate: f64,
    /// Percentage
    pub attendance_rate: f64,
    /// `None` once the event is past
    pub days_until_event: Option<i64>,
    pub capacity: i64,
    pub remaining_seats: i64,
    pub status: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub name: String,
    pub date: String,
    pub status: String,
    #[serde(default)]
    pub capacity: i64,
    pub venue: String,
    #[serde(default)]
    pub total_registrations: u64,
    #[serde(default)]
    pub total_attendees: u64,
}

/// Dashboard figures for the signed-in organizer
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerStats {
    pub total_events: u64,
    pub published_events: u64,
    pub draft_events: u64,
    pub completed_events: u64,
    pub upcoming_events: u64,
    pub total_registrations: u64,
    pub total_attendees: u64,
    #[serde(default)]
    pub recent_events: Vec<EventSummary>,
}

/// Event creation form. Dates are `YYYY-MM-DD`, time is 24-hour `HH:MM`.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventForm {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub event_type: EventType,
    pub capacity: Option<i64>,
    pub registration_deadline: Option<String>,
    pub face_id_check_in: bool,
    pub live_streaming: bool,
}

fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

fn parse_time(value: &str) -> Option<Time> {
    Time::parse(value, format_description!("[hour]:[minute]")).ok()
}

impl EventForm {
    /// Field and cross-field checks run before the form is submitted.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "Event name is required");
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.add(
                "description",
                format!("Description must be at most {} characters", MAX_DESCRIPTION_LEN),
            );
        }

        let date = if self.date.is_empty() {
            errors.add("date", "Event date is required");
            None
        } else {
            let date = parse_date(&self.date);
            if date.is_none() {
                errors.add("date", "Event date must be a valid YYYY-MM-DD date");
            }
            date
        };

        if self.time.is_empty() {
            errors.add("time", "Event time is required");
        } else if parse_time(&self.time).is_none() {
            errors.add("time", "Event time must be a valid HH:MM time");
        }

        if self.venue.trim().is_empty() {
            errors.add("venue", "Venue is required");
        }

        if matches!(self.capacity, Some(capacity) if capacity < 0) {
            errors.add("capacity", "Expected attendees cannot be negative");
        }

        if let Some(deadline) = self.registration_deadline.as_deref().filter(|d| !d.is_empty()) {
            match (parse_date(deadline), date) {
                (None, _) => errors.add(
                    "registrationDeadline",
                    "Registration deadline must be a valid YYYY-MM-DD date",
                ),
                (Some(deadline), Some(date)) if deadline > date => errors.add(
                    "registrationDeadline",
                    "Registration deadline must be on or before the event date",
                ),
                _ => {}
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> EventForm {
        EventForm {
            name: "Rust Meetup".to_owned(),
            description: "Monthly meetup".to_owned(),
            date: "2026-11-20".to_owned(),
            time: "18:30".to_owned(),
            venue: "Hall A".to_owned(),
            capacity: Some(40),
            registration_deadline: Some("2026-11-20".to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(valid_form().validate().is_empty());
    }

    #[test]
    fn test_required_fields() {
        let errors = EventForm::default().validate();
        assert_eq!(errors.get("name"), Some("Event name is required"));
        assert_eq!(errors.get("date"), Some("Event date is required"));
        assert_eq!(errors.get("time"), Some("Event time is required"));
        assert_eq!(errors.get("venue"), Some("Venue is required"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_blank_name_is_missing() {
        let form = EventForm {
            name: "   ".to_owned(),
            ..valid_form()
        };
        assert_eq!(form.validate().get("name"), Some("Event name is required"));
    }

    #[test]
    fn test_negative_capacity() {
        let form = EventForm {
            capacity: Some(-1),
            ..valid_form()
        };
        assert_eq!(
            form.validate().get("capacity"),
            Some("Expected attendees cannot be negative")
        );

        let form = EventForm {
            capacity: None,
            ..valid_form()
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn test_deadline_after_event_date() {
        let form = EventForm {
            registration_deadline: Some("2026-11-21".to_owned()),
            ..valid_form()
        };
        assert_eq!(
            form.validate().get("registrationDeadline"),
            Some("Registration deadline must be on or before the event date")
        );
    }

    #[test]
    fn test_deadline_without_valid_date_is_not_compared() {
        let form = EventForm {
            date: "soon".to_owned(),
            registration_deadline: Some("2026-11-21".to_owned()),
            ..valid_form()
        };
        let errors = form.validate();
        assert!(errors.get("date").is_some());
        assert_eq!(errors.get("registrationDeadline"), None);
    }

    #[test]
    fn test_time_format() {
        let form = EventForm {
            time: "25:00".to_owned(),
            ..valid_form()
        };
        assert!(form.validate().get("time").is_some());
    }

    #[test]
    fn test_description_limit() {
        let form = EventForm {
            description: "x".repeat(MAX_DESCRIPTION_LEN + 1),
            ..valid_form()
        };
        assert!(form.validate().get("description").is_some());
    }

    #[test]
    fn test_decode_event() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": "e1",
                "name": "Rust Meetup",
                "date": "2026-11-20",
                "time": "18:30",
                "venue": "Hall A",
                "eventType": "hybrid",
                "status": "published",
                "totalRegistrations": 12,
                "totalAttendees": 3,
                "organizerId": "u1"
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, EventType::Hybrid);
        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.total_registrations, 12);
        assert_eq!(event.capacity, None);
    }
}
