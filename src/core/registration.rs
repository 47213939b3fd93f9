use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

/// Minimum accepted phone number length
const MIN_PHONE_LEN: usize = 7;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("static email pattern"))
}

/// Public registration form for one event
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
    pub face_id_enabled: bool,
}

impl RegistrationForm {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.first_name.trim().is_empty() {
            errors.add("firstName", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add("lastName", "Last name is required");
        }
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !email_pattern().is_match(&self.email) {
            errors.add("email", "Invalid email address");
        }
        if self.phone_number.trim().is_empty() {
            errors.add("phoneNumber", "Phone number is required");
        } else if self.phone_number.chars().count() < MIN_PHONE_LEN {
            errors.add("phoneNumber", "Enter a valid phone number");
        }

        errors
    }

    /// Name shown in the confirmation after a successful registration
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
