//! Participant registrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{error::DeskError, identity::Identity};

/// Registration form as submitted by a participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub full_name:  String,
    pub email:      String,
    pub student_id: String,
    pub course:     String
}

impl RegistrationForm {
    /// Every field is required. Nothing beyond presence is checked.
    pub fn validate(&self) -> Result<(), DeskError> {
        let missing: Vec<&str> = [
            ("full name", &self.full_name),
            ("email", &self.email),
            ("student id", &self.student_id),
            ("course", &self.course)
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DeskError::Validation(format!(
                "please fill in every registration field: {} missing",
                missing.join(", ")
            )))
        }
    }

    pub fn into_registration(self, submitted_by: &Identity) -> Result<Registration, DeskError> {
        self.validate()?;

        Ok(Registration {
            full_name:     self.full_name.trim().to_string(),
            email:         self.email.trim().to_string(),
            student_id:    self.student_id.trim().to_string(),
            course:        self.course.trim().to_string(),
            submitted_by:  submitted_by.id().to_string(),
            registered_at: Utc::now()
        })
    }
}

/// Immutable registration record stored on its event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub full_name:     String,
    pub email:         String,
    pub student_id:    String,
    pub course:        String,
    /// Identity id of the session that submitted the form
    pub submitted_by:  String,
    pub registered_at: DateTime<Utc>
}
