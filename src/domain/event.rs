//! Event records and the editable form they are built from
//!
//! An [`Event`] is the administrable activity: its details, its status and the
//! ordered list of registrations taken against its capacity. Every mutation of a
//! stored event goes through the methods here, so the capacity and status rules
//! are enforced in one place no matter which store applies them.

use std::fmt::{self, Display};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{error::DeskError, registration::Registration};

/// Accepted input formats for local wall-clock date-times
const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Opaque event identifier assigned by the directory store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    #[default]
    Talk,
    AcademicWeek,
    Workshop,
    Seminar,
    Conference,
    Other
}

impl Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Talk => "Talk",
            EventKind::AcademicWeek => "Academic Week",
            EventKind::Workshop => "Workshop",
            EventKind::Seminar => "Seminar",
            EventKind::Conference => "Conference",
            EventKind::Other => "Other"
        };
        f.write_str(label)
    }
}

/// Publication status of an event
///
/// Only [`EventStatus::OpenForRegistration`] admits new registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    #[default]
    Draft,
    OpenForRegistration,
    Closed,
    Cancelled
}

impl EventStatus {
    pub fn accepts_registrations(&self) -> bool {
        matches!(self, EventStatus::OpenForRegistration)
    }

    /// Publish/unpublish flip. Closed and cancelled events keep their status.
    pub fn toggled(self) -> Self {
        match self {
            EventStatus::Draft => EventStatus::OpenForRegistration,
            EventStatus::OpenForRegistration => EventStatus::Draft,
            other => other
        }
    }
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventStatus::Draft => "Draft",
            EventStatus::OpenForRegistration => "Open for registration",
            EventStatus::Closed => "Closed",
            EventStatus::Cancelled => "Cancelled"
        };
        f.write_str(label)
    }
}

/// Validated, admin-editable part of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title:        String,
    pub kind:         EventKind,
    pub description:  String,
    pub starts_at:    NaiveDateTime,
    pub ends_at:      NaiveDateTime,
    pub venue:        String,
    pub presenters:   String,
    pub department:   String,
    pub requirements: String,
    pub banner_url:   Option<String>,
    pub status:       EventStatus,
    pub capacity:     u32
}

/// A stored event with its registrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id:            EventId,
    #[serde(flatten)]
    pub details:       EventDetails,
    /// Registration order is insertion order
    pub registrations: Vec<Registration>
}

impl Event {
    pub fn new(id: EventId, details: EventDetails) -> Self {
        Self { id, details, registrations: Vec::new() }
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }

    pub fn status(&self) -> EventStatus {
        self.details.status
    }

    pub fn remaining_seats(&self) -> u32 {
        let taken = u32::try_from(self.registrations.len()).unwrap_or(u32::MAX);
        self.details.capacity.saturating_sub(taken)
    }

    pub fn is_full(&self) -> bool {
        self.remaining_seats() == 0
    }

    /// Appends a registration if the event is open and has a free seat.
    ///
    /// Returns the seats left after the append. Nothing is changed on error.
    pub fn admit(&mut self, registration: Registration) -> Result<u32, DeskError> {
        if !self.details.status.accepts_registrations() {
            return Err(DeskError::EventNotOpen(self.details.status));
        }
        if self.is_full() {
            return Err(DeskError::CapacityExceeded);
        }

        self.registrations.push(registration);
        Ok(self.remaining_seats())
    }

    pub fn toggle_status(&mut self) -> EventStatus {
        self.details.status = self.details.status.toggled();
        self.details.status
    }

    /// Overlays the present fields of `patch` and re-validates the whole event.
    ///
    /// The capacity may not drop below the number of registrations already taken.
    pub fn apply_patch(&mut self, patch: &EventPatch) -> Result<(), DeskError> {
        let details = EventDraft::from(&self.details).overlay(patch).validate()?;

        if (details.capacity as usize) < self.registrations.len() {
            return Err(DeskError::Validation(format!(
                "capacity {} is below the {} registration(s) already taken",
                details.capacity,
                self.registrations.len()
            )));
        }

        self.details = details;
        Ok(())
    }
}

/// Raw event form, every field optional until validated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title:        Option<String>,
    pub kind:         Option<EventKind>,
    pub description:  Option<String>,
    pub starts_at:    Option<NaiveDateTime>,
    pub ends_at:      Option<NaiveDateTime>,
    pub venue:        Option<String>,
    pub presenters:   Option<String>,
    pub department:   Option<String>,
    pub requirements: Option<String>,
    pub banner_url:   Option<String>,
    pub status:       Option<EventStatus>,
    /// Signed so that negative input reaches validation instead of the parser
    pub capacity:     Option<i64>
}

/// Partial update of an event: only the fields that are `Some` change
pub type EventPatch = EventDraft;

impl EventDraft {
    /// Fields set in `patch` win over the fields of `self`
    pub fn overlay(self, patch: &EventPatch) -> Self {
        Self {
            title:        patch.title.clone().or(self.title),
            kind:         patch.kind.or(self.kind),
            description:  patch.description.clone().or(self.description),
            starts_at:    patch.starts_at.or(self.starts_at),
            ends_at:      patch.ends_at.or(self.ends_at),
            venue:        patch.venue.clone().or(self.venue),
            presenters:   patch.presenters.clone().or(self.presenters),
            department:   patch.department.clone().or(self.department),
            requirements: patch.requirements.clone().or(self.requirements),
            banner_url:   patch.banner_url.clone().or(self.banner_url),
            status:       patch.status.or(self.status),
            capacity:     patch.capacity.or(self.capacity)
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == EventDraft::default()
    }

    pub fn validate(&self) -> Result<EventDetails, DeskError> {
        let mut missing = Vec::new();

        let title = required_text(&self.title, "title", &mut missing);
        let venue = required_text(&self.venue, "venue", &mut missing);
        if self.starts_at.is_none() {
            missing.push("start time");
        }
        if self.ends_at.is_none() {
            missing.push("end time");
        }
        if self.capacity.is_none() {
            missing.push("capacity");
        }

        let (Some(title), Some(venue), Some(starts_at), Some(ends_at), Some(capacity)) =
            (title, venue, self.starts_at, self.ends_at, self.capacity)
        else {
            return Err(DeskError::Validation(format!("please fill in the required field(s): {}", missing.join(", "))));
        };

        if capacity < 0 {
            return Err(DeskError::Validation(format!("capacity must not be negative (got {})", capacity)));
        }
        let capacity = u32::try_from(capacity)
            .map_err(|_| DeskError::Validation(format!("capacity {} is too large", capacity)))?;

        if ends_at < starts_at {
            return Err(DeskError::Validation("the end time must not precede the start time".to_string()));
        }

        Ok(EventDetails {
            title,
            kind: self.kind.unwrap_or_default(),
            description: optional_text(&self.description),
            starts_at,
            ends_at,
            venue,
            presenters: optional_text(&self.presenters),
            department: optional_text(&self.department),
            requirements: optional_text(&self.requirements),
            banner_url: self.banner_url.as_deref().map(str::trim).filter(|url| !url.is_empty()).map(str::to_string),
            status: self.status.unwrap_or_default(),
            capacity
        })
    }
}

impl From<&EventDetails> for EventDraft {
    fn from(details: &EventDetails) -> Self {
        Self {
            title:        Some(details.title.clone()),
            kind:         Some(details.kind),
            description:  Some(details.description.clone()),
            starts_at:    Some(details.starts_at),
            ends_at:      Some(details.ends_at),
            venue:        Some(details.venue.clone()),
            presenters:   Some(details.presenters.clone()),
            department:   Some(details.department.clone()),
            requirements: Some(details.requirements.clone()),
            banner_url:   details.banner_url.clone(),
            status:       Some(details.status),
            capacity:     Some(i64::from(details.capacity))
        }
    }
}

fn required_text(value: &Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            missing.push(field);
            None
        }
    }
}

fn optional_text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

/// Parses a local wall-clock date-time such as `2026-03-14T09:30`
pub fn parse_local_datetime(input: &str) -> Result<NaiveDateTime, String> {
    let input = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| format!("invalid date-time '{}', expected YYYY-MM-DDTHH:MM", input))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{identity::Identity, registration::RegistrationForm};

    pub(crate) fn draft(title: &str, capacity: i64) -> EventDraft {
        EventDraft {
            title: Some(title.to_string()),
            starts_at: Some(parse_local_datetime("2026-11-03T09:00").unwrap()),
            ends_at: Some(parse_local_datetime("2026-11-03T12:00").unwrap()),
            venue: Some("Auditorium B".to_string()),
            capacity: Some(capacity),
            ..EventDraft::default()
        }
    }

    pub(crate) fn open_event(capacity: i64) -> Event {
        let mut details = draft("Rust for Scientists", capacity).validate().unwrap();
        details.status = EventStatus::OpenForRegistration;
        Event::new(EventId::generate(), details)
    }

    pub(crate) fn registration(name: &str) -> Registration {
        RegistrationForm {
            full_name:  name.to_string(),
            email:      format!("{}@uni.example", name.to_lowercase()),
            student_id: "2024001".to_string(),
            course:     "Computer Science".to_string()
        }
        .into_registration(&Identity::anonymous())
        .unwrap()
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let err = EventDraft::default().validate().unwrap_err();
        match err {
            DeskError::Validation(message) => {
                for field in ["title", "venue", "start time", "end time", "capacity"] {
                    assert!(message.contains(field), "missing '{}' in '{}'", field, message);
                }
            }
            other => panic!("Expected Validation error, got {:?}", other)
        }
    }

    #[test]
    fn test_validate_rejects_negative_capacity() {
        let err = draft("Workshop", -1).validate().unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
    }

    #[test]
    fn test_validate_accepts_zero_capacity() {
        let details = draft("Full house", 0).validate().unwrap();
        assert_eq!(details.capacity, 0);
        assert_eq!(details.status, EventStatus::Draft);
        assert_eq!(details.kind, EventKind::Talk);
    }

    #[test]
    fn test_validate_rejects_blank_title_and_reversed_times() {
        let mut blank = draft("   ", 10);
        assert!(matches!(blank.validate(), Err(DeskError::Validation(_))));

        blank.title = Some("Seminar".to_string());
        blank.ends_at = Some(parse_local_datetime("2026-11-02T12:00").unwrap());
        assert!(matches!(blank.validate(), Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_validate_normalizes_blank_banner() {
        let mut form = draft("Conference", 50);
        form.banner_url = Some("  ".to_string());
        assert_eq!(form.validate().unwrap().banner_url, None);
    }

    #[test]
    fn test_admit_checks_status_before_capacity() {
        let mut event = open_event(0);
        event.details.status = EventStatus::Closed;

        let err = event.admit(registration("Ana")).unwrap_err();
        assert_eq!(err, DeskError::EventNotOpen(EventStatus::Closed));
        assert!(event.registrations.is_empty());
    }

    #[test]
    fn test_admit_until_full() {
        let mut event = open_event(2);

        assert_eq!(event.admit(registration("Ana")).unwrap(), 1);
        assert_eq!(event.admit(registration("Bruno")).unwrap(), 0);
        assert_eq!(event.admit(registration("Carla")).unwrap_err(), DeskError::CapacityExceeded);

        let names: Vec<_> = event.registrations.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Bruno"]);
    }

    #[test]
    fn test_toggle_is_an_involution_on_draft_and_open() {
        for start in [EventStatus::Draft, EventStatus::OpenForRegistration] {
            assert_eq!(start.toggled().toggled(), start);
            assert_ne!(start.toggled(), start);
        }
        for fixed in [EventStatus::Closed, EventStatus::Cancelled] {
            assert_eq!(fixed.toggled(), fixed);
        }
    }

    #[test]
    fn test_patch_cannot_shrink_capacity_below_registrations() {
        let mut event = open_event(3);
        event.admit(registration("Ana")).unwrap();
        event.admit(registration("Bruno")).unwrap();

        let patch = EventPatch { capacity: Some(1), ..EventPatch::default() };
        assert!(matches!(event.apply_patch(&patch), Err(DeskError::Validation(_))));
        assert_eq!(event.details.capacity, 3);

        let patch = EventPatch { capacity: Some(2), venue: Some("Lab 4".to_string()), ..EventPatch::default() };
        event.apply_patch(&patch).unwrap();
        assert_eq!(event.details.capacity, 2);
        assert_eq!(event.details.venue, "Lab 4");
        assert_eq!(event.details.title, "Rust for Scientists");
    }

    #[test]
    fn test_parse_local_datetime_formats() {
        assert!(parse_local_datetime("2026-03-14T09:30").is_ok());
        assert!(parse_local_datetime("2026-03-14 09:30:15").is_ok());
        assert!(parse_local_datetime("14/03/2026").is_err());
    }
}
