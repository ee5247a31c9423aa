//! Terminal rendering of command outcomes

use tabled::{Table, Tabled, settings::Style};

use crate::domain::{command::DeskOutcome, event::Event, registration::Registration};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id:     String,
    #[tabled(rename = "Title")]
    title:  String,
    #[tabled(rename = "Type")]
    kind:   String,
    #[tabled(rename = "Starts")]
    starts: String,
    #[tabled(rename = "Venue")]
    venue:  String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Seats")]
    seats:  String
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            id:     event.id.to_string(),
            title:  event.details.title.clone(),
            kind:   event.details.kind.to_string(),
            starts: event.details.starts_at.format(DATE_FORMAT).to_string(),
            venue:  event.details.venue.clone(),
            status: event.status().to_string(),
            seats:  format!("{}/{}", event.registrations.len(), event.details.capacity)
        }
    }
}

#[derive(Tabled)]
struct RegistrantRow {
    #[tabled(rename = "#")]
    position:      usize,
    #[tabled(rename = "Name")]
    full_name:     String,
    #[tabled(rename = "Email")]
    email:         String,
    #[tabled(rename = "Student ID")]
    student_id:    String,
    #[tabled(rename = "Course")]
    course:        String,
    #[tabled(rename = "Registered")]
    registered_at: String
}

pub fn events_table(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }

    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn registrants_table(registrations: &[Registration]) -> String {
    if registrations.is_empty() {
        return "Nobody has registered yet.".to_string();
    }

    let rows: Vec<RegistrantRow> = registrations
        .iter()
        .enumerate()
        .map(|(index, registration)| RegistrantRow {
            position:      index + 1,
            full_name:     registration.full_name.clone(),
            email:         registration.email.clone(),
            student_id:    registration.student_id.clone(),
            course:        registration.course.clone(),
            registered_at: registration.registered_at.format(DATE_FORMAT).to_string()
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Detail card of one event, optional fields only when set
pub fn event_detail(event: &Event) -> String {
    let details = &event.details;
    let mut lines = vec![
        format!("{} ({})", details.title, details.kind),
        format!("ID:          {}", event.id),
        format!("Status:      {}", details.status),
        format!(
            "When:        {} to {}",
            details.starts_at.format(DATE_FORMAT),
            details.ends_at.format(DATE_FORMAT)
        ),
        format!("Venue:       {}", details.venue),
        format!("Seats left:  {} of {}", event.remaining_seats(), details.capacity),
    ];

    let optional = [
        ("Presenters:  ", &details.presenters),
        ("Department:  ", &details.department),
        ("Requirements:", &details.requirements)
    ];
    for (label, value) in optional {
        if !value.trim().is_empty() {
            lines.push(format!("{} {}", label, value));
        }
    }
    if let Some(banner) = &details.banner_url {
        lines.push(format!("Banner:       {}", banner));
    }
    if !details.description.trim().is_empty() {
        lines.push(String::new());
        lines.push(details.description.clone());
    }

    lines.join("\n")
}

/// Body (if any) followed by the outcome's notice
pub fn outcome(outcome: &DeskOutcome) -> String {
    let body = match outcome {
        DeskOutcome::Events(events) => Some(events_table(events)),
        DeskOutcome::EventDetail(event) => Some(event_detail(event)),
        DeskOutcome::Registrants { registrations, .. } => Some(registrants_table(registrations)),
        _ => None
    };

    match body {
        Some(body) => format!("{}\n{}", body, outcome.notice()),
        None => outcome.notice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::tests::{open_event, registration};

    #[test]
    fn test_events_table_lists_every_event() {
        let mut first = open_event(10);
        first.details.title = "Rust meetup".to_string();
        let second = open_event(3);

        let table = events_table(&[first.clone(), second.clone()]);
        assert!(table.contains("Rust meetup"));
        assert!(table.contains(second.id.as_str()));
        assert!(table.contains("0/10"));
        assert_eq!(events_table(&[]), "No events found.");
    }

    #[test]
    fn test_detail_skips_empty_optional_fields() {
        let mut event = open_event(2);
        event.admit(registration("Ana")).unwrap();

        let detail = event_detail(&event);
        assert!(detail.contains("Seats left:  1 of 2"));
        assert!(!detail.contains("Presenters"));
        assert!(!detail.contains("Banner"));
    }

    #[test]
    fn test_outcome_ends_with_the_notice() {
        let mut event = open_event(2);
        event.admit(registration("Ana")).unwrap();
        let outcome = DeskOutcome::Registrants { event: event.clone(), registrations: event.registrations.clone() };

        let rendered = super::outcome(&outcome);
        assert!(rendered.contains("ana@uni.example"));
        assert!(rendered.ends_with(&outcome.notice()));

        let deleted = DeskOutcome::EventDeleted(event.id.clone());
        assert_eq!(super::outcome(&deleted), deleted.notice());
    }
}
