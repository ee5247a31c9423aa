//! Catalog snapshots, the cached projection built from them, and listing filters

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::event::{Event, EventId, EventKind};

/// Full event collection as delivered by a change notification
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Increases by one with every change the store applies
    pub revision: u64,
    pub events:   Arc<Vec<Event>>
}

impl CatalogSnapshot {
    pub fn new(revision: u64, events: Vec<Event>) -> Self {
        Self { revision, events: Arc::new(events) }
    }
}

/// Locally cached, read-only projection of the directory store
///
/// The projection is only ever replaced wholesale by a newer snapshot, never
/// patched field by field.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    snapshot: Option<CatalogSnapshot>
}

impl Catalog {
    pub fn is_primed(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn revision(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|snapshot| snapshot.revision)
    }

    /// Replaces the projection. Snapshots older than the current one are ignored.
    pub fn replace(&mut self, snapshot: CatalogSnapshot) -> bool {
        if self.revision().is_some_and(|current| snapshot.revision < current) {
            return false;
        }
        self.snapshot = Some(snapshot);
        true
    }

    pub fn events(&self) -> &[Event] {
        self.snapshot.as_ref().map(|snapshot| snapshot.events.as_slice()).unwrap_or_default()
    }

    pub fn find(&self, id: &EventId) -> Option<&Event> {
        self.events().iter().find(|event| &event.id == id)
    }
}

impl From<CatalogSnapshot> for Catalog {
    fn from(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot: Some(snapshot) }
    }
}

/// Who the listing is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Audience {
    /// Back office: every status
    Admin,
    /// Front office: only events open for registration
    #[default]
    Participant
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Case-insensitive substring of the title
    pub search:   Option<String>,
    pub kind:     Option<EventKind>,
    pub audience: Audience
}

impl EventFilter {
    pub fn admin() -> Self {
        Self { audience: Audience::Admin, ..Self::default() }
    }

    pub fn matches(&self, event: &Event) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => event.title().to_lowercase().contains(&term.to_lowercase()),
            _ => true
        };
        let matches_kind = self.kind.is_none_or(|kind| event.details.kind == kind);
        let matches_audience = match self.audience {
            Audience::Admin => true,
            Audience::Participant => event.status().accepts_registrations()
        };

        matches_search && matches_kind && matches_audience
    }

    /// Matching events ordered by start time, then title
    pub fn apply<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Vec<Event> {
        let mut selected: Vec<Event> = events.into_iter().filter(|event| self.matches(event)).cloned().collect();
        selected.sort_by(|a, b| {
            a.details.starts_at.cmp(&b.details.starts_at).then_with(|| a.details.title.cmp(&b.details.title))
        });
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{EventStatus, tests::open_event};

    fn sample() -> Vec<Event> {
        let mut talk = open_event(10);
        talk.details.title = "Intro to Rust".to_string();

        let mut workshop = open_event(5);
        workshop.details.title = "Rust Async Workshop".to_string();
        workshop.details.kind = EventKind::Workshop;

        let mut draft = open_event(5);
        draft.details.title = "Hidden rust draft".to_string();
        draft.details.status = EventStatus::Draft;

        vec![talk, workshop, draft]
    }

    #[test]
    fn test_participant_listing_hides_unpublished_events() {
        let events = sample();
        let listed = EventFilter::default().apply(&events);
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|event| event.status() == EventStatus::OpenForRegistration));
    }

    #[test]
    fn test_admin_search_is_case_insensitive_and_kind_filtered() {
        let events = sample();

        let filter = EventFilter { search: Some("RUST".to_string()), ..EventFilter::admin() };
        assert_eq!(filter.apply(&events).len(), 3);

        let filter = EventFilter { kind: Some(EventKind::Workshop), ..EventFilter::admin() };
        let listed = filter.apply(&events);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title(), "Rust Async Workshop");
    }

    #[test]
    fn test_catalog_is_replaced_wholesale_and_ignores_stale_snapshots() {
        let events = sample();
        let mut catalog = Catalog::default();
        assert!(!catalog.is_primed());

        assert!(catalog.replace(CatalogSnapshot::new(2, events.clone())));
        assert_eq!(catalog.events().len(), 3);
        assert!(catalog.find(&events[1].id).is_some());

        assert!(!catalog.replace(CatalogSnapshot::new(1, Vec::new())));
        assert_eq!(catalog.events().len(), 3);

        assert!(catalog.replace(CatalogSnapshot::new(3, vec![events[0].clone()])));
        assert_eq!(catalog.events().len(), 1);
        assert!(catalog.find(&events[1].id).is_none());
    }
}
