//! Session view state
//!
//! The view a session is looking at is one explicit variant, so combinations
//! such as "editing while the detail modal is open" cannot be represented.

use crate::domain::{
    catalog::{Catalog, EventFilter},
    command::{DeskCommand, DeskOutcome},
    error::DeskError,
    event::{Event, EventDraft, EventId}
};

/// Form being edited: a new event when `target` is `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Editor {
    pub target: Option<EventId>,
    pub draft:  EventDraft
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Event list with the filter that produced it
    Listing(EventFilter),
    /// Create/edit form kept open after a failed save
    Editing(Editor),
    /// Detail and registration view of one event
    Detail(Event),
    /// Participants registered for one event
    RegistrantsView(Event)
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Listing(EventFilter::default())
    }
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Listing(_) => "listing",
            ViewState::Editing(_) => "editing",
            ViewState::Detail(_) => "detail",
            ViewState::RegistrantsView(_) => "registrants"
        }
    }

    /// Next view after `command` finished with `result`
    ///
    /// Failures keep the user where the action was taken: a rejected save keeps the
    /// form and its draft, a rejected registration keeps the event detail.
    pub fn after(&self, command: &DeskCommand, result: &Result<DeskOutcome, DeskError>, catalog: &Catalog) -> Self {
        match (command, result) {
            (DeskCommand::ListEvents(cmd), Ok(_)) => ViewState::Listing(cmd.filter.clone()),
            (_, Ok(DeskOutcome::EventDetail(event))) => ViewState::Detail(event.clone()),
            (_, Ok(DeskOutcome::Registrants { event, .. })) => ViewState::RegistrantsView(event.clone()),
            (
                DeskCommand::CreateEvent(_)
                | DeskCommand::UpdateEvent(_)
                | DeskCommand::DeleteEvent(_)
                | DeskCommand::ToggleEventStatus(_)
                | DeskCommand::RegisterParticipant(_),
                Ok(_)
            ) => ViewState::Listing(self.listing_filter()),
            (DeskCommand::CreateEvent(cmd), Err(_)) => {
                ViewState::Editing(Editor { target: None, draft: cmd.draft.clone() })
            }
            (DeskCommand::UpdateEvent(cmd), Err(_)) => {
                ViewState::Editing(Editor { target: Some(cmd.id.clone()), draft: cmd.patch.clone() })
            }
            (DeskCommand::RegisterParticipant(cmd), Err(_)) => match catalog.find(&cmd.event_id) {
                Some(event) => ViewState::Detail(event.clone()),
                None => self.clone()
            },
            _ => self.clone()
        }
    }

    /// Re-reads the event held by the view from a freshly replaced catalog.
    ///
    /// Falls back to the listing when that event no longer exists.
    pub fn refreshed(&self, catalog: &Catalog) -> Self {
        match self {
            ViewState::Detail(event) => match catalog.find(&event.id) {
                Some(current) => ViewState::Detail(current.clone()),
                None => ViewState::default()
            },
            ViewState::RegistrantsView(event) => match catalog.find(&event.id) {
                Some(current) => ViewState::RegistrantsView(current.clone()),
                None => ViewState::Listing(EventFilter::admin())
            },
            other => other.clone()
        }
    }

    fn listing_filter(&self) -> EventFilter {
        match self {
            ViewState::Listing(filter) => filter.clone(),
            ViewState::Editing(_) | ViewState::RegistrantsView(_) => EventFilter::admin(),
            ViewState::Detail(_) => EventFilter::default()
        }
    }
}
