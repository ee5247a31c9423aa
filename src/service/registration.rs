//! Event registration service - the business rules over the directory store
//!
//! Every mutation goes through [`DirectoryStore::modify`], so checks such as
//! "is there a seat left" and the write that depends on them cannot be split by
//! a concurrent registration.

use std::sync::Arc;

use tracing::{Level, event};

use crate::{
    domain::{
        catalog::EventFilter,
        constant::registration,
        error::DeskError,
        event::{Event, EventDraft, EventId, EventPatch},
        identity::{Identity, require_admin, require_resolved},
        registration::{Registration, RegistrationForm}
    },
    port::store::DirectoryStore
};

/// Service for event and registration operations
#[derive(Clone)]
pub struct EventRegistrationService {
    store: Arc<dyn DirectoryStore>
}

impl EventRegistrationService {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    fn authorize<'a>(caller: Option<&'a Identity>, action: &str) -> Result<&'a str, DeskError> {
        match require_admin(caller) {
            Ok(admin) => Ok(admin.user_id),
            Err(e) => {
                event!(Level::WARN, event = registration::ACCESS_DENIED, action = action, caller = ?caller.map(Identity::id));
                Err(e)
            }
        }
    }

    /// Validate and persist a new event with no registrations
    pub async fn create_event(&self, caller: Option<&Identity>, draft: EventDraft) -> Result<Event, DeskError> {
        let admin = Self::authorize(caller, "create")?;
        let details = draft.validate()?;

        let id = self.store.create(details.clone()).await?;
        event!(Level::INFO, event = registration::EVENT_CREATED, event_id = %id, by = admin);
        Ok(Event::new(id, details))
    }

    /// Apply a partial update, rejecting a capacity below the seats already taken
    pub async fn update_event(&self, caller: Option<&Identity>, id: &EventId, patch: EventPatch) -> Result<Event, DeskError> {
        let admin = Self::authorize(caller, "update")?;

        let updated = self.store.modify(id, Box::new(move |event| event.apply_patch(&patch))).await?;
        event!(Level::INFO, event = registration::EVENT_UPDATED, event_id = %id, by = admin);
        Ok(updated)
    }

    pub async fn delete_event(&self, caller: Option<&Identity>, id: &EventId) -> Result<(), DeskError> {
        let admin = Self::authorize(caller, "delete")?;

        self.store.delete(id).await?;
        event!(Level::INFO, event = registration::EVENT_DELETED, event_id = %id, by = admin);
        Ok(())
    }

    /// Flip between open and draft. Closed and cancelled events come back unchanged.
    pub async fn toggle_event_status(&self, caller: Option<&Identity>, id: &EventId) -> Result<Event, DeskError> {
        let admin = Self::authorize(caller, "toggle")?;

        let toggled = self
            .store
            .modify(
                id,
                Box::new(|event| {
                    event.toggle_status();
                    Ok(())
                })
            )
            .await?;
        event!(Level::INFO, event = registration::STATUS_TOGGLED, event_id = %id, status = %toggled.status(), by = admin);
        Ok(toggled)
    }

    /// Register the caller's form for an event and return the seats left afterwards
    pub async fn register_participant(
        &self,
        caller: Option<&Identity>,
        event_id: &EventId,
        form: RegistrationForm
    ) -> Result<u32, DeskError> {
        let identity = require_resolved(caller)?;
        let entry = form.into_registration(identity)?;

        let result = self
            .store
            .modify(
                event_id,
                Box::new(move |event| {
                    event.admit(entry)?;
                    Ok(())
                })
            )
            .await;

        match result {
            Ok(event) => {
                let remaining = event.remaining_seats();
                event!(
                    Level::INFO,
                    event = registration::PARTICIPANT_REGISTERED,
                    event_id = %event_id,
                    remaining_seats = remaining,
                    by = identity.id()
                );
                Ok(remaining)
            }
            Err(e) => {
                event!(Level::DEBUG, event = registration::REGISTRATION_REJECTED, event_id = %event_id, error = %e);
                Err(e)
            }
        }
    }

    /// Events visible to the filter's audience, by start time then title
    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, DeskError> {
        let events = self.store.list().await?;
        Ok(filter.apply(&events))
    }

    pub async fn get_event(&self, id: &EventId) -> Result<Event, DeskError> {
        self.store.read(id).await
    }

    /// Participants of an event in registration order
    pub async fn registrants(&self, caller: Option<&Identity>, id: &EventId) -> Result<Vec<Registration>, DeskError> {
        Self::authorize(caller, "registrants")?;
        Ok(self.store.read(id).await?.registrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::storage::InMemoryDirectoryStore,
        domain::{
            catalog::Audience,
            event::{EventKind, EventStatus, tests::draft}
        }
    };

    fn admin() -> Identity {
        Identity::Authenticated { user_id: "staff-1".to_string(), email: "staff@uni.example".to_string() }
    }

    fn form(name: &str) -> RegistrationForm {
        RegistrationForm {
            full_name:  name.to_string(),
            email:      format!("{}@uni.example", name.to_lowercase()),
            student_id: "2024001".to_string(),
            course:     "Physics".to_string()
        }
    }

    fn service() -> EventRegistrationService {
        EventRegistrationService::new(Arc::new(InMemoryDirectoryStore::new()))
    }

    async fn open_event(service: &EventRegistrationService, title: &str, capacity: i64) -> Event {
        let admin = admin();
        let created = service.create_event(Some(&admin), draft(title, capacity)).await.unwrap();
        service.toggle_event_status(Some(&admin), &created.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_event_starts_as_draft_without_registrations() {
        let service = service();
        let admin = admin();

        let created = service.create_event(Some(&admin), draft("Welcome Week", 30)).await.unwrap();
        assert_eq!(created.status(), EventStatus::Draft);
        assert!(created.registrations.is_empty());
        assert_eq!(service.get_event(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_anonymous_and_unresolved_callers_cannot_mutate() {
        let service = service();
        let admin = admin();
        let anonymous = Identity::anonymous();
        let event = service.create_event(Some(&admin), draft("Guarded", 5)).await.unwrap();

        for caller in [Some(&anonymous), None] {
            assert!(matches!(
                service.create_event(caller, draft("Nope", 5)).await,
                Err(DeskError::Unauthorized(_))
            ));
            assert!(matches!(
                service.update_event(caller, &event.id, EventPatch { capacity: Some(1), ..EventPatch::default() }).await,
                Err(DeskError::Unauthorized(_))
            ));
            assert!(matches!(service.toggle_event_status(caller, &event.id).await, Err(DeskError::Unauthorized(_))));
            assert!(matches!(service.delete_event(caller, &event.id).await, Err(DeskError::Unauthorized(_))));
            assert!(matches!(service.registrants(caller, &event.id).await, Err(DeskError::Unauthorized(_))));
        }

        let all = service.list_events(&EventFilter::admin()).await.unwrap();
        assert_eq!(all, vec![event]);
    }

    #[tokio::test]
    async fn test_invalid_draft_leaves_the_store_unchanged() {
        let service = service();
        let admin = admin();

        assert!(matches!(service.create_event(Some(&admin), draft("Negative", -1)).await, Err(DeskError::Validation(_))));
        assert!(matches!(
            service.create_event(Some(&admin), EventDraft::default()).await,
            Err(DeskError::Validation(_))
        ));
        assert!(service.list_events(&EventFilter::admin()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_capacity_below_registrations() {
        let service = service();
        let admin = admin();
        let event = open_event(&service, "Crowded", 3).await;
        let visitor = Identity::anonymous();
        service.register_participant(Some(&visitor), &event.id, form("Ana")).await.unwrap();
        service.register_participant(Some(&visitor), &event.id, form("Bea")).await.unwrap();

        let shrink = EventPatch { capacity: Some(1), ..EventPatch::default() };
        assert!(matches!(service.update_event(Some(&admin), &event.id, shrink).await, Err(DeskError::Validation(_))));

        let widen = EventPatch { capacity: Some(10), venue: Some("Great Hall".to_string()), ..EventPatch::default() };
        let updated = service.update_event(Some(&admin), &event.id, widen).await.unwrap();
        assert_eq!(updated.details.capacity, 10);
        assert_eq!(updated.details.venue, "Great Hall");
        assert_eq!(updated.registrations.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let service = service();
        let admin = admin();
        let missing = EventId::from("missing");

        assert_eq!(service.get_event(&missing).await.unwrap_err(), DeskError::not_found(&missing));
        assert_eq!(service.delete_event(Some(&admin), &missing).await.unwrap_err(), DeskError::not_found(&missing));
        assert_eq!(
            service.toggle_event_status(Some(&admin), &missing).await.unwrap_err(),
            DeskError::not_found(&missing)
        );
        assert_eq!(
            service.register_participant(Some(&admin), &missing, form("Ana")).await.unwrap_err(),
            DeskError::not_found(&missing)
        );
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_status() {
        let service = service();
        let admin = admin();
        let event = service.create_event(Some(&admin), draft("Flip", 5)).await.unwrap();

        let opened = service.toggle_event_status(Some(&admin), &event.id).await.unwrap();
        assert_eq!(opened.status(), EventStatus::OpenForRegistration);
        let closed = service.toggle_event_status(Some(&admin), &event.id).await.unwrap();
        assert_eq!(closed.status(), EventStatus::Draft);
    }

    #[tokio::test]
    async fn test_toggle_leaves_closed_events_alone() {
        let service = service();
        let admin = admin();
        let mut closed = draft("Over", 5);
        closed.status = Some(EventStatus::Closed);
        let event = service.create_event(Some(&admin), closed).await.unwrap();

        let toggled = service.toggle_event_status(Some(&admin), &event.id).await.unwrap();
        assert_eq!(toggled.status(), EventStatus::Closed);
    }

    #[tokio::test]
    async fn test_registration_rules() {
        let service = service();
        let admin = admin();
        let visitor = Identity::anonymous();

        let draft_event = service.create_event(Some(&admin), draft("Not yet", 5)).await.unwrap();
        assert_eq!(
            service.register_participant(Some(&visitor), &draft_event.id, form("Ana")).await.unwrap_err(),
            DeskError::EventNotOpen(EventStatus::Draft)
        );

        let event = open_event(&service, "Small room", 1).await;
        assert!(matches!(
            service.register_participant(None, &event.id, form("Ana")).await,
            Err(DeskError::Unauthorized(_))
        ));
        assert!(matches!(
            service.register_participant(Some(&visitor), &event.id, RegistrationForm::default()).await,
            Err(DeskError::Validation(_))
        ));

        assert_eq!(service.register_participant(Some(&visitor), &event.id, form("Ana")).await.unwrap(), 0);
        assert_eq!(
            service.register_participant(Some(&visitor), &event.id, form("Bea")).await.unwrap_err(),
            DeskError::CapacityExceeded
        );

        let registrants = service.registrants(Some(&admin), &event.id).await.unwrap();
        assert_eq!(registrants.len(), 1);
        assert_eq!(registrants[0].full_name, "Ana");
        assert_eq!(registrants[0].submitted_by, visitor.id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_seat_goes_to_exactly_one_caller() {
        let service = service();
        let event = open_event(&service, "Last seat", 1).await;

        let handles: Vec<_> = ["Ana", "Bea"]
            .into_iter()
            .map(|name| {
                let service = service.clone();
                let id = event.id.clone();
                tokio::spawn(async move {
                    let visitor = Identity::anonymous();
                    service.register_participant(Some(&visitor), &id, form(name)).await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|result| **result == Ok(0)).count(), 1);
        assert_eq!(results.iter().filter(|result| **result == Err(DeskError::CapacityExceeded)).count(), 1);
        assert_eq!(service.get_event(&event.id).await.unwrap().registrations.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_fill_exactly_to_capacity() {
        let service = service();
        let event = open_event(&service, "Popular", 7).await;

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let service = service.clone();
                let id = event.id.clone();
                tokio::spawn(async move {
                    let visitor = Identity::anonymous();
                    service.register_participant(Some(&visitor), &id, form(&format!("Guest{}", i))).await
                })
            })
            .collect();

        let mut confirmed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                confirmed += 1;
            }
        }

        let stored = service.get_event(&event.id).await.unwrap();
        assert_eq!(confirmed, 7);
        assert_eq!(stored.registrations.len(), 7);
        assert!(stored.is_full());
    }

    #[tokio::test]
    async fn test_list_events_filters_and_orders() {
        let service = service();
        let admin = admin();

        let mut later = draft("Zeta workshop", 5);
        later.starts_at = Some(crate::domain::event::parse_local_datetime("2026-12-01T09:00").unwrap());
        later.ends_at = Some(crate::domain::event::parse_local_datetime("2026-12-01T10:00").unwrap());
        later.kind = Some(EventKind::Workshop);
        let later = service.create_event(Some(&admin), later).await.unwrap();
        service.toggle_event_status(Some(&admin), &later.id).await.unwrap();

        open_event(&service, "Beta talk", 5).await;
        open_event(&service, "Alpha talk", 5).await;
        service.create_event(Some(&admin), draft("Hidden draft", 5)).await.unwrap();

        let public = service.list_events(&EventFilter::default()).await.unwrap();
        let titles: Vec<_> = public.iter().map(Event::title).collect();
        assert_eq!(titles, vec!["Alpha talk", "Beta talk", "Zeta workshop"]);

        let all = service.list_events(&EventFilter::admin()).await.unwrap();
        assert_eq!(all.len(), 4);

        let filter = EventFilter { search: Some("TALK".to_string()), kind: None, audience: Audience::Participant };
        assert_eq!(service.list_events(&filter).await.unwrap().len(), 2);

        let filter = EventFilter { search: None, kind: Some(EventKind::Workshop), audience: Audience::Admin };
        assert_eq!(service.list_events(&filter).await.unwrap().len(), 1);
    }
}
