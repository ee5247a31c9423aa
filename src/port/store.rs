use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{
    catalog::CatalogSnapshot,
    error::DeskError,
    event::{Event, EventDetails, EventId, EventPatch}
};

/// Read-modify-write step applied to a single stored event
///
/// Returning an error aborts the update and leaves the stored event untouched.
pub type Mutation = Box<dyn FnOnce(&mut Event) -> Result<(), DeskError> + Send>;

/// Port for the durable event collection
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Persist a new event with no registrations and return its assigned id
    async fn create(&self, details: EventDetails) -> Result<EventId, DeskError>;

    /// Read a single event, `NotFound` if the id is unknown
    async fn read(&self, id: &EventId) -> Result<Event, DeskError>;

    /// Every stored event, in no particular order
    async fn list(&self) -> Result<Vec<Event>, DeskError>;

    /// Delete an event, `NotFound` if the id is unknown
    async fn delete(&self, id: &EventId) -> Result<(), DeskError>;

    /// Atomic conditional update of one event
    ///
    /// The read, the mutation and the write happen under the store's write guard:
    /// no other write to the same event can interleave. Returns the event as
    /// written.
    async fn modify(&self, id: &EventId, mutation: Mutation) -> Result<Event, DeskError>;

    /// Subscribe to change notifications carrying the full collection
    fn subscribe(&self) -> Subscription;

    /// Apply the present fields of `patch`, `NotFound` if the id is unknown
    async fn update(&self, id: &EventId, patch: EventPatch) -> Result<(), DeskError> {
        self.modify(id, Box::new(move |event| event.apply_patch(&patch))).await.map(|_| ())
    }
}

/// Live view of the store's change feed
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`]) ends it.
pub struct Subscription {
    receiver: watch::Receiver<CatalogSnapshot>
}

impl Subscription {
    pub fn new(receiver: watch::Receiver<CatalogSnapshot>) -> Self {
        Self { receiver }
    }

    /// The most recent snapshot, without waiting
    pub fn current(&self) -> CatalogSnapshot {
        self.receiver.borrow().clone()
    }

    /// Waits for the next change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<CatalogSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}
