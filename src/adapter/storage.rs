//! Directory store implementations
//!
//! This module provides both in-memory and persistent (RocksDB) implementations
//! of the DirectoryStore trait. Both publish a full catalog snapshot on a watch
//! channel after every write, while still holding their write guard, so
//! subscribers observe changes in the order they were applied.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc
};

use async_trait::async_trait;
use rocksdb::{DB, Direction, IteratorMode, Options};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{Level, event};

use crate::{
    domain::{
        catalog::CatalogSnapshot,
        constant::directory_store,
        error::DeskError,
        event::{Event, EventDetails, EventId}
    },
    port::store::{DirectoryStore, Mutation, Subscription}
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
pub enum StoreType {
    #[serde(rename = "inmemory")]
    #[value(name = "inmemory")]
    InMemory,
    #[serde(rename = "rocksdb")]
    #[value(name = "rocksdb")]
    RocksDb
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::InMemory => "inmemory",
            StoreType::RocksDb => "rocksdb"
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events plus the revision of the last applied change
#[derive(Debug, Default)]
struct Directory {
    events:   HashMap<EventId, Event>,
    revision: u64
}

impl Directory {
    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(self.revision, self.events.values().cloned().collect())
    }
}

/// In-memory directory store implementation
/// Suitable for development and testing, but not for production
/// as data is lost when the application restarts.
#[derive(Debug)]
pub struct InMemoryDirectoryStore {
    directory: Arc<RwLock<Directory>>,
    changes:   watch::Sender<CatalogSnapshot>
}

impl Default for InMemoryDirectoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectoryStore {
    /// Create a new in-memory directory store
    pub fn new() -> Self {
        let (changes, _) = watch::channel(CatalogSnapshot::default());
        Self { directory: Arc::new(RwLock::new(Directory::default())), changes }
    }

    /// Bump the revision and publish the full collection. Call with the write guard held.
    fn publish(&self, directory: &mut Directory) {
        directory.revision += 1;
        self.changes.send_replace(directory.snapshot());
        event!(Level::TRACE, event = directory_store::CHANGE_PUBLISHED, revision = directory.revision);
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn create(&self, details: EventDetails) -> Result<EventId, DeskError> {
        let id = EventId::generate();

        let mut directory = self.directory.write().await;
        directory.events.insert(id.clone(), Event::new(id.clone(), details));
        self.publish(&mut directory);

        event!(Level::DEBUG, event = directory_store::EVENT_CREATED, event_id = %id);
        Ok(id)
    }

    async fn read(&self, id: &EventId) -> Result<Event, DeskError> {
        let directory = self.directory.read().await;
        directory.events.get(id).cloned().ok_or_else(|| DeskError::not_found(id))
    }

    async fn list(&self) -> Result<Vec<Event>, DeskError> {
        let directory = self.directory.read().await;
        Ok(directory.events.values().cloned().collect())
    }

    async fn delete(&self, id: &EventId) -> Result<(), DeskError> {
        let mut directory = self.directory.write().await;
        if directory.events.remove(id).is_none() {
            return Err(DeskError::not_found(id));
        }
        self.publish(&mut directory);

        event!(Level::DEBUG, event = directory_store::EVENT_DELETED, event_id = %id);
        Ok(())
    }

    async fn modify(&self, id: &EventId, mutation: Mutation) -> Result<Event, DeskError> {
        let mut directory = self.directory.write().await;

        let stored = directory.events.get_mut(id).ok_or_else(|| DeskError::not_found(id))?;
        let mut candidate = stored.clone();
        if let Err(e) = mutation(&mut candidate) {
            event!(Level::DEBUG, event = directory_store::MODIFY_REJECTED, event_id = %id, error = %e);
            return Err(e);
        }
        *stored = candidate.clone();
        self.publish(&mut directory);

        event!(Level::DEBUG, event = directory_store::EVENT_MODIFIED, event_id = %id);
        Ok(candidate)
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.changes.subscribe())
    }
}

const EVENT_PREFIX: &str = "event:";

fn event_key(id: &EventId) -> String {
    format!("{}{}", EVENT_PREFIX, id)
}

fn read_event(db: &DB, id: &EventId) -> Result<Option<Event>, DeskError> {
    match db.get(event_key(id).as_bytes())? {
        Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
        None => Ok(None)
    }
}

fn write_event(db: &DB, event: &Event) -> Result<(), DeskError> {
    db.put(event_key(&event.id).as_bytes(), serde_json::to_vec(event)?)?;
    Ok(())
}

fn scan_events(db: &DB) -> Result<Vec<Event>, DeskError> {
    let mut events = Vec::new();
    let iter = db.iterator(IteratorMode::From(EVENT_PREFIX.as_bytes(), Direction::Forward));

    for item in iter {
        let (key, value) = item?;
        if !key.starts_with(EVENT_PREFIX.as_bytes()) {
            break;
        }
        events.push(serde_json::from_slice(&value)?);
    }

    Ok(events)
}

async fn blocking<T, F>(task: F) -> Result<T, DeskError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DeskError> + Send + 'static
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| DeskError::Backend(format!("storage task failed: {}", e)))?
}

/// RocksDB-based directory store implementation
/// Provides persistent storage for events across application restarts.
///
/// Storage layout:
/// - `event:{event_id}` -> Event (JSON, registrations included)
///
/// Writes are serialized by an async mutex that also holds the change revision;
/// reads go straight to RocksDB.
pub struct RocksDbDirectoryStore {
    db:         Arc<DB>,
    write_lock: Mutex<u64>,
    changes:    watch::Sender<CatalogSnapshot>
}

impl RocksDbDirectoryStore {
    /// Opens (or creates) a database at `path` owned by this store
    pub fn open(path: &Path) -> Result<Self, DeskError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        let db = DB::open(&opts, path)?;
        Self::from_db(Arc::new(db))
    }

    /// Creates a store from an existing DB instance
    fn from_db(db: Arc<DB>) -> Result<Self, DeskError> {
        let events = scan_events(&db)?;
        event!(Level::DEBUG, event = directory_store::STORE_OPENED, backend = "rocksdb", events = events.len());

        let (changes, _) = watch::channel(CatalogSnapshot::new(0, events));
        Ok(Self { db, write_lock: Mutex::new(0), changes })
    }

    fn publish(&self, revision: &mut u64, events: Vec<Event>) {
        *revision += 1;
        self.changes.send_replace(CatalogSnapshot::new(*revision, events));
        event!(Level::TRACE, event = directory_store::CHANGE_PUBLISHED, revision = *revision);
    }
}

#[async_trait]
impl DirectoryStore for RocksDbDirectoryStore {
    async fn create(&self, details: EventDetails) -> Result<EventId, DeskError> {
        let id = EventId::generate();
        let event = Event::new(id.clone(), details);

        let mut revision = self.write_lock.lock().await;
        let db = self.db.clone();
        let events = blocking(move || {
            write_event(&db, &event)?;
            scan_events(&db)
        })
        .await?;
        self.publish(&mut revision, events);

        event!(Level::DEBUG, event = directory_store::EVENT_CREATED, event_id = %id);
        Ok(id)
    }

    async fn read(&self, id: &EventId) -> Result<Event, DeskError> {
        let db = self.db.clone();
        let key = id.clone();
        blocking(move || read_event(&db, &key)).await?.ok_or_else(|| DeskError::not_found(id))
    }

    async fn list(&self) -> Result<Vec<Event>, DeskError> {
        let db = self.db.clone();
        blocking(move || scan_events(&db)).await
    }

    async fn delete(&self, id: &EventId) -> Result<(), DeskError> {
        let mut revision = self.write_lock.lock().await;
        let db = self.db.clone();
        let key = id.clone();
        let events = blocking(move || {
            if read_event(&db, &key)?.is_none() {
                return Err(DeskError::not_found(&key));
            }
            db.delete(event_key(&key).as_bytes())?;
            scan_events(&db)
        })
        .await?;
        self.publish(&mut revision, events);

        event!(Level::DEBUG, event = directory_store::EVENT_DELETED, event_id = %id);
        Ok(())
    }

    async fn modify(&self, id: &EventId, mutation: Mutation) -> Result<Event, DeskError> {
        let mut revision = self.write_lock.lock().await;
        let db = self.db.clone();
        let key = id.clone();
        let result = blocking(move || {
            let mut event = read_event(&db, &key)?.ok_or_else(|| DeskError::not_found(&key))?;
            mutation(&mut event)?;
            write_event(&db, &event)?;
            Ok((event, scan_events(&db)?))
        })
        .await;

        match result {
            Ok((event, events)) => {
                self.publish(&mut revision, events);
                event!(Level::DEBUG, event = directory_store::EVENT_MODIFIED, event_id = %id);
                Ok(event)
            }
            Err(e) => {
                event!(Level::DEBUG, event = directory_store::MODIFY_REJECTED, event_id = %id, error = %e);
                Err(e)
            }
        }
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.changes.subscribe())
    }
}

/// Process-wide RocksDB store and the path it was opened at
///
/// The store is shared as a whole so that every caller goes through the same write guard.
static ROCKSDB_STORE: once_cell::sync::OnceCell<(PathBuf, Arc<RocksDbDirectoryStore>)> =
    once_cell::sync::OnceCell::new();

/// Factory for creating directory stores based on configuration
pub struct DirectoryStoreFactory;

impl DirectoryStoreFactory {
    /// Creates a directory store, opening the shared RocksDB store on first use
    pub fn create(store_type: StoreType, db_path: Option<&Path>) -> Result<Arc<dyn DirectoryStore>, DeskError> {
        match store_type {
            StoreType::InMemory => Ok(Arc::new(InMemoryDirectoryStore::new())),
            StoreType::RocksDb => {
                let path = db_path.ok_or_else(|| {
                    DeskError::Configuration("the rocksdb backend needs a data directory".to_string())
                })?;

                let (opened_at, store) = ROCKSDB_STORE.get_or_try_init(|| -> Result<_, DeskError> {
                    Ok((path.to_path_buf(), Arc::new(RocksDbDirectoryStore::open(path)?)))
                })?;
                if opened_at.as_path() != path {
                    return Err(DeskError::Configuration(format!(
                        "the rocksdb store is already open at {}",
                        opened_at.display()
                    )));
                }

                let store: Arc<dyn DirectoryStore> = store.clone();
                Ok(store)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{
        EventPatch, EventStatus,
        tests::{draft, registration}
    };

    fn details(title: &str, capacity: i64) -> EventDetails {
        let mut details = draft(title, capacity).validate().unwrap();
        details.status = EventStatus::OpenForRegistration;
        details
    }

    fn admit_one(name: &'static str) -> Mutation {
        Box::new(move |event| event.admit(registration(name)).map(|_| ()))
    }

    async fn exercise_crud(store: &dyn DirectoryStore) {
        let id = store.create(details("Compilers 101", 2)).await.unwrap();
        let stored = store.read(&id).await.unwrap();
        assert_eq!(stored.title(), "Compilers 101");
        assert!(stored.registrations.is_empty());

        store.update(&id, EventPatch { venue: Some("Room 12".to_string()), ..EventPatch::default() }).await.unwrap();
        assert_eq!(store.read(&id).await.unwrap().details.venue, "Room 12");

        let updated = store.modify(&id, admit_one("Ana")).await.unwrap();
        assert_eq!(updated.remaining_seats(), 1);
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.delete(&id).await.unwrap();
        assert_eq!(store.read(&id).await.unwrap_err(), DeskError::not_found(&id));
        assert_eq!(store.delete(&id).await.unwrap_err(), DeskError::not_found(&id));
        assert!(matches!(store.update(&id, EventPatch::default()).await, Err(DeskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_inmemory_crud() {
        exercise_crud(&InMemoryDirectoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_rocksdb_crud() {
        let dir = tempfile::tempdir().unwrap();
        exercise_crud(&RocksDbDirectoryStore::open(dir.path()).unwrap()).await;
    }

    #[tokio::test]
    async fn test_rejected_mutation_writes_nothing() {
        let store = InMemoryDirectoryStore::new();
        let id = store.create(details("Full", 0)).await.unwrap();
        let revision = store.subscribe().current().revision;

        let mutation: Mutation = Box::new(|event| {
            event.details.title = "Renamed".to_string();
            event.admit(registration("Ana")).map(|_| ())
        });
        assert_eq!(store.modify(&id, mutation).await.unwrap_err(), DeskError::CapacityExceeded);

        let stored = store.read(&id).await.unwrap();
        assert_eq!(stored.title(), "Full");
        assert!(stored.registrations.is_empty());
        assert_eq!(store.subscribe().current().revision, revision);
    }

    #[tokio::test]
    async fn test_subscription_delivers_full_collection() {
        let store = InMemoryDirectoryStore::new();
        let mut subscription = store.subscribe();
        assert!(subscription.current().events.is_empty());

        let first = store.create(details("One", 5)).await.unwrap();
        let snapshot = subscription.changed().await.unwrap();
        assert_eq!(snapshot.events.len(), 1);

        store.create(details("Two", 5)).await.unwrap();
        store.modify(&first, admit_one("Ana")).await.unwrap();
        let snapshot = subscription.changed().await.unwrap();
        assert_eq!(snapshot.revision, 3);
        assert_eq!(snapshot.events.len(), 2);
        let one = snapshot.events.iter().find(|event| event.id == first).unwrap();
        assert_eq!(one.registrations.len(), 1);

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let id = {
            let store = RocksDbDirectoryStore::open(dir.path()).unwrap();
            let id = store.create(details("Persistent", 3)).await.unwrap();
            store.modify(&id, admit_one("Ana")).await.unwrap();
            id
        };

        let store = RocksDbDirectoryStore::open(dir.path()).unwrap();
        assert_eq!(store.subscribe().current().events.len(), 1);
        let stored = store.read(&id).await.unwrap();
        assert_eq!(stored.registrations.len(), 1);
        assert_eq!(stored.registrations[0].full_name, "Ana");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_modify_never_overbooks() {
        let dir = tempfile::tempdir().unwrap();
        let stores: Vec<Arc<dyn DirectoryStore>> =
            vec![Arc::new(InMemoryDirectoryStore::new()), Arc::new(RocksDbDirectoryStore::open(dir.path()).unwrap())];

        for store in stores {
            let id = store.create(details("Popular", 5)).await.unwrap();

            let handles: Vec<_> = (0..20)
                .map(|_| {
                    let store = store.clone();
                    let id = id.clone();
                    tokio::spawn(async move { store.modify(&id, admit_one("Guest")).await })
                })
                .collect();

            let mut admitted = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => admitted += 1,
                    Err(e) => assert_eq!(e, DeskError::CapacityExceeded)
                }
            }

            assert_eq!(admitted, 5);
            assert_eq!(store.read(&id).await.unwrap().registrations.len(), 5);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_factory_shares_one_rocksdb_store() {
        let dir = tempfile::tempdir().unwrap();
        let first = DirectoryStoreFactory::create(StoreType::RocksDb, Some(dir.path())).unwrap();
        let second = DirectoryStoreFactory::create(StoreType::RocksDb, Some(dir.path())).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = tempfile::tempdir().unwrap();
        let err = DirectoryStoreFactory::create(StoreType::RocksDb, Some(other.path())).err().unwrap();
        assert!(matches!(err, DeskError::Configuration(_)));

        let id = first.create(details("Shared", 3)).await.unwrap();
        let handles: Vec<_> = (0..20)
            .map(|n| {
                let store = if n % 2 == 0 { first.clone() } else { second.clone() };
                let id = id.clone();
                tokio::spawn(async move { store.modify(&id, admit_one("Guest")).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(e) => assert_eq!(e, DeskError::CapacityExceeded)
            }
        }

        assert_eq!(admitted, 3);
        assert_eq!(second.read(&id).await.unwrap().registrations.len(), 3);
    }
}
