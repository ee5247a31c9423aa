//! # Event Desk
//!
//! A library for running a university event directory with participant registration.
//!
//! This crate provides functionality to:
//! - Create, edit, open and close events (administrators)
//! - Register participants with a capacity that is never exceeded, even under concurrent sign-ups
//! - Keep each session's catalog in sync with the directory store through change notifications
//! - Sign in anonymously, through a configured provider, or with email and password

use std::sync::Arc;

pub mod actor;
pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod port;
pub mod service;

use adapter::{identity::LocalIdentityProvider, storage::DirectoryStoreFactory, storage::StoreType};
pub use config::Config;
use domain::error::DeskError;
use port::{identity::IdentityProvider, store::DirectoryStore};
use service::EventRegistrationService;

/// Shared services every session works against
pub struct AppContext {
    pub config:   Config,
    pub store:    Arc<dyn DirectoryStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub service:  EventRegistrationService
}

impl AppContext {
    pub fn new(config: Config, store: Arc<dyn DirectoryStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let service = EventRegistrationService::new(store.clone());
        Self { config, store, identity, service }
    }

    /// Opens the configured backends and resolves an identity for the session
    ///
    /// The in-memory backend keeps identities in memory too, so nothing is written to disk.
    pub async fn init(config: Config) -> Result<Self, DeskError> {
        let (store, identity): (Arc<dyn DirectoryStore>, Arc<dyn IdentityProvider>) = match config.store {
            StoreType::InMemory => (
                DirectoryStoreFactory::create(StoreType::InMemory, None)?,
                Arc::new(LocalIdentityProvider::in_memory(config.identity_providers.clone()))
            ),
            StoreType::RocksDb => {
                let store_path = config.store_path()?;
                std::fs::create_dir_all(&store_path)?;
                (
                    DirectoryStoreFactory::create(StoreType::RocksDb, Some(&store_path))?,
                    Arc::new(LocalIdentityProvider::open(&config.identity_path()?, config.identity_providers.clone())?)
                )
            }
        };

        identity.bootstrap().await?;
        Ok(Self::new(config, store, identity))
    }
}
