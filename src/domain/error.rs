use thiserror::Error;

use crate::domain::event::EventStatus;

/// Common error types for the event desk
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    /// A required field is missing or a value is out of range
    #[error("{0}")]
    Validation(String),

    /// A mutating action was attempted by an anonymous or unresolved caller
    #[error("{0}")]
    Unauthorized(String),

    /// The referenced event does not exist
    #[error("event {0} not found")]
    NotFound(String),

    /// The event does not accept registrations in its current status
    #[error("registrations are not open for this event (status: {0})")]
    EventNotOpen(EventStatus),

    /// Every seat of the event is taken
    #[error("sorry, there are no seats left for this event")]
    CapacityExceeded,

    /// Directory store or identity provider failure, message passed through unmodified
    #[error("{0}")]
    Backend(String),

    /// Configuration related errors
    #[error("{0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("{0}")]
    Serialization(String),

    /// User interaction errors
    #[error("{0}")]
    UserInteraction(String),

    /// Spawn errors
    #[error("{0}")]
    Spawn(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String)
}

impl DeskError {
    pub fn not_found(id: impl ToString) -> Self {
        DeskError::NotFound(id.to_string())
    }
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for DeskError {
    fn from(err: anyhow::Error) -> Self {
        DeskError::Configuration(format!("{:#}", err))
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::Backend(err.to_string())
    }
}

/// Convert from rocksdb::Error
impl From<rocksdb::Error> for DeskError {
    fn from(err: rocksdb::Error) -> Self {
        DeskError::Backend(err.into_string())
    }
}

/// Convert from serde_yaml::Error
impl From<serde_yaml::Error> for DeskError {
    fn from(err: serde_yaml::Error) -> Self {
        DeskError::Serialization(err.to_string())
    }
}

/// Convert from serde_json::Error
impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        DeskError::Serialization(err.to_string())
    }
}

/// Convert from ractor::SpawnErr
impl From<ractor::SpawnErr> for DeskError {
    fn from(err: ractor::SpawnErr) -> Self {
        DeskError::Spawn(err.to_string())
    }
}
