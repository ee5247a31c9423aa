//! Domain Events - Structured events for internal monitoring and debugging

/// Guardian Actor Events
pub mod guardian {
    pub const GUARDIAN_STARTED: &str = "guardian.started";
    pub const CHILDREN_SPAWNING: &str = "children.spawning";
    pub const CHILDREN_SPAWNED: &str = "children.spawned";
    pub const CHILDREN_SPAWN_FAILED: &str = "children.spawn_failed";
    pub const SYSTEM_INITIALIZED: &str = "system.initialized";
    pub const SYSTEM_SHUTDOWN_STARTED: &str = "system.shutdown_started";
    pub const SYSTEM_SHUTDOWN_COMPLETED: &str = "system.shutdown_completed";
    pub const HEALTH_CHECK_COMPLETED: &str = "health.check_completed";
    pub const COMMAND_SUBMITTED: &str = "command.submitted";
    pub const REPLY_FAILED: &str = "reply.failed";
}

/// SessionManager Actor Events
pub mod session_manager {
    pub const MANAGER_STARTED: &str = "manager.started";
    pub const COMMAND_ROUTED: &str = "command.routed";
    pub const COMMAND_COMPLETED: &str = "command.completed";
    pub const SESSION_CLOSED: &str = "session.closed";
    pub const PROCESSOR_SPAWNED: &str = "processor.spawned";
    pub const PROCESSOR_SPAWN_FAILED: &str = "processor.spawn_failed";
    pub const REPLY_FAILED: &str = "reply.failed";
}

/// SessionProcessor Actor Events
pub mod session_processor {
    pub const PROCESSOR_STARTED: &str = "processor.started";
    pub const PROCESSOR_STOPPED: &str = "processor.stopped";
    pub const COMMAND_RECEIVED: &str = "command.received";
    pub const COMMAND_PROCESSED: &str = "command.processed";
    pub const COMMAND_FAILED: &str = "command.failed";
    pub const CATALOG_REPLACED: &str = "catalog.replaced";
    pub const IDENTITY_CHANGED: &str = "identity.changed";
    pub const VIEW_CHANGED: &str = "view.changed";
    pub const REPLY_FAILED: &str = "reply.failed";
}

/// Directory Store Events
pub mod directory_store {
    pub const STORE_OPENED: &str = "store.opened";
    pub const EVENT_CREATED: &str = "event.created";
    pub const EVENT_MODIFIED: &str = "event.modified";
    pub const EVENT_DELETED: &str = "event.deleted";
    pub const MODIFY_REJECTED: &str = "modify.rejected";
    pub const CHANGE_PUBLISHED: &str = "change.published";
}

/// Registration Service Events
pub mod registration {
    pub const EVENT_CREATED: &str = "event.created";
    pub const EVENT_UPDATED: &str = "event.updated";
    pub const EVENT_DELETED: &str = "event.deleted";
    pub const STATUS_TOGGLED: &str = "status.toggled";
    pub const PARTICIPANT_REGISTERED: &str = "participant.registered";
    pub const REGISTRATION_REJECTED: &str = "registration.rejected";
    pub const ACCESS_DENIED: &str = "access.denied";
}

/// Identity Provider Events
pub mod identity {
    pub const SESSION_RESTORED: &str = "session.restored";
    pub const SIGNED_IN: &str = "auth.signed_in";
    pub const SIGNED_OUT: &str = "auth.signed_out";
    pub const ACCOUNT_REGISTERED: &str = "account.registered";
    pub const SIGN_IN_FAILED: &str = "auth.sign_in_failed";
}
