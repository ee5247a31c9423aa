//! Typed messages for actor communication

use ractor::{ActorRef, Message, RpcReplyPort};

use crate::domain::{
    catalog::CatalogSnapshot,
    command::{DeskCommand, DeskOutcome},
    error::DeskError,
    identity::Identity,
    state::ViewState
};

/// Reply port carrying the outcome of one command
pub type CommandReply = RpcReplyPort<Result<DeskOutcome, DeskError>>;

/// Messages for the Guardian actor (root of actor system)
#[derive(Debug)]
pub enum GuardianMessage {
    /// Initialize the actor system
    Initialize,
    /// Submit a command for processing in a session
    SubmitCommand { command: DeskCommand, session_id: String, reply: CommandReply },
    /// Shutdown the entire system
    Shutdown { reply: RpcReplyPort<()> },
    /// System health check
    HealthCheck { reply: RpcReplyPort<SystemHealth> },
    /// What a session currently shows, `None` for an unknown session
    GetSessionView { session_id: String, reply: RpcReplyPort<Option<SessionView>> }
}

/// Messages for the SessionManager actor
#[derive(Debug)]
pub enum SessionManagerMessage {
    /// Route a command to the session's processor, spawning it on first use
    SubmitCommand { command: DeskCommand, session_id: String, reply: CommandReply },
    /// A processor finished a command
    CommandCompleted { session_id: String, succeeded: bool },
    /// Processor of a session, if it exists
    GetSession { session_id: String, reply: RpcReplyPort<Option<ActorRef<SessionProcessorMessage>>> },
    /// Get session statistics
    GetStats { reply: RpcReplyPort<SessionStats> }
}

/// Messages for SessionProcessor actors (per-session)
#[derive(Debug)]
pub enum SessionProcessorMessage {
    /// Process a desk command
    ProcessCommand { command: DeskCommand, reply: CommandReply },
    /// The directory store published a new full collection
    CatalogReplaced(CatalogSnapshot),
    /// The identity provider reported a sign-in state change
    IdentityChanged,
    /// Snapshot of what the session currently shows
    GetView { reply: RpcReplyPort<SessionView> }
}

/// What a session is looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub identity:         Option<Identity>,
    pub view:             ViewState,
    pub catalog_revision: Option<u64>,
    pub catalog_size:     usize
}

/// System health information
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub active_sessions:          usize,
    pub total_commands_processed: u64,
    pub uptime_seconds:           u64
}

/// Session statistics for monitoring and health checks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub active_sessions:          usize,
    pub total_sessions_created:   u64,
    pub total_commands_processed: u64,
    pub total_commands_failed:    u64
}

// Implement Message trait for Ractor
impl Message for GuardianMessage {}
impl Message for SessionManagerMessage {}
impl Message for SessionProcessorMessage {}
