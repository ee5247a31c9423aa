//! Base command trait that all session commands implement

use std::fmt::Debug;

use async_trait::async_trait;

use crate::{
    AppContext,
    domain::{catalog::Catalog, identity::Identity}
};

/// What a command can see while it runs inside a session
pub struct CommandContext<'a> {
    /// Shared application services
    pub app:     &'a AppContext,
    /// Identity of the session issuing the command, `None` if unresolved
    pub caller:  Option<&'a Identity>,
    /// The session's cached catalog projection
    pub catalog: &'a Catalog
}

/// Base trait that all commands must implement
#[async_trait]
pub trait Command: Debug + Send + Sync {
    /// The type produced on success
    type Output: Send;

    /// The type of errors this command can produce
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run the command against the session's services
    ///
    /// On error nothing observable may have changed.
    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error>;

    /// Get a human-readable name for this command (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Get a description of what this command does
    fn description(&self) -> &'static str {
        "No description provided"
    }

    /// Check if this command modifies the directory store or the sign-in state
    fn is_mutating(&self) -> bool {
        true
    }
}
