use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{error::DeskError, identity::Identity};

/// Port for the external authentication service
///
/// Every failure is a [`DeskError::Backend`] carrying the provider's own message.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Auth-state feed: yields the session identity whenever sign-in state changes
    fn watch(&self) -> watch::Receiver<Option<Identity>>;

    /// Identity of the current session, `None` until one is resolved
    fn current(&self) -> Option<Identity>;

    /// Resolve an anonymous identity if the session has none yet
    async fn bootstrap(&self) -> Result<Identity, DeskError> {
        match self.current() {
            Some(identity) => Ok(identity),
            None => self.sign_in_anonymously().await
        }
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, DeskError>;

    async fn sign_in_with_provider(&self, provider: &str) -> Result<Identity, DeskError>;

    async fn sign_in_with_credentials(&self, email: &str, password: &str) -> Result<Identity, DeskError>;

    /// Create an account and sign it in
    async fn register(&self, email: &str, password: &str) -> Result<Identity, DeskError>;

    /// End the signed-in session. The session continues with a fresh anonymous identity.
    async fn sign_out(&self) -> Result<Identity, DeskError>;
}
