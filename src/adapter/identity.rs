//! Local identity provider
//!
//! Accounts and the current session live in a YAML file next to the directory
//! store. Failures carry the provider's error code as the message.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, watch};
use tracing::{Level, event};
use uuid::Uuid;

use crate::{
    config::ProviderAccount,
    domain::{constant::identity, error::DeskError, identity::Identity},
    port::identity::IdentityProvider
};

pub const INVALID_EMAIL: &str = "auth/invalid-email";
pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
pub const WEAK_PASSWORD: &str = "auth/weak-password";
pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
pub const OPERATION_NOT_ALLOWED: &str = "auth/operation-not-allowed";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Credential {
    salt:   String,
    digest: String
}

impl Credential {
    fn new(password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = digest(&salt, password);
        Self { salt, digest }
    }

    fn verify(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.digest
    }
}

fn digest(salt: &str, password: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{}:{}", salt, password).as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Account {
    user_id:    String,
    email:      String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential: Option<Credential>,
    /// Providers linked to this account
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    providers:  Vec<String>
}

impl Account {
    fn new(email: String) -> Self {
        Self { user_id: Uuid::new_v4().to_string(), email, credential: None, providers: Vec::new() }
    }

    fn identity(&self) -> Identity {
        Identity::Authenticated { user_id: self.user_id.clone(), email: self.email.clone() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct IdentityFile {
    session:  Option<Identity>,
    accounts: Vec<Account>
}

impl IdentityFile {
    fn account(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.email == email)
    }
}

/// Trimmed, lowercased email, `auth/invalid-email` if it is not shaped like one
fn normalize_email(email: &str) -> Result<String, DeskError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(DeskError::Backend(INVALID_EMAIL.to_string()))
    }
}

/// Identity provider backed by a local file, or by memory alone when no path is given
pub struct LocalIdentityProvider {
    path:      Option<PathBuf>,
    providers: Vec<ProviderAccount>,
    state:     Mutex<IdentityFile>,
    session:   watch::Sender<Option<Identity>>
}

impl LocalIdentityProvider {
    pub fn in_memory(providers: Vec<ProviderAccount>) -> Self {
        Self::with_state(None, providers, IdentityFile::default())
    }

    /// Opens the identity file at `path`, starting empty if it does not exist
    pub fn open(path: &Path, providers: Vec<ProviderAccount>) -> Result<Self, DeskError> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str::<IdentityFile>(&content)?
        } else {
            IdentityFile::default()
        };

        if let Some(session) = &state.session {
            event!(Level::DEBUG, event = identity::SESSION_RESTORED, identity = %session);
        }

        Ok(Self::with_state(Some(path.to_path_buf()), providers, state))
    }

    fn with_state(path: Option<PathBuf>, providers: Vec<ProviderAccount>, state: IdentityFile) -> Self {
        let (session, _) = watch::channel(state.session.clone());
        Self { path, providers, state: Mutex::new(state), session }
    }

    async fn persist(&self, state: &IdentityFile) -> Result<(), DeskError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_yaml::to_string(state)?).await?;
        Ok(())
    }

    /// Persist `next` as the new state and announce its session. On error the old state stays.
    async fn commit(&self, state: &mut IdentityFile, next: IdentityFile) -> Result<Identity, DeskError> {
        self.persist(&next).await?;
        *state = next;

        let session = state.session.clone();
        self.session.send_replace(session.clone());
        session.ok_or_else(|| DeskError::Generic("session was not set".to_string()))
    }

    fn failed(method: &str, code: &str) -> DeskError {
        event!(Level::DEBUG, event = identity::SIGN_IN_FAILED, method = method, code = code);
        DeskError::Backend(code.to_string())
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.session.subscribe()
    }

    fn current(&self) -> Option<Identity> {
        self.session.borrow().clone()
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, DeskError> {
        let mut state = self.state.lock().await;
        let next = IdentityFile { session: Some(Identity::anonymous()), ..state.clone() };
        let identity = self.commit(&mut state, next).await?;

        event!(Level::DEBUG, event = identity::SIGNED_IN, method = "anonymous", identity = %identity);
        Ok(identity)
    }

    async fn sign_in_with_provider(&self, provider: &str) -> Result<Identity, DeskError> {
        let configured = self
            .providers
            .iter()
            .find(|account| account.name.eq_ignore_ascii_case(provider))
            .ok_or_else(|| Self::failed("provider", OPERATION_NOT_ALLOWED))?;
        let email = normalize_email(&configured.email).map_err(|_| Self::failed("provider", INVALID_EMAIL))?;

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let index = match next.accounts.iter().position(|account| account.email == email) {
            Some(index) => index,
            None => {
                next.accounts.push(Account::new(email));
                next.accounts.len() - 1
            }
        };

        let account = &mut next.accounts[index];
        if !account.providers.contains(&configured.name) {
            account.providers.push(configured.name.clone());
        }
        next.session = Some(account.identity());

        let identity = self.commit(&mut state, next).await?;
        event!(Level::DEBUG, event = identity::SIGNED_IN, method = "provider", provider = %configured.name, identity = %identity);
        Ok(identity)
    }

    async fn sign_in_with_credentials(&self, email: &str, password: &str) -> Result<Identity, DeskError> {
        let email = normalize_email(email).map_err(|_| Self::failed("credentials", INVALID_EMAIL))?;

        let mut state = self.state.lock().await;
        let account = state
            .account(&email)
            .filter(|account| account.credential.as_ref().is_some_and(|credential| credential.verify(password)))
            .ok_or_else(|| Self::failed("credentials", INVALID_CREDENTIAL))?;

        let next = IdentityFile { session: Some(account.identity()), ..state.clone() };
        let identity = self.commit(&mut state, next).await?;

        event!(Level::DEBUG, event = identity::SIGNED_IN, method = "credentials", identity = %identity);
        Ok(identity)
    }

    async fn register(&self, email: &str, password: &str) -> Result<Identity, DeskError> {
        let email = normalize_email(email).map_err(|_| Self::failed("register", INVALID_EMAIL))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Self::failed("register", WEAK_PASSWORD));
        }

        let mut state = self.state.lock().await;
        if state.account(&email).is_some() {
            return Err(Self::failed("register", EMAIL_ALREADY_IN_USE));
        }

        let mut account = Account::new(email);
        account.credential = Some(Credential::new(password));

        let mut next = state.clone();
        next.session = Some(account.identity());
        next.accounts.push(account);

        let identity = self.commit(&mut state, next).await?;
        event!(Level::INFO, event = identity::ACCOUNT_REGISTERED, identity = %identity);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<Identity, DeskError> {
        let mut state = self.state.lock().await;
        let previous = state.session.clone();
        let next = IdentityFile { session: Some(Identity::anonymous()), ..state.clone() };
        let identity = self.commit(&mut state, next).await?;

        event!(
            Level::DEBUG,
            event = identity::SIGNED_OUT,
            previous = ?previous.as_ref().map(Identity::id),
            identity = %identity
        );
        Ok(identity)
    }
}
