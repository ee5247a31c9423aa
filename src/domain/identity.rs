//! Caller identities and the authorization rules built on them

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DeskError;

/// Who is acting in a session
///
/// A session that never signed in still gets a locally generated anonymous
/// identity so its registrations can be attributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Anonymous { local_id: String },
    Authenticated { user_id: String, email: String }
}

impl Identity {
    pub fn anonymous() -> Self {
        Identity::Anonymous { local_id: Uuid::new_v4().to_string() }
    }

    pub fn id(&self) -> &str {
        match self {
            Identity::Anonymous { local_id } => local_id,
            Identity::Authenticated { user_id, .. } => user_id
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous { .. })
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous { local_id } => {
                write!(f, "anonymous visitor ({})", local_id.get(..8).unwrap_or(local_id))
            }
            Identity::Authenticated { email, .. } => write!(f, "{}", email)
        }
    }
}

/// Caller as seen by an admin-only operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admin<'a> {
    pub user_id: &'a str
}

/// Admin actions need a signed-in, non-anonymous identity
pub fn require_admin(caller: Option<&Identity>) -> Result<Admin<'_>, DeskError> {
    match caller {
        Some(Identity::Authenticated { user_id, .. }) => Ok(Admin { user_id }),
        Some(Identity::Anonymous { .. }) => {
            Err(DeskError::Unauthorized("sign in with an administrator account to manage events".to_string()))
        }
        None => Err(DeskError::Unauthorized("no identity resolved for this session".to_string()))
    }
}

/// Registration only needs the session identity to be known, anonymous or not
pub fn require_resolved(caller: Option<&Identity>) -> Result<&Identity, DeskError> {
    caller.ok_or_else(|| DeskError::Unauthorized("no identity resolved for this session".to_string()))
}
