//! Interactive prompts

use crate::domain::error::DeskError;

/// Ask before deleting an event, defaulting to no
pub fn confirm_deletion(id: &str) -> Result<bool, DeskError> {
    cliclack::confirm(format!("Delete event {} and all of its registrations?", id))
        .initial_value(false)
        .interact()
        .map_err(|e| DeskError::UserInteraction(e.to_string()))
}

/// Read a password without echoing it
pub fn password(prompt: &str) -> Result<String, DeskError> {
    cliclack::password(prompt).mask('▪').interact().map_err(|e| DeskError::UserInteraction(e.to_string()))
}
