use async_trait::async_trait;

use crate::{
    domain::{
        command::{
            CreateEventCommand, DeleteEventCommand, DeskCommand, DeskOutcome, ListEventsCommand,
            ListRegistrantsCommand, RegisterAccountCommand, RegisterParticipantCommand, ShowEventCommand,
            SignInAnonymouslyCommand, SignInWithCredentialsCommand, SignInWithProviderCommand, SignOutCommand,
            ToggleEventStatusCommand, UpdateEventCommand, WhoAmICommand
        },
        error::DeskError,
        event::{Event, EventId}
    },
    port::{
        command::{Command, CommandContext},
        identity::IdentityProvider
    }
};

/// Macro to implement Command trait for DeskCommand enum
macro_rules! impl_command {
    ($enum_name:ident { $($variant:ident($field:ident)),* $(,)? }) => {
        #[async_trait]
        impl Command for $enum_name {
            type Output = DeskOutcome;
            type Error = DeskError;

            async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        $enum_name::$variant($field) => $field.execute(context).await,
                    )*
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $(
                        $enum_name::$variant($field) => $field.name(),
                    )*
                }
            }

            fn description(&self) -> &'static str {
                match self {
                    $(
                        $enum_name::$variant($field) => $field.description(),
                    )*
                }
            }

            fn is_mutating(&self) -> bool {
                match self {
                    $(
                        $enum_name::$variant($field) => $field.is_mutating(),
                    )*
                }
            }
        }
    };
}

impl_command!(DeskCommand {
    CreateEvent(cmd),
    UpdateEvent(cmd),
    DeleteEvent(cmd),
    ToggleEventStatus(cmd),
    RegisterParticipant(cmd),
    ListEvents(cmd),
    ShowEvent(cmd),
    ListRegistrants(cmd),
    SignInAnonymously(cmd),
    SignInWithProvider(cmd),
    SignInWithCredentials(cmd),
    RegisterAccount(cmd),
    SignOut(cmd),
    WhoAmI(cmd)
});

/// Event from the session's catalog, or from the store when the catalog has not seen it
async fn lookup(context: &CommandContext<'_>, id: &EventId) -> Result<Event, DeskError> {
    match context.catalog.find(id) {
        Some(event) => Ok(event.clone()),
        None => context.app.service.get_event(id).await
    }
}

#[async_trait]
impl Command for CreateEventCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        let event = context.app.service.create_event(context.caller, self.draft.clone()).await?;
        Ok(DeskOutcome::EventCreated(event))
    }

    fn name(&self) -> &'static str {
        "create-event"
    }

    fn description(&self) -> &'static str {
        "Creates an event from the submitted form"
    }
}

#[async_trait]
impl Command for UpdateEventCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        if self.patch.is_empty() {
            return Err(DeskError::Validation("nothing to update".to_string()));
        }

        let event = context.app.service.update_event(context.caller, &self.id, self.patch.clone()).await?;
        Ok(DeskOutcome::EventUpdated(event))
    }

    fn name(&self) -> &'static str {
        "update-event"
    }

    fn description(&self) -> &'static str {
        "Applies the edited fields to an existing event"
    }
}

#[async_trait]
impl Command for DeleteEventCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        context.app.service.delete_event(context.caller, &self.id).await?;
        Ok(DeskOutcome::EventDeleted(self.id.clone()))
    }

    fn name(&self) -> &'static str {
        "delete-event"
    }

    fn description(&self) -> &'static str {
        "Deletes an event and its registrations"
    }
}

#[async_trait]
impl Command for ToggleEventStatusCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        let event = context.app.service.toggle_event_status(context.caller, &self.id).await?;
        Ok(DeskOutcome::StatusToggled(event))
    }

    fn name(&self) -> &'static str {
        "toggle-event-status"
    }

    fn description(&self) -> &'static str {
        "Opens or closes registrations for an event"
    }
}

#[async_trait]
impl Command for RegisterParticipantCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        let remaining_seats =
            context.app.service.register_participant(context.caller, &self.event_id, self.form.clone()).await?;
        Ok(DeskOutcome::Registered { event_id: self.event_id.clone(), remaining_seats })
    }

    fn name(&self) -> &'static str {
        "register-participant"
    }

    fn description(&self) -> &'static str {
        "Registers a participant for an open event"
    }
}

#[async_trait]
impl Command for ListEventsCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        let events = if context.catalog.is_primed() {
            self.filter.apply(context.catalog.events())
        } else {
            context.app.service.list_events(&self.filter).await?
        };
        Ok(DeskOutcome::Events(events))
    }

    fn name(&self) -> &'static str {
        "list-events"
    }

    fn description(&self) -> &'static str {
        "Lists events matching the search, kind and audience"
    }

    fn is_mutating(&self) -> bool {
        false
    }
}

#[async_trait]
impl Command for ShowEventCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        Ok(DeskOutcome::EventDetail(lookup(context, &self.id).await?))
    }

    fn name(&self) -> &'static str {
        "show-event"
    }

    fn description(&self) -> &'static str {
        "Shows the details and remaining seats of an event"
    }

    fn is_mutating(&self) -> bool {
        false
    }
}

#[async_trait]
impl Command for ListRegistrantsCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        let registrations = context.app.service.registrants(context.caller, &self.id).await?;
        // same read as the registrations, the catalog may lag behind it
        let event = context.app.service.get_event(&self.id).await?;
        Ok(DeskOutcome::Registrants { event, registrations })
    }

    fn name(&self) -> &'static str {
        "list-registrants"
    }

    fn description(&self) -> &'static str {
        "Lists the participants registered for an event"
    }

    fn is_mutating(&self) -> bool {
        false
    }
}

#[async_trait]
impl Command for SignInAnonymouslyCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        Ok(DeskOutcome::SignedIn(context.app.identity.sign_in_anonymously().await?))
    }

    fn name(&self) -> &'static str {
        "sign-in-anonymously"
    }

    fn description(&self) -> &'static str {
        "Continues as an anonymous visitor"
    }
}

#[async_trait]
impl Command for SignInWithProviderCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        Ok(DeskOutcome::SignedIn(context.app.identity.sign_in_with_provider(&self.provider).await?))
    }

    fn name(&self) -> &'static str {
        "sign-in-with-provider"
    }

    fn description(&self) -> &'static str {
        "Signs in through a configured identity provider"
    }
}

#[async_trait]
impl Command for SignInWithCredentialsCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        let identity = context.app.identity.sign_in_with_credentials(&self.email, &self.password).await?;
        Ok(DeskOutcome::SignedIn(identity))
    }

    fn name(&self) -> &'static str {
        "sign-in-with-credentials"
    }

    fn description(&self) -> &'static str {
        "Signs in with email and password"
    }
}

#[async_trait]
impl Command for RegisterAccountCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        Ok(DeskOutcome::SignedIn(context.app.identity.register(&self.email, &self.password).await?))
    }

    fn name(&self) -> &'static str {
        "register-account"
    }

    fn description(&self) -> &'static str {
        "Creates an email and password account and signs it in"
    }
}

#[async_trait]
impl Command for SignOutCommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        Ok(DeskOutcome::SignedOut(context.app.identity.sign_out().await?))
    }

    fn name(&self) -> &'static str {
        "sign-out"
    }

    fn description(&self) -> &'static str {
        "Ends the signed-in session"
    }
}

#[async_trait]
impl Command for WhoAmICommand {
    type Output = DeskOutcome;
    type Error = DeskError;

    async fn execute(&self, context: &CommandContext<'_>) -> Result<Self::Output, Self::Error> {
        Ok(DeskOutcome::CurrentIdentity(context.caller.cloned()))
    }

    fn name(&self) -> &'static str {
        "who-am-i"
    }

    fn description(&self) -> &'static str {
        "Shows the identity of the current session"
    }

    fn is_mutating(&self) -> bool {
        false
    }
}
