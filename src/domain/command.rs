//! Command-line surface, session commands and their outcomes

use std::fmt::{self, Debug};

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::{
    adapter::storage::StoreType,
    domain::{
        catalog::{Audience, EventFilter},
        event::{Event, EventDraft, EventId, EventKind, EventPatch, EventStatus, parse_local_datetime},
        identity::Identity,
        registration::{Registration, RegistrationForm}
    }
};

/// Main CLI application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct DeskCli {
    /// Storage backend for this invocation (overrides the configured one)
    #[arg(long, global = true)]
    pub store:   Option<StoreType>,
    /// Subcommands
    #[command(subcommand)]
    pub command: DeskCliCommand
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum DeskCliCommand {
    /// Browse, manage and register for events
    Event {
        #[command(subcommand)]
        command: EventCommands
    },
    /// Sign in, sign out and account management
    Auth {
        #[command(subcommand)]
        command: AuthCommands
    },
    /// Storage backend management commands
    Storage {
        #[command(subcommand)]
        command: StorageCommands
    }
}

/// Event subcommands
#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// List events (only those open for registration unless --all)
    List {
        /// Case-insensitive search on the title
        #[arg(long)]
        search: Option<String>,
        /// Only events of this type
        #[arg(long)]
        kind:   Option<EventKind>,
        /// Include drafts, closed and cancelled events (admin listing)
        #[arg(long)]
        all:    bool
    },
    /// Show the details of an event
    Show { id: String },
    /// Create a new event
    Create(EventFormArgs),
    /// Change fields of an existing event
    Update {
        id:     String,
        #[command(flatten)]
        fields: EventFormArgs
    },
    /// Delete an event
    Delete {
        id:  String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool
    },
    /// Publish or unpublish an event
    Toggle { id: String },
    /// Register a participant for an event
    Register {
        id:         String,
        #[arg(long, default_value_t)]
        name:       String,
        #[arg(long, default_value_t)]
        email:      String,
        #[arg(long, default_value_t)]
        student_id: String,
        #[arg(long, default_value_t)]
        course:     String
    },
    /// List the participants registered for an event
    Registrants { id: String }
}

/// Event form fields shared by `create` and `update`
#[derive(Args, Debug, Clone, Default)]
pub struct EventFormArgs {
    #[arg(long)]
    pub title:        Option<String>,
    #[arg(long)]
    pub kind:         Option<EventKind>,
    #[arg(long)]
    pub description:  Option<String>,
    /// Start, e.g. 2026-03-14T09:30
    #[arg(long, value_parser = parse_local_datetime)]
    pub starts_at:    Option<NaiveDateTime>,
    /// End, e.g. 2026-03-14T12:00
    #[arg(long, value_parser = parse_local_datetime)]
    pub ends_at:      Option<NaiveDateTime>,
    #[arg(long)]
    pub venue:        Option<String>,
    #[arg(long)]
    pub presenters:   Option<String>,
    #[arg(long)]
    pub department:   Option<String>,
    #[arg(long)]
    pub requirements: Option<String>,
    #[arg(long)]
    pub banner_url:   Option<String>,
    #[arg(long)]
    pub status:       Option<EventStatus>,
    /// Total number of seats
    #[arg(long, allow_negative_numbers = true)]
    pub capacity:     Option<i64>
}

impl From<EventFormArgs> for EventDraft {
    fn from(args: EventFormArgs) -> Self {
        Self {
            title:        args.title,
            kind:         args.kind,
            description:  args.description,
            starts_at:    args.starts_at,
            ends_at:      args.ends_at,
            venue:        args.venue,
            presenters:   args.presenters,
            department:   args.department,
            requirements: args.requirements,
            banner_url:   args.banner_url,
            status:       args.status,
            capacity:     args.capacity
        }
    }
}

/// Authentication subcommands
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Continue as an anonymous visitor
    Anonymous,
    /// Sign in through a configured identity provider
    Provider { name: String },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email:    String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>
    },
    /// Create an account with email and password
    Register {
        #[arg(long)]
        email:    String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>
    },
    /// Sign out and continue as an anonymous visitor
    Logout,
    /// Show the identity of the current session
    Whoami
}

/// Storage management subcommands
#[derive(Subcommand, Debug)]
pub enum StorageCommands {
    /// Set the storage backend
    Set {
        /// Storage backend
        backend: StoreType
    },
    /// Show current storage backend
    Current
}

// **********************
// Session commands
// **********************

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventCommand {
    pub draft: EventDraft
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEventCommand {
    pub id:    EventId,
    pub patch: EventPatch
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEventCommand {
    pub id: EventId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEventStatusCommand {
    pub id: EventId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterParticipantCommand {
    pub event_id: EventId,
    pub form:     RegistrationForm
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEventsCommand {
    pub filter: EventFilter
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowEventCommand {
    pub id: EventId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRegistrantsCommand {
    pub id: EventId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInAnonymouslyCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInWithProviderCommand {
    pub provider: String
}

#[derive(Clone, PartialEq, Eq)]
pub struct SignInWithCredentialsCommand {
    pub email:    String,
    pub password: String
}

#[derive(Clone, PartialEq, Eq)]
pub struct RegisterAccountCommand {
    pub email:    String,
    pub password: String
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoAmICommand;

impl Debug for SignInWithCredentialsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInWithCredentialsCommand").field("email", &self.email).finish_non_exhaustive()
    }
}

impl Debug for RegisterAccountCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterAccountCommand").field("email", &self.email).finish_non_exhaustive()
    }
}

macro_rules! desk_commands {
    ($($variant:ident($command:ident)),* $(,)?) => {
        /// Unified enum for every command a session can process
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum DeskCommand {
            $($variant($command)),*
        }

        $(
            impl From<$command> for DeskCommand {
                fn from(command: $command) -> Self {
                    DeskCommand::$variant(command)
                }
            }
        )*
    };
}

desk_commands!(
    CreateEvent(CreateEventCommand),
    UpdateEvent(UpdateEventCommand),
    DeleteEvent(DeleteEventCommand),
    ToggleEventStatus(ToggleEventStatusCommand),
    RegisterParticipant(RegisterParticipantCommand),
    ListEvents(ListEventsCommand),
    ShowEvent(ShowEventCommand),
    ListRegistrants(ListRegistrantsCommand),
    SignInAnonymously(SignInAnonymouslyCommand),
    SignInWithProvider(SignInWithProviderCommand),
    SignInWithCredentials(SignInWithCredentialsCommand),
    RegisterAccount(RegisterAccountCommand),
    SignOut(SignOutCommand),
    WhoAmI(WhoAmICommand)
);

impl EventCommands {
    /// Converts the parsed CLI arguments into a session command.
    ///
    /// `delete` confirmation is handled by the caller.
    pub fn into_command(self) -> DeskCommand {
        match self {
            EventCommands::List { search, kind, all } => {
                let audience = if all { Audience::Admin } else { Audience::Participant };
                ListEventsCommand { filter: EventFilter { search, kind, audience } }.into()
            }
            EventCommands::Show { id } => ShowEventCommand { id: id.into() }.into(),
            EventCommands::Create(fields) => CreateEventCommand { draft: fields.into() }.into(),
            EventCommands::Update { id, fields } => UpdateEventCommand { id: id.into(), patch: fields.into() }.into(),
            EventCommands::Delete { id, .. } => DeleteEventCommand { id: id.into() }.into(),
            EventCommands::Toggle { id } => ToggleEventStatusCommand { id: id.into() }.into(),
            EventCommands::Register { id, name, email, student_id, course } => RegisterParticipantCommand {
                event_id: id.into(),
                form:     RegistrationForm { full_name: name, email, student_id, course }
            }
            .into(),
            EventCommands::Registrants { id } => ListRegistrantsCommand { id: id.into() }.into()
        }
    }
}

// **********************
// Outcomes
// **********************

/// Result of a successfully processed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskOutcome {
    EventCreated(Event),
    EventUpdated(Event),
    EventDeleted(EventId),
    StatusToggled(Event),
    Registered { event_id: EventId, remaining_seats: u32 },
    Events(Vec<Event>),
    EventDetail(Event),
    Registrants { event: Event, registrations: Vec<Registration> },
    SignedIn(Identity),
    SignedOut(Identity),
    CurrentIdentity(Option<Identity>)
}

impl DeskOutcome {
    /// The single user-visible notification for this outcome
    pub fn notice(&self) -> String {
        match self {
            DeskOutcome::EventCreated(event) => format!("Event '{}' created ({}).", event.title(), event.id),
            DeskOutcome::EventUpdated(event) => format!("Event '{}' updated.", event.title()),
            DeskOutcome::EventDeleted(id) => format!("Event {} deleted.", id),
            DeskOutcome::StatusToggled(event) => {
                format!("Status of '{}' is now: {}.", event.title(), event.status())
            }
            DeskOutcome::Registered { remaining_seats, .. } => {
                format!("Registration confirmed. {} seat(s) left.", remaining_seats)
            }
            DeskOutcome::Events(events) => format!("{} event(s) found.", events.len()),
            DeskOutcome::EventDetail(event) => format!("{} seat(s) left.", event.remaining_seats()),
            DeskOutcome::Registrants { event, registrations } => {
                format!("{} participant(s) registered for '{}'.", registrations.len(), event.title())
            }
            DeskOutcome::SignedIn(identity) => format!("Signed in as {}.", identity),
            DeskOutcome::SignedOut(identity) => format!("Signed out. Continuing as {}.", identity),
            DeskOutcome::CurrentIdentity(Some(identity)) => format!("Current identity: {}.", identity),
            DeskOutcome::CurrentIdentity(None) => "No identity resolved for this session.".to_string()
        }
    }

    /// Identity established by this outcome, if it changed the sign-in state
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            DeskOutcome::SignedIn(identity) | DeskOutcome::SignedOut(identity) => Some(identity),
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_event_create() {
        let cli = DeskCli::try_parse_from([
            "eventdesk",
            "event",
            "create",
            "--title",
            "Rust Night",
            "--starts-at",
            "2026-11-03T18:00",
            "--ends-at",
            "2026-11-03T21:00",
            "--venue",
            "Lab 2",
            "--capacity",
            "-1"
        ])
        .unwrap();

        let DeskCliCommand::Event { command } = cli.command else { panic!("Expected event command") };
        match command.into_command() {
            DeskCommand::CreateEvent(cmd) => {
                assert_eq!(cmd.draft.title.as_deref(), Some("Rust Night"));
                assert_eq!(cmd.draft.capacity, Some(-1));
            }
            other => panic!("Expected CreateEvent, got {:?}", other)
        }
    }

    #[test]
    fn test_cli_list_defaults_to_participant_audience() {
        let cli = DeskCli::try_parse_from(["eventdesk", "event", "list", "--kind", "academic-week"]).unwrap();
        let DeskCliCommand::Event { command } = cli.command else { panic!("Expected event command") };
        match command.into_command() {
            DeskCommand::ListEvents(cmd) => {
                assert_eq!(cmd.filter.audience, Audience::Participant);
                assert_eq!(cmd.filter.kind, Some(EventKind::AcademicWeek));
            }
            other => panic!("Expected ListEvents, got {:?}", other)
        }
    }

    #[test]
    fn test_credentials_are_redacted_in_debug_output() {
        let command = SignInWithCredentialsCommand { email: "a@b.c".to_string(), password: "hunter22".to_string() };
        let rendered = format!("{:?}", DeskCommand::from(command));
        assert!(rendered.contains("a@b.c"));
        assert!(!rendered.contains("hunter22"));
    }
}
