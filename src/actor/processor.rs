//! SessionProcessor Actor
//!
//! Owns one session: its identity, its view and its cached catalog.
//! Change feeds from the directory store and the identity provider are forwarded
//! to the actor's own mailbox, so every update to the session state is applied
//! between commands, never during one.

use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::task::JoinHandle;
use tracing::{Level, event};

use crate::{
    AppContext,
    actor::message::{CommandReply, SessionManagerMessage, SessionProcessorMessage, SessionView},
    domain::{
        catalog::{Catalog, CatalogSnapshot},
        command::DeskCommand,
        constant::session_processor,
        identity::Identity,
        state::ViewState
    },
    port::{
        command::{Command, CommandContext},
        identity::IdentityProvider
    }
};

/// SessionProcessor Actor State
pub struct SessionProcessorState {
    pub session_id: String,
    app_context:    Arc<AppContext>,
    manager:        ActorRef<SessionManagerMessage>,
    identity:       Option<Identity>,
    /// Replaced wholesale on every store notification
    catalog:        Catalog,
    view:           ViewState,
    /// Tasks forwarding the store and identity feeds
    feeds:          Vec<JoinHandle<()>>
}

impl SessionProcessorState {
    fn snapshot(&self) -> SessionView {
        SessionView {
            identity:         self.identity.clone(),
            view:             self.view.clone(),
            catalog_revision: self.catalog.revision(),
            catalog_size:     self.catalog.events().len()
        }
    }

    fn set_view(&mut self, next: ViewState) {
        if next.name() != self.view.name() {
            event!(Level::DEBUG, event = session_processor::VIEW_CHANGED,
                   session_id = %self.session_id, from = self.view.name(), to = next.name());
        }
        self.view = next;
    }
}

/// SessionProcessor Actor - handles commands for a single session
pub struct SessionProcessor;

#[async_trait::async_trait]
impl Actor for SessionProcessor {
    type Arguments = (String, Arc<AppContext>, ActorRef<SessionManagerMessage>);
    type Msg = SessionProcessorMessage;
    type State = SessionProcessorState;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        (session_id, app_context, manager): Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = session_processor::PROCESSOR_STARTED, session_id = %session_id);

        let mut subscription = app_context.store.subscribe();
        let catalog = Catalog::from(subscription.current());
        let catalog_feed = {
            let myself = myself.clone();
            tokio::spawn(async move {
                while let Some(snapshot) = subscription.changed().await {
                    if myself.cast(SessionProcessorMessage::CatalogReplaced(snapshot)).is_err() {
                        break;
                    }
                }
            })
        };

        let mut identities = app_context.identity.watch();
        let identity = identities.borrow_and_update().clone();
        let identity_feed = tokio::spawn(async move {
            while identities.changed().await.is_ok() {
                if myself.cast(SessionProcessorMessage::IdentityChanged).is_err() {
                    break;
                }
            }
        });

        Ok(SessionProcessorState {
            session_id,
            app_context,
            manager,
            identity,
            catalog,
            view: ViewState::default(),
            feeds: vec![catalog_feed, identity_feed]
        })
    }

    async fn post_stop(&self, _myself: ActorRef<Self::Msg>, state: &mut Self::State) -> Result<(), ActorProcessingErr> {
        for feed in state.feeds.drain(..) {
            feed.abort();
        }

        event!(Level::DEBUG, event = session_processor::PROCESSOR_STOPPED, session_id = %state.session_id);
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionProcessorMessage::ProcessCommand { command, reply } => {
                self.handle_process_command(command, reply, state).await
            }
            SessionProcessorMessage::CatalogReplaced(snapshot) => {
                self.handle_catalog_replaced(snapshot, state);
                Ok(())
            }
            SessionProcessorMessage::IdentityChanged => {
                // read the provider's latest state, a queued notification may be stale
                let identity = state.app_context.identity.current();
                event!(Level::DEBUG, event = session_processor::IDENTITY_CHANGED,
                       session_id = %state.session_id, identity = ?identity.as_ref().map(Identity::id));
                state.identity = identity;
                Ok(())
            }
            SessionProcessorMessage::GetView { reply } => {
                if let Err(e) = reply.send(state.snapshot()) {
                    event!(Level::ERROR, event = session_processor::REPLY_FAILED, session_id = %state.session_id, error = %e);
                }
                Ok(())
            }
        }
    }
}

impl SessionProcessor {
    /// Run one command and move the view. A failed command is reported to the
    /// caller and leaves the actor running.
    async fn handle_process_command(
        &self,
        command: DeskCommand,
        reply: CommandReply,
        state: &mut SessionProcessorState
    ) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = session_processor::COMMAND_RECEIVED,
               command = %command.name(), session_id = %state.session_id);

        // the feed task may still be delivering writes the session already depends on
        let latest = state.app_context.store.subscribe().current();
        if state.catalog.revision() < Some(latest.revision) {
            self.handle_catalog_replaced(latest, state);
        }

        let result = {
            let context = CommandContext {
                app:     &state.app_context,
                caller:  state.identity.as_ref(),
                catalog: &state.catalog
            };
            command.execute(&context).await
        };

        match &result {
            Ok(outcome) => {
                if let Some(identity) = outcome.identity() {
                    state.identity = Some(identity.clone());
                }
                event!(Level::DEBUG, event = session_processor::COMMAND_PROCESSED,
                       session_id = %state.session_id, command = %command.name());
            }
            Err(e) => {
                event!(Level::WARN, event = session_processor::COMMAND_FAILED,
                       session_id = %state.session_id, command = %command.name(), error = %e);
            }
        }

        let next = state.view.after(&command, &result, &state.catalog);
        state.set_view(next);

        let succeeded = result.is_ok();
        if let Err(e) = reply.send(result) {
            event!(Level::ERROR, event = session_processor::REPLY_FAILED, session_id = %state.session_id, error = %e);
        }

        if let Err(e) = state
            .manager
            .cast(SessionManagerMessage::CommandCompleted { session_id: state.session_id.clone(), succeeded })
        {
            event!(Level::WARN, event = session_processor::COMMAND_PROCESSED, session_id = %state.session_id, error = %e);
        }

        Ok(())
    }

    fn handle_catalog_replaced(&self, snapshot: CatalogSnapshot, state: &mut SessionProcessorState) {
        let revision = snapshot.revision;
        if !state.catalog.replace(snapshot) {
            return;
        }

        event!(Level::TRACE, event = session_processor::CATALOG_REPLACED,
               session_id = %state.session_id, revision = revision, events = state.catalog.events().len());

        let next = state.view.refreshed(&state.catalog);
        state.set_view(next);
    }
}
