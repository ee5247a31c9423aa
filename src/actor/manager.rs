//! SessionManager Actor - Manages sessions and command routing
//!
//! The SessionManager coordinates every session of the desk:
//! - Spawns one SessionProcessor per session id on first use
//! - Routes commands to the session's processor without waiting for them,
//!   so slow sessions never hold up others
//! - Tracks session statistics

use std::{collections::HashMap, sync::Arc};

use ractor::{Actor, ActorProcessingErr, ActorRef, SpawnErr};
use tracing::{Level, event};

use crate::{
    AppContext,
    actor::{
        message::{CommandReply, SessionManagerMessage, SessionProcessorMessage, SessionStats},
        processor::SessionProcessor
    },
    domain::{command::DeskCommand, constant::session_manager, error::DeskError},
    port::command::Command
};

/// SessionManager Actor State - tracks all active sessions and statistics
pub struct SessionManagerState {
    /// Active session processors (session_id -> processor_ref)
    active_sessions:          HashMap<String, ActorRef<SessionProcessorMessage>>,
    /// Shared application context
    app_context:              Arc<AppContext>,
    total_sessions_created:   u64,
    total_commands_processed: u64,
    total_commands_failed:    u64
}

impl SessionManagerState {
    fn stats(&self) -> SessionStats {
        SessionStats {
            active_sessions:          self.active_sessions.len(),
            total_sessions_created:   self.total_sessions_created,
            total_commands_processed: self.total_commands_processed,
            total_commands_failed:    self.total_commands_failed
        }
    }
}

/// SessionManager Actor - Manages desk sessions
pub struct SessionManager;

#[async_trait::async_trait]
impl Actor for SessionManager {
    type Arguments = Arc<AppContext>;
    type Msg = SessionManagerMessage;
    type State = SessionManagerState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        app_context: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = session_manager::MANAGER_STARTED);

        Ok(SessionManagerState {
            active_sessions: HashMap::new(),
            app_context,
            total_sessions_created: 0,
            total_commands_processed: 0,
            total_commands_failed: 0
        })
    }

    async fn post_stop(&self, _myself: ActorRef<Self::Msg>, state: &mut Self::State) -> Result<(), ActorProcessingErr> {
        for (session_id, processor) in state.active_sessions.drain() {
            if let Err(e) = processor.stop_and_wait(None, None).await {
                event!(Level::WARN, event = session_manager::SESSION_CLOSED, session_id = %session_id, error = ?e);
            }
        }
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionManagerMessage::SubmitCommand { command, session_id, reply } => {
                self.handle_submit_command(myself, command, session_id, reply, state).await
            }
            SessionManagerMessage::CommandCompleted { session_id, succeeded } => {
                state.total_commands_processed += 1;
                if !succeeded {
                    state.total_commands_failed += 1;
                }
                event!(Level::DEBUG, event = session_manager::COMMAND_COMPLETED,
                       session_id = %session_id, succeeded = succeeded,
                       total_processed = %state.total_commands_processed);
                Ok(())
            }
            SessionManagerMessage::GetSession { session_id, reply } => {
                if let Err(e) = reply.send(state.active_sessions.get(&session_id).cloned()) {
                    event!(Level::ERROR, event = session_manager::REPLY_FAILED, error = %e);
                }
                Ok(())
            }
            SessionManagerMessage::GetStats { reply } => {
                if let Err(e) = reply.send(state.stats()) {
                    event!(Level::ERROR, event = session_manager::REPLY_FAILED, error = %e);
                }
                Ok(())
            }
        }
    }
}

impl SessionManager {
    async fn handle_submit_command(
        &self,
        myself: ActorRef<SessionManagerMessage>,
        command: DeskCommand,
        session_id: String,
        reply: CommandReply,
        state: &mut SessionManagerState
    ) -> Result<(), ActorProcessingErr> {
        let processor_ref = match state.active_sessions.get(&session_id) {
            Some(existing_processor) => existing_processor.clone(),
            None => match self.spawn_session_processor(&session_id, state.app_context.clone(), myself).await {
                Ok(processor_ref) => {
                    state.active_sessions.insert(session_id.clone(), processor_ref.clone());
                    state.total_sessions_created += 1;

                    event!(Level::DEBUG, event = session_manager::PROCESSOR_SPAWNED,
                           session_id = %session_id,
                           total_sessions = %state.total_sessions_created);

                    processor_ref
                }
                Err(e) => {
                    event!(Level::ERROR, event = session_manager::PROCESSOR_SPAWN_FAILED,
                           session_id = %session_id, error = %e);
                    if let Err(send_err) = reply.send(Err(DeskError::from(e))) {
                        event!(Level::ERROR, event = session_manager::REPLY_FAILED, error = %send_err);
                    }
                    return Ok(());
                }
            }
        };

        event!(Level::DEBUG, event = session_manager::COMMAND_ROUTED,
               session_id = %session_id, command = %command.name());

        // The processor answers the caller directly
        if let Err(e) = processor_ref.cast(SessionProcessorMessage::ProcessCommand { command, reply }) {
            event!(Level::ERROR, event = session_manager::COMMAND_ROUTED, session_id = %session_id, error = %e);
            state.active_sessions.remove(&session_id);
        }

        Ok(())
    }

    async fn spawn_session_processor(
        &self,
        session_id: &str,
        app_context: Arc<AppContext>,
        manager: ActorRef<SessionManagerMessage>
    ) -> Result<ActorRef<SessionProcessorMessage>, SpawnErr> {
        let (processor_ref, _handle) =
            Actor::spawn(None, SessionProcessor, (session_id.to_string(), app_context, manager)).await?;

        Ok(processor_ref)
    }
}
