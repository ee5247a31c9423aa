//! Guardian Actor - Root Supervisor
//!
//! The Guardian is the root of the actor hierarchy and manages system-wide concerns:
//! - Spawns and supervises the SessionManager
//! - Handles system initialization and shutdown
//! - Provides health checks

use std::{sync::Arc, time::SystemTime};

use ractor::{
    Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr,
    rpc::{CallResult, call}
};
use tracing::{Level, event};

use crate::{
    AppContext,
    actor::{
        manager::SessionManager,
        message::{CommandReply, GuardianMessage, SessionManagerMessage, SessionProcessorMessage, SessionView, SystemHealth}
    },
    domain::{command::DeskCommand, constant::guardian, error::DeskError}
};

/// Guardian Actor State - tracks child actors and system metrics
pub struct GuardianState {
    app_context:     Arc<AppContext>,
    /// SessionManager actor reference
    session_manager: Option<ActorRef<SessionManagerMessage>>,
    /// System startup time for uptime calculation
    startup_time:    SystemTime
}

/// Guardian Actor - Root supervisor of the actor system
pub struct Guardian;

#[async_trait::async_trait]
impl Actor for Guardian {
    type Arguments = Arc<AppContext>;
    type Msg = GuardianMessage;
    type State = GuardianState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        app_context: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = guardian::GUARDIAN_STARTED);

        Ok(GuardianState { app_context, session_manager: None, startup_time: SystemTime::now() })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            GuardianMessage::Initialize => self.handle_initialize(state).await,
            GuardianMessage::Shutdown { reply } => self.handle_shutdown(reply, state).await,
            GuardianMessage::HealthCheck { reply } => self.handle_health_check(reply, state).await,
            GuardianMessage::SubmitCommand { command, session_id, reply } => {
                self.handle_submit_command(command, session_id, reply, state)
            }
            GuardianMessage::GetSessionView { session_id, reply } => {
                self.handle_get_session_view(session_id, reply, state).await
            }
        }
    }
}

impl Guardian {
    /// Spawn the complete actor system
    pub async fn spawn_system(app_context: Arc<AppContext>) -> Result<ActorRef<GuardianMessage>, SpawnErr> {
        let (guardian_ref, _handle) = Actor::spawn(None, Guardian, app_context).await?;

        // Initialize the system
        if let Err(e) = guardian_ref.cast(GuardianMessage::Initialize) {
            event!(Level::ERROR, event = guardian::GUARDIAN_STARTED, error = %e);
        }

        Ok(guardian_ref)
    }

    /// Initialize child actors
    async fn handle_initialize(&self, state: &mut GuardianState) -> Result<(), ActorProcessingErr> {
        if state.session_manager.is_some() {
            return Ok(());
        }

        event!(Level::DEBUG, event = guardian::CHILDREN_SPAWNING);

        match Actor::spawn(None, SessionManager, state.app_context.clone()).await {
            Ok((session_manager_ref, _handle)) => {
                state.session_manager = Some(session_manager_ref);
                event!(Level::DEBUG, event = guardian::CHILDREN_SPAWNED, actor = "session_manager");
            }
            Err(e) => {
                event!(Level::ERROR, event = guardian::CHILDREN_SPAWN_FAILED, actor = "session_manager", error = %e);
                return Err(ActorProcessingErr::from(format!("failed to spawn session manager: {}", e)));
            }
        }

        event!(Level::INFO, event = guardian::SYSTEM_INITIALIZED);
        Ok(())
    }

    /// Shutdown child actors gracefully
    async fn handle_shutdown(&self, reply: RpcReplyPort<()>, state: &mut GuardianState) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = guardian::SYSTEM_SHUTDOWN_STARTED);

        if let Some(session_manager) = state.session_manager.take()
            && let Err(e) = session_manager.stop_and_wait(None, None).await
        {
            event!(Level::WARN, event = guardian::SYSTEM_SHUTDOWN_STARTED, actor = "session_manager", error = ?e);
        }

        event!(Level::INFO, event = guardian::SYSTEM_SHUTDOWN_COMPLETED);
        if let Err(e) = reply.send(()) {
            event!(Level::ERROR, event = guardian::REPLY_FAILED, error = %e);
        }
        Ok(())
    }

    /// Handle health check requests
    async fn handle_health_check(
        &self,
        reply: RpcReplyPort<SystemHealth>,
        state: &GuardianState
    ) -> Result<(), ActorProcessingErr> {
        let uptime_seconds = state.startup_time.elapsed().unwrap_or_default().as_secs();

        let stats = match &state.session_manager {
            Some(session_manager) => {
                match call(session_manager, |reply| SessionManagerMessage::GetStats { reply }, None).await {
                    Ok(CallResult::Success(stats)) => stats,
                    _ => Default::default()
                }
            }
            None => Default::default()
        };

        let health = SystemHealth {
            active_sessions: stats.active_sessions,
            total_commands_processed: stats.total_commands_processed,
            uptime_seconds
        };

        event!(Level::DEBUG, event = guardian::HEALTH_CHECK_COMPLETED,
               active_sessions = %health.active_sessions, uptime_seconds = %uptime_seconds);

        if let Err(e) = reply.send(health) {
            event!(Level::ERROR, event = guardian::REPLY_FAILED, error = %e);
        }

        Ok(())
    }

    /// Look up a session's processor and ask it what it shows
    async fn handle_get_session_view(
        &self,
        session_id: String,
        reply: RpcReplyPort<Option<SessionView>>,
        state: &GuardianState
    ) -> Result<(), ActorProcessingErr> {
        let processor = match &state.session_manager {
            Some(session_manager) => {
                match call(session_manager, |reply| SessionManagerMessage::GetSession { session_id, reply }, None).await {
                    Ok(CallResult::Success(processor)) => processor,
                    _ => None
                }
            }
            None => None
        };

        let view = match processor {
            Some(processor) => match call(&processor, |reply| SessionProcessorMessage::GetView { reply }, None).await {
                Ok(CallResult::Success(view)) => Some(view),
                _ => None
            },
            None => None
        };

        if let Err(e) = reply.send(view) {
            event!(Level::ERROR, event = guardian::REPLY_FAILED, error = %e);
        }
        Ok(())
    }

    /// Hand the command to the session manager; the session's processor replies
    fn handle_submit_command(
        &self,
        command: DeskCommand,
        session_id: String,
        reply: CommandReply,
        state: &GuardianState
    ) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = guardian::COMMAND_SUBMITTED, session_id = %session_id);

        match &state.session_manager {
            Some(session_manager) => {
                if let Err(e) = session_manager.cast(SessionManagerMessage::SubmitCommand { command, session_id, reply }) {
                    event!(Level::ERROR, event = guardian::COMMAND_SUBMITTED, error = %e);
                }
            }
            None => {
                if let Err(e) = reply.send(Err(DeskError::Generic("actor system is not initialized".to_string()))) {
                    event!(Level::ERROR, event = guardian::REPLY_FAILED, error = %e);
                }
            }
        }

        Ok(())
    }
}
