//! # Event Desk CLI Application
//!
//! A command-line front-end for the event directory and its registrations.
//!
//! ## Usage
//!
//! ```bash
//! # Events open for registration
//! eventdesk event list
//!
//! # Sign in and publish an event
//! eventdesk auth login --email staff@uni.example
//! eventdesk event create --title "Rust Night" --starts-at 2026-11-03T18:00 \
//!     --ends-at 2026-11-03T21:00 --venue "Lab 2" --capacity 40
//! eventdesk event toggle <ID>
//!
//! # Register for it
//! eventdesk event register <ID> --name "Ana Lima" --email ana@uni.example \
//!     --student-id 2024001 --course "Computer Science"
//! ```
//!
//! Every invocation runs one command in a session named `cli`.

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use eventdesk::{
    AppContext,
    actor::{Guardian, GuardianMessage},
    cli::{prompt, render},
    config,
    domain::{
        command::{
            AuthCommands, DeskCli, DeskCliCommand, DeskCommand, DeskOutcome, EventCommands, RegisterAccountCommand,
            SignInAnonymouslyCommand, SignInWithCredentialsCommand, SignInWithProviderCommand, SignOutCommand,
            StorageCommands, WhoAmICommand
        },
        error::DeskError
    }
};
use ractor::{
    ActorRef,
    rpc::{CallResult, call}
};

const SESSION_ID: &str = "cli";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = DeskCli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: DeskCli) -> Result<(), DeskError> {
    let mut config = config::load_config()?;
    if let Some(store) = cli.store {
        config.store = store;
    }
    init_tracing(&config.log_level);

    let command = match cli.command {
        DeskCliCommand::Storage { command } => return run_storage_command(command, &config),
        DeskCliCommand::Event { command } => {
            if let EventCommands::Delete { id, yes: false } = &command
                && !prompt::confirm_deletion(id)?
            {
                println!("Deletion cancelled.");
                return Ok(());
            }
            command.into_command()
        }
        DeskCliCommand::Auth { command } => auth_command(command)?
    };

    let app_context = Arc::new(AppContext::init(config).await?);
    let guardian_ref = Guardian::spawn_system(app_context)
        .await
        .map_err(|e| DeskError::Generic(format!("Failed to start actor system: {}", e)))?;

    let result = submit_command_to_actor_system(&guardian_ref, command).await;
    shutdown(&guardian_ref).await;

    println!("{}", render::outcome(&result?));
    Ok(())
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into())
        )
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = installed {
        tracing::debug!(error = %e, "keeping the tracing subscriber that is already installed");
    }
}

fn run_storage_command(command: StorageCommands, config: &config::Config) -> Result<(), DeskError> {
    match command {
        StorageCommands::Set { backend } => {
            config::set_store(backend)?;
            println!("Storage backend set to {}.", backend);
        }
        StorageCommands::Current => println!("Current storage backend: {}", config.store)
    }
    Ok(())
}

fn auth_command(command: AuthCommands) -> Result<DeskCommand, DeskError> {
    let command = match command {
        AuthCommands::Anonymous => SignInAnonymouslyCommand.into(),
        AuthCommands::Provider { name } => SignInWithProviderCommand { provider: name }.into(),
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt::password("Password")?
            };
            SignInWithCredentialsCommand { email, password }.into()
        }
        AuthCommands::Register { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt::password("Choose a password")?
            };
            RegisterAccountCommand { email, password }.into()
        }
        AuthCommands::Logout => SignOutCommand.into(),
        AuthCommands::Whoami => WhoAmICommand.into()
    };
    Ok(command)
}

async fn submit_command_to_actor_system(
    guardian_ref: &ActorRef<GuardianMessage>,
    command: DeskCommand
) -> Result<DeskOutcome, DeskError> {
    let session_id = SESSION_ID.to_string();
    match call(guardian_ref, |reply| GuardianMessage::SubmitCommand { command, session_id, reply }, None).await {
        Ok(CallResult::Success(result)) => result,
        Ok(CallResult::Timeout) => Err(DeskError::Generic("Command timed out".to_string())),
        Ok(CallResult::SenderError) => Err(DeskError::Generic("The session stopped before answering".to_string())),
        Err(e) => Err(DeskError::Generic(format!("Failed to submit command: {}", e)))
    }
}

async fn shutdown(guardian_ref: &ActorRef<GuardianMessage>) {
    if let Err(e) = call(guardian_ref, |reply| GuardianMessage::Shutdown { reply }, None).await {
        eprintln!("Failed to shut down cleanly: {}", e);
    }
    guardian_ref.stop(None);
}
