//! rollcall - command line access to the events service.
//!
//! Lists and creates events and manages their participants. The service
//! origin comes from `ROLLCALL_API_URL` (a `.env` file is honoured) or the
//! config file; the stored token is sent as a bearer credential.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollcall_core::auth::{FileCredentials, KeyringCredentials};
use rollcall_core::config::CredentialBackend;
use rollcall_core::{Config, CredentialStore, EventClient, EventDraft, ResourceId, RoleResolver};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rollcall", version, about = "Manage events and their participants")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all events
    Events,
    /// Show one event
    Show { id: ResourceId },
    /// Create an event
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Register a participant for an event
    Register { event: ResourceId, name: String },
    /// Confirm a participant
    Confirm {
        event: ResourceId,
        participant: ResourceId,
    },
    /// Remove a participant from an event
    Remove {
        event: ResourceId,
        participant: ResourceId,
    },
    /// Store the token issued by the login service
    Login { token: String },
    /// Forget the stored token
    Logout,
    /// Show the roles carried by the stored token
    Whoami,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn credential_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    Ok(match config.credential_store {
        CredentialBackend::Keyring => Arc::new(KeyringCredentials),
        CredentialBackend::File => Arc::new(FileCredentials::new(config.cache_dir()?)),
    })
}

fn client(config: &Config, credentials: &dyn CredentialStore) -> Result<EventClient> {
    let mut client = EventClient::from_config(config)?;
    if let Some(token) = credentials.get_credential() {
        client.set_token(token);
    }
    Ok(client)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_written(result: Option<serde_json::Value>, done: &str) -> Result<()> {
    match result {
        Some(body) => print_json(&body),
        None => {
            println!("{}", done);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    let credentials = credential_store(&config)?;

    match cli.command {
        Command::Events => {
            let client = client(&config, credentials.as_ref())?;
            client.fetch_events().await;
            let snapshot = client.events().snapshot();
            for event in &snapshot.data {
                let id = event.id().map(|id| id.to_string()).unwrap_or_default();
                println!(
                    "{:>6}  {:<12}  {}  ({} confirmed, {} pending)",
                    id,
                    event.formatted_date(),
                    event.display_name(),
                    event.confirmed_count(),
                    event.pending_count()
                );
            }
            eprintln!("{} events, refreshed {}", snapshot.data.len(), snapshot.age_display());
        }
        Command::Show { id } => {
            let client = client(&config, credentials.as_ref())?;
            match client.get_event_by_id(id.clone()).await {
                Some(event) => {
                    println!("{}  {}", event.display_name(), event.formatted_date());
                    if let Some(location) = event.location() {
                        println!("at {}", location);
                    }
                    if let Some(description) = event.description() {
                        println!("{}", description);
                    }
                    for participant in event.participants() {
                        let mark = if participant.confirmed { "x" } else { " " };
                        println!("  [{}] {}", mark, participant.display_name());
                    }
                }
                None => println!("Event {} not found", id),
            }
        }
        Command::Create {
            name,
            description,
            date,
            location,
        } => {
            let client = client(&config, credentials.as_ref())?;
            let event = EventDraft {
                description,
                date,
                location,
                ..EventDraft::new(name)
            };
            let created = client.create_event(&event).await?;
            print_json(&created)?;
        }
        Command::Register { event, name } => {
            let client = client(&config, credentials.as_ref())?;
            let result = client.register_for_event(event, &name).await?;
            print_written(result, "Registered")?;
        }
        Command::Confirm { event, participant } => {
            let client = client(&config, credentials.as_ref())?;
            let result = client.confirm_participation(event, participant, true).await?;
            print_written(result, "Confirmed")?;
        }
        Command::Remove { event, participant } => {
            let client = client(&config, credentials.as_ref())?;
            let result = client.remove_participant(event, participant).await?;
            print_written(result, "Removed")?;
        }
        Command::Login { token } => {
            credentials.store(token.trim())?;
            info!("Stored credential");
            println!("Logged in");
        }
        Command::Logout => {
            credentials.clear()?;
            println!("Logged out");
        }
        Command::Whoami => {
            let resolver = RoleResolver::new(Arc::new(credentials.clone()))
                .with_privileged_role(config.privileged_role());
            let roles: Vec<String> = resolver.roles().into_iter().collect();
            if roles.is_empty() {
                println!("No roles");
            } else {
                println!("Roles: {}", roles.join(", "));
            }
            println!("Privileged: {}", resolver.is_privileged());
        }
    }

    Ok(())
}
