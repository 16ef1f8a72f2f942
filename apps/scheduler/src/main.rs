use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{EventCollectionController, EventIntent, EventStore, EventView, HttpEventStore};
use shared::{
    domain::EventId,
    protocol::{CreateEventData, UpdateEventData},
    validation::{validate_create, validate_update},
};

mod config;
mod views;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "scheduler", about = "Organize your events with ease")]
struct Cli {
    /// Base url of the event service, e.g. http://localhost:5000/api/v1
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show upcoming (non-archived) events
    List,
    /// Show archived events
    Archived,
    /// Schedule a new event
    Add {
        #[arg(long)]
        title: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change some fields of an event
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Move an event to the archive
    Archive { id: String },
    /// Bring an archived event back
    Unarchive { id: String },
    /// Remove an event permanently
    Delete { id: String },
}

impl Command {
    fn view(&self) -> EventView {
        match self {
            Command::Archived | Command::Unarchive { .. } => EventView::Archived,
            _ => EventView::Scheduled,
        }
    }

    /// The intent to dispatch after the initial fetch. Form input is validated here,
    /// before anything reaches the store.
    fn into_intent(self) -> Result<Option<EventIntent>> {
        let intent = match self {
            Command::List | Command::Archived => None,
            Command::Add {
                title,
                date,
                time,
                notes,
            } => {
                let data = CreateEventData {
                    title: title.trim().to_string(),
                    date,
                    time,
                    notes: notes.filter(|notes| !notes.trim().is_empty()),
                };
                if let Err(errors) = validate_create(&data) {
                    bail!("invalid event:\n{}", views::render_form_errors(&errors));
                }
                Some(EventIntent::Create(data))
            }
            Command::Update {
                id,
                title,
                date,
                time,
                notes,
            } => {
                let data = UpdateEventData {
                    title,
                    date,
                    time,
                    notes,
                    ..UpdateEventData::default()
                };
                if data.is_empty() {
                    bail!("nothing to update; pass at least one of --title, --date, --time, --notes");
                }
                if let Err(errors) = validate_update(&data) {
                    bail!("invalid event:\n{}", views::render_form_errors(&errors));
                }
                Some(EventIntent::Update {
                    id: EventId(id),
                    data,
                })
            }
            Command::Archive { id } => Some(EventIntent::Archive(EventId(id))),
            Command::Unarchive { id } => Some(EventIntent::Unarchive(EventId(id))),
            Command::Delete { id } => Some(EventIntent::Delete(EventId(id))),
        };
        Ok(intent)
    }
}

/// Mounts the view and applies the intent. A view that could not be fetched is left
/// alone, so its banner reports the fetch failure and nothing is changed remotely.
async fn run<S: EventStore>(
    store: S,
    view: EventView,
    intent: Option<EventIntent>,
) -> EventCollectionController<S> {
    let mut controller = EventCollectionController::mount(store, view).await;
    match intent {
        Some(intent) if controller.error().is_some() => {
            tracing::warn!(intent = intent.name(), "skipping intent after failed fetch");
        }
        Some(intent) => controller.dispatch(intent).await,
        None => {}
    }
    controller
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.api_url);
    let view = cli.command.view();
    let intent = cli.command.into_intent()?;
    tracing::debug!(api_url = %settings.api_url, ?view, "connecting to event service");

    let store = HttpEventStore::new(&settings.api_url)
        .with_context(|| format!("cannot use event service at {}", settings.api_url))?;
    let controller = run(store, view, intent).await;

    print!("{}", views::render(&controller));
    Ok(if controller.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
