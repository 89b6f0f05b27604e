use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{connect, output_data, output_success, print_event, require_main};
use crate::cli::OutputFormat;
use crate::types::{EventPatch, NewEvent};

#[derive(Subcommand)]
pub enum EventCommands {
    #[command(about = "List your events")]
    List,

    #[command(about = "Show one event")]
    Show {
        #[arg(help = "Event ID")]
        id: Uuid,
    },

    #[command(about = "Create an event")]
    Create {
        #[arg(help = "Event name")]
        name: String,
        #[arg(long, help = "Venue")]
        location: Option<String>,
        #[arg(long, help = "Start time, RFC 3339 (e.g. 2026-05-01T18:00:00Z)")]
        starts_at: Option<DateTime<Utc>>,
    },

    #[command(about = "Update an event; an empty --location clears it")]
    Update {
        #[arg(help = "Event ID")]
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        starts_at: Option<DateTime<Utc>>,
    },

    #[command(about = "Delete an event and its guest list")]
    Delete {
        #[arg(help = "Event ID")]
        id: Uuid,
    },
}

pub async fn handle(cmd: EventCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = connect()?;
    require_main(&client).await?;

    match cmd {
        EventCommands::List => {
            let events = client.list_events().await?;
            output_data(&output_format, &events, |events| {
                if events.is_empty() {
                    println!("No events");
                }
                events.iter().for_each(print_event);
            })
        }
        EventCommands::Show { id } => {
            let event = client.get_event(id).await?;
            output_data(&output_format, &event, print_event)
        }
        EventCommands::Create {
            name,
            location,
            starts_at,
        } => {
            let event = client
                .create_event(&NewEvent {
                    name,
                    location,
                    starts_at,
                })
                .await?;
            output_success(
                &output_format,
                &format!("Created event {} ({})", event.name, event.id),
                Some(json!({ "event": event })),
            )
        }
        EventCommands::Update {
            id,
            name,
            location,
            starts_at,
        } => {
            let patch = EventPatch {
                name,
                location,
                starts_at,
            };
            if patch.is_empty() {
                return Err(anyhow::anyhow!("nothing to update; pass --name, --location or --starts-at"));
            }
            let event = client.update_event(id, &patch).await?;
            output_success(
                &output_format,
                &format!("Updated event {}", event.id),
                Some(json!({ "event": event })),
            )
        }
        EventCommands::Delete { id } => {
            client.delete_event(id).await?;
            output_success(&output_format, &format!("Deleted event {}", id), None)
        }
    }
}
