use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{connect, output_data, output_success, print_guest, require_main};
use crate::cli::OutputFormat;
use crate::types::NewGuest;

#[derive(Subcommand)]
pub enum GuestCommands {
    #[command(about = "List an event's guests")]
    List {
        #[arg(help = "Event ID")]
        event_id: Uuid,
    },

    #[command(about = "Add a guest to an event")]
    Add {
        #[arg(help = "Event ID")]
        event_id: Uuid,
        #[arg(help = "Guest name")]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },

    #[command(about = "Remove a guest")]
    Remove {
        #[arg(help = "Guest ID")]
        guest_id: Uuid,
    },

    #[command(about = "Check a guest in by ID")]
    CheckIn {
        #[arg(help = "Guest ID")]
        guest_id: Uuid,
    },
}

pub async fn handle(cmd: GuestCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = connect()?;
    require_main(&client).await?;

    match cmd {
        GuestCommands::List { event_id } => {
            let guests = client.list_guests(event_id).await?;
            output_data(&output_format, &guests, |guests| {
                let arrived = guests.iter().filter(|g| g.is_checked_in()).count();
                println!("{} guests, {} checked in", guests.len(), arrived);
                guests.iter().for_each(print_guest);
            })
        }
        GuestCommands::Add { event_id, name, email } => {
            let guest = client.add_guest(event_id, &NewGuest { name, email }).await?;
            output_success(
                &output_format,
                &format!("Added {} ({})", guest.name, guest.id),
                Some(json!({ "guest": guest })),
            )
        }
        GuestCommands::Remove { guest_id } => {
            client.remove_guest(guest_id).await?;
            output_success(&output_format, &format!("Removed guest {}", guest_id), None)
        }
        GuestCommands::CheckIn { guest_id } => {
            let guest = client.check_in(guest_id).await?;
            output_success(
                &output_format,
                &format!("Checked in {}", guest.name),
                Some(json!({ "guest": guest })),
            )
        }
    }
}

/// `checkin scan <code>`
pub async fn scan(code: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = connect()?;
    require_main(&client).await?;

    let guest = client.scan(code).await?;
    output_success(
        &output_format,
        &format!("Welcome, {}!", guest.name),
        Some(json!({ "guest": guest })),
    )
}
