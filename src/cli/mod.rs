pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "checkin")]
#[command(about = "Guest check-in CLI - manage events, guest lists and door check-in")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, sign out and profile")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Resolve the session and finish the profile interactively")]
    Start,

    #[command(about = "Event management")]
    Event {
        #[command(subcommand)]
        cmd: commands::event::EventCommands,
    },

    #[command(about = "Guest list management")]
    Guest {
        #[command(subcommand)]
        cmd: commands::guest::GuestCommands,
    },

    #[command(about = "Check a guest in from a scanned QR payload")]
    Scan {
        #[arg(help = "Scanned code, e.g. checkin:<guest id>")]
        code: String,
    },

    #[command(about = "Download a guest's QR code as PNG")]
    Qr {
        #[arg(help = "Guest ID")]
        guest_id: String,
        #[arg(long, help = "Output file", default_value = "guest-qr.png")]
        out: std::path::PathBuf,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Start => commands::start::handle(output_format).await,
        Commands::Event { cmd } => commands::event::handle(cmd, output_format).await,
        Commands::Guest { cmd } => commands::guest::handle(cmd, output_format).await,
        Commands::Scan { code } => commands::guest::scan(&code, output_format).await,
        Commands::Qr { guest_id, out } => commands::qr::handle(&guest_id, &out, output_format).await,
    }
}
