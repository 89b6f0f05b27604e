use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{save_credentials, Credentials};
use crate::cli::utils::{connect, open_gate, output_data, output_success, prompt_line, stdin_reader};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::session::GateView;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Server URL (defaults to the last one used)")]
        server: Option<String>,
    },

    #[command(about = "Sign out and forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Set the display name for the signed-in organizer")]
    Name {
        #[arg(help = "Display name")]
        name: String,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password, server } => login(email, password, server, output_format).await,
        AuthCommands::Logout => logout(output_format).await,
        AuthCommands::Status => status(output_format).await,
        AuthCommands::Name { name } => set_name(&name, output_format).await,
    }
}

async fn login(
    email: String,
    password: Option<String>,
    server: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let (_, stored) = connect()?;
    let server_url = server.unwrap_or(stored.server_url);

    let password = match password {
        Some(password) => password,
        None => prompt_line(&mut stdin_reader(), "Password: ")
            .await?
            .ok_or_else(|| anyhow::anyhow!("no password given"))?,
    };

    let client = ApiClient::new(server_url.clone(), None)?;
    let grant = client.login(&email, &password).await?;
    save_credentials(&Credentials::signed_in(
        server_url,
        grant.token,
        grant.user.email.clone(),
        grant.expires_in,
    ))?;
    tracing::debug!(user_id = %grant.user.id, "Stored credentials");

    output_success(
        &output_format,
        &format!("Signed in as {}", grant.user.email.as_deref().unwrap_or(&email)),
        Some(json!({ "user": grant.user })),
    )
}

async fn logout(output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, credentials) = connect()?;
    if credentials.token.is_none() {
        return output_success(&output_format, "Already signed out", None);
    }
    let (controller, _) = open_gate(&client).await;

    // Local credentials go regardless of what the server says
    let remote = controller.sign_out().await;
    save_credentials(&credentials.signed_out())?;

    match remote {
        Ok(()) => output_success(&output_format, "Signed out", None),
        Err(e) => output_success(
            &output_format,
            &format!("Signed out locally ({})", e),
            Some(json!({ "remote_revoked": false })),
        ),
    }
}

async fn status(output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, credentials) = connect()?;
    let (controller, view) = open_gate(&client).await;
    let snapshot = controller.snapshot();

    output_data(&output_format, &json!({ "server": credentials.server_url, "auth": snapshot }), |_| {
        println!("Server: {}", credentials.server_url);
        match &view {
            GateView::Main { display_name } => println!("Signed in as {}", display_name),
            GateView::NamePrompt { email } => println!(
                "Signed in as {} (no display name yet; run `checkin auth name <name>`)",
                email.as_deref().unwrap_or("unknown")
            ),
            GateView::Login | GateView::Loading => println!("Not signed in"),
        }
    })
}

async fn set_name(name: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = connect()?;
    let (controller, view) = open_gate(&client).await;

    match view {
        GateView::Login | GateView::Loading => {
            return Err(anyhow::anyhow!("not signed in; run `checkin auth login <email>`"))
        }
        GateView::Main { display_name } => {
            return Err(anyhow::anyhow!("display name is already set to {}", display_name))
        }
        GateView::NamePrompt { .. } => {}
    }

    controller.update_display_name(name).await?;
    output_success(
        &output_format,
        &format!("Display name set to {}", name.trim()),
        Some(json!({ "auth": controller.snapshot() })),
    )
}
