use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use crate::cli::config::{load_credentials, Credentials};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::session::{AuthController, GateView};
use crate::types::{Event, Guest};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print `data` as JSON, or hand it to `text` for the human-readable form
pub fn output_data<T: Serialize>(output_format: &OutputFormat, data: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text(data),
    }
    Ok(())
}

pub fn print_event(event: &Event) {
    println!("{}  {}", event.id, event.name);
    if let Some(location) = &event.location {
        println!("    at {}", location);
    }
    if let Some(starts_at) = event.starts_at {
        println!("    starts {}", starts_at.format("%Y-%m-%d %H:%M UTC"));
    }
}

pub fn print_guest(guest: &Guest) {
    let status = match guest.checked_in_at {
        Some(at) => format!("checked in {}", at.format("%H:%M:%S")),
        None => "expected".to_string(),
    };
    let email = guest.email.as_deref().map(|e| format!(" <{}>", e)).unwrap_or_default();
    println!("{}  {}{}  [{}]", guest.id, guest.name, email, status);
}

/// Client built from the stored credentials
pub fn connect() -> anyhow::Result<(ApiClient, Credentials)> {
    let credentials = load_credentials()?;
    if credentials.is_expired() {
        tracing::debug!("Stored token has expired");
    }
    let client = ApiClient::new(credentials.server_url.clone(), credentials.token.clone())?;
    Ok((client, credentials))
}

/// Resolve the auth state for `client` and report which view applies
pub async fn open_gate(client: &ApiClient) -> (AuthController, GateView) {
    let client = Arc::new(client.clone());
    let controller = AuthController::new(client.clone(), client);
    let state = controller.resolve().await;
    (controller, GateView::from_state(&state))
}

/// Guard for commands that need a complete profile
pub async fn require_main(client: &ApiClient) -> anyhow::Result<String> {
    let (_, view) = open_gate(client).await;
    match view {
        GateView::Main { display_name } => Ok(display_name),
        GateView::NamePrompt { .. } => Err(anyhow::anyhow!(
            "set a display name first: `checkin auth name <name>` or `checkin start`"
        )),
        GateView::Login | GateView::Loading => Err(anyhow::anyhow!("not signed in; run `checkin auth login <email>`")),
    }
}

/// Print `label` and read one line from `input`; `None` on EOF.
///
/// The caller owns the reader so buffered lines survive between prompts.
pub async fn prompt_line<R>(input: &mut R, label: &str) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    let read = input.read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Buffered stdin for a whole command run
pub fn stdin_reader() -> BufReader<Stdin> {
    BufReader::new(tokio::io::stdin())
}
