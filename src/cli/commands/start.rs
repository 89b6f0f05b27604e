use serde_json::json;
use tokio::io::AsyncBufRead;

use crate::cli::utils::{connect, open_gate, output_data, output_error, prompt_line, stdin_reader};
use crate::cli::OutputFormat;
use crate::session::{AuthController, DisplayNamePrompt, GateView};

/// Run the auth gate: login hint, name prompt, or the organizer's events
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = connect()?;
    let (controller, mut view) = open_gate(&client).await;

    if view.shows_prompt() {
        run_prompt(&controller, &mut stdin_reader(), &output_format).await?;
        view = GateView::from_state(&controller.state());
    }

    match view {
        GateView::Loading | GateView::Login => Err(anyhow::anyhow!("not signed in; run `checkin auth login <email>`")),
        GateView::NamePrompt { .. } => Err(anyhow::anyhow!("profile incomplete; no display name was saved")),
        GateView::Main { display_name } => {
            let events = client.list_events().await?;
            output_data(&output_format, &json!({ "display_name": display_name, "events": events }), |_| {
                println!("Welcome, {}!", display_name);
                if events.is_empty() {
                    println!("No events yet. Create one with `checkin event create <name>`.");
                }
                for event in &events {
                    crate::cli::utils::print_event(event);
                }
            })
        }
    }
}

/// Ask until a name sticks or stdin closes
async fn run_prompt<R>(controller: &AuthController, input: &mut R, output_format: &OutputFormat) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut prompt = DisplayNamePrompt::new();
    prompt.open_for(&controller.state());

    if let Some(email) = prompt.email() {
        eprintln!("Signed in as {}. Choose a display name to continue.", email);
    }

    while prompt.is_open() {
        let Some(line) = prompt_line(input, "Display name: ").await? else {
            break;
        };
        prompt.set_input(line);

        if let Err(e) = prompt.submit(controller).await {
            let hint = if e.is_retryable() { " (try again)" } else { "" };
            output_error(output_format, &format!("{}{}", e, hint), None)?;
        }
    }

    Ok(())
}
