use serde_json::json;
use std::path::Path;
use uuid::Uuid;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;

/// Fetch the guest's QR PNG; the endpoint is public so no sign-in is needed
pub async fn handle(guest_id: &str, out: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let guest_id = Uuid::parse_str(guest_id.trim()).map_err(|e| anyhow::anyhow!("invalid guest id: {}", e))?;
    let (client, _) = connect()?;

    let png = client.qr_png(guest_id).await?;
    tokio::fs::write(out, &png).await?;

    output_success(
        &output_format,
        &format!("Wrote {} ({} bytes)", out.display(), png.len()),
        Some(json!({ "path": out.display().to_string(), "bytes": png.len() })),
    )
}
