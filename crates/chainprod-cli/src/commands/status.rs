//! Status command implementation.

use anyhow::{Context, Result};

use chainprod_core::{ChainClient, ClientConfig};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, StatusReport, format_json, format_view_text};

pub async fn cmd_status(config: ClientConfig, format: OutputFormat, opts: &FormatOptions) -> Result<()> {
    let client = ChainClient::new(config).context("Invalid client configuration")?;
    client
        .start()
        .await
        .with_context(|| format!("Failed to read status from {}", client.config().base_url))?;

    print!("{}", render_client(&client, format, opts)?);
    Ok(())
}

/// Render the client's current state in the requested format.
pub fn render_client(client: &ChainClient, format: OutputFormat, opts: &FormatOptions) -> Result<String> {
    let snapshot = client.snapshot();
    let view = client.view();
    match format {
        OutputFormat::Json => format_json(&StatusReport::new(
            &snapshot,
            &view,
            client.seconds_remaining(),
            client.printer_busy(),
        )),
        OutputFormat::Text => Ok(format_view_text(&snapshot.status, &view, opts)),
    }
}
