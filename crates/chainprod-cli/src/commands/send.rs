//! Command delivery: eject, fan, LED, reset and the connection toggle.

use anyhow::{Context, Result};
use tracing::warn;

use chainprod_core::{ChainClient, ClientConfig, Command, DispatchReport};

use crate::cli::OutputFormat;
use crate::commands::status::render_client;
use crate::format::FormatOptions;

/// Which connection command to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionChoice {
    Connect,
    Disconnect,
    /// Decided from the freshly fetched status.
    Toggle,
}

pub async fn cmd_send(
    config: ClientConfig,
    command: Command,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<()> {
    let client = ChainClient::new(config).context("Invalid client configuration")?;
    send_and_render(&client, command, format, opts).await
}

pub async fn cmd_connection(
    config: ClientConfig,
    choice: ConnectionChoice,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<()> {
    let client = ChainClient::new(config).context("Invalid client configuration")?;
    let command = match choice {
        ConnectionChoice::Connect => Command::connect(),
        ConnectionChoice::Disconnect => Command::disconnect(),
        ConnectionChoice::Toggle => {
            // The toggle reads the model, so it must hold a real status first.
            client
                .start()
                .await
                .context("Failed to read status before toggling the connection")?;
            let report = client
                .toggle_connection()
                .await
                .context("Failed to toggle the connection")?;
            report_refresh(&report);
            print!("{}", render_client(&client, format, opts)?);
            return Ok(());
        }
    };
    send_and_render(&client, command, format, opts).await
}

async fn send_and_render(
    client: &ChainClient,
    command: Command,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<()> {
    let name = command.name;
    let report = client
        .send(command)
        .await
        .with_context(|| format!("Failed to send '{}'", name))?;
    report_refresh(&report);
    print!("{}", render_client(client, format, opts)?);
    Ok(())
}

fn report_refresh(report: &DispatchReport) {
    if let Err(e) = &report.refresh {
        warn!(command = %report.command, error = %e, "Command delivered but the status refresh failed");
    }
}
