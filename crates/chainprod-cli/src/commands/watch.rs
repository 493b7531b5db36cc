//! Watch command implementation.
//!
//! Polls the controller on a fixed interval and prints a line whenever the
//! status changes or the cooling countdown ticks. Runs until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use time::OffsetDateTime;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use chainprod_core::{ChainClient, ChainEvent, ClientConfig, SharedClient};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, StatusReport, format_watch_line};

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub interval: u64,
    pub printer_busy: bool,
    pub format: OutputFormat,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch(config: ClientConfig, args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        interval,
        printer_busy,
        format,
        opts,
    } = args;

    if interval == 0 {
        bail!("interval must be > 0");
    }

    let client: SharedClient =
        Arc::new(ChainClient::new(config).context("Invalid client configuration")?);
    let mut events = client.subscribe();
    client.set_printer_busy(printer_busy);

    eprintln!(
        "Watching {} every {}s (Ctrl+C to stop)",
        client.config().base_url,
        interval
    );

    if let Err(e) = client.start().await {
        warn!(error = %e, "Initial refresh failed, will retry");
    }
    print!("{}", render_line(&client, format, opts)?);

    let period = Duration::from_secs(interval);
    let mut poll = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                break;
            }
            _ = poll.tick() => {
                if !spawn_refresh(&client, &mut in_flight) {
                    debug!("Previous refresh still in flight, skipping poll");
                }
            }
            event = events.recv() => match event {
                Ok(event) if prints_line(&event) => {
                    print!("{}", render_line(&client, format, opts)?);
                }
                Ok(event) => debug!(?event, "Event"),
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "Watch fell behind on events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    if let Some(task) = in_flight.take() {
        task.abort();
    }
    client.shutdown();
    Ok(())
}

/// Start a background refresh unless the previous one is still running.
///
/// Returns whether a refresh was started.
fn spawn_refresh(client: &SharedClient, in_flight: &mut Option<JoinHandle<()>>) -> bool {
    if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
        return false;
    }
    let client = Arc::clone(client);
    *in_flight = Some(tokio::spawn(async move {
        if let Err(e) = client.refresh().await {
            warn!(error = %e, "Refresh failed");
        }
    }));
    true
}

fn prints_line(event: &ChainEvent) -> bool {
    matches!(
        event,
        ChainEvent::StatusUpdated { .. }
            | ChainEvent::CountdownTick { .. }
            | ChainEvent::PrinterBusyChanged { .. }
    )
}

fn timestamp(now: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second())
}

fn render_line(client: &ChainClient, format: OutputFormat, opts: &FormatOptions) -> Result<String> {
    let view = client.view();
    match format {
        OutputFormat::Text => Ok(format_watch_line(
            &timestamp(OffsetDateTime::now_utc()),
            &view,
            opts,
        )),
        OutputFormat::Json => {
            let snapshot = client.snapshot();
            let report = StatusReport::new(
                &snapshot,
                &view,
                client.seconds_remaining(),
                client.printer_busy(),
            );
            Ok(format!("{}\n", serde_json::to_string(&report)?))
        }
    }
}
