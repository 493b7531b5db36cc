mod cli;
mod commands;
mod config;
mod format;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use chainprod_core::Command;

use cli::{Cli, Commands};
use commands::{
    ConnectionChoice, WatchArgs, cmd_config, cmd_connection, cmd_send, cmd_status, cmd_watch,
};
use config::{Config, resolve_client_config, resolve_format};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "chainprod", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let file_config = Config::load();
    let opts = FormatOptions::new(cli.no_color || file_config.no_color);
    let format = resolve_format(cli.json, &file_config);
    let client_config = resolve_client_config(&cli.host, &file_config);

    match cli.command {
        Commands::Status => cmd_status(client_config, format, &opts).await?,
        Commands::Eject => cmd_send(client_config, Command::eject(), format, &opts).await?,
        Commands::StopEject => {
            cmd_send(client_config, Command::stop_eject(), format, &opts).await?
        }
        Commands::CoolAndEject => {
            cmd_send(client_config, Command::cool_and_eject(), format, &opts).await?
        }
        Commands::Reset => cmd_send(client_config, Command::reset(), format, &opts).await?,
        Commands::Fan { state } => {
            cmd_send(client_config, Command::set_fan(state), format, &opts).await?
        }
        Commands::Led { state } => {
            cmd_send(client_config, Command::set_led(state), format, &opts).await?
        }
        Commands::Connect => {
            cmd_connection(client_config, ConnectionChoice::Connect, format, &opts).await?
        }
        Commands::Disconnect => {
            cmd_connection(client_config, ConnectionChoice::Disconnect, format, &opts).await?
        }
        Commands::Toggle => {
            cmd_connection(client_config, ConnectionChoice::Toggle, format, &opts).await?
        }
        Commands::Watch {
            interval,
            printer_busy,
        } => {
            cmd_watch(
                client_config,
                WatchArgs {
                    interval,
                    printer_busy,
                    format,
                    opts: &opts,
                },
            )
            .await?
        }
        Commands::Config { action } => cmd_config(action)?,
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }

    Ok(())
}
