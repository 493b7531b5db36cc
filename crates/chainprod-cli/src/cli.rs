//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reusable host connection arguments
#[derive(Debug, Clone, Args)]
pub struct HostArgs {
    /// Printer host URL, or use CHAINPROD_URL env var
    #[arg(short, long, global = true, env = "CHAINPROD_URL")]
    pub url: Option<String>,

    /// API key for the printer host, or use CHAINPROD_API_KEY env var
    #[arg(short = 'k', long, global = true, env = "CHAINPROD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Plugin identity of the controller
    #[arg(long, global = true)]
    pub plugin_id: Option<String>,

    /// Request timeout in seconds
    #[arg(short = 'T', long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Parser)]
#[command(name = "chainprod")]
#[command(author, version, about = "CLI for the Prusa chain production accessory", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(flatten)]
    pub host: HostArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the controller status once
    Status,

    /// Start ejecting the finished print
    Eject,

    /// Stop an eject in progress
    StopEject,

    /// Wait for the bed to cool, then eject
    CoolAndEject,

    /// Reset the controller
    Reset,

    /// Switch the cooling fans
    Fan {
        /// on or off
        #[arg(required = true, action = ArgAction::Set, value_parser = parse_switch)]
        state: bool,
    },

    /// Switch the LEDs
    Led {
        /// on or off
        #[arg(required = true, action = ArgAction::Set, value_parser = parse_switch)]
        state: bool,
    },

    /// Open the controller's serial link
    Connect,

    /// Close the controller's serial link
    Disconnect,

    /// Connect if closed, disconnect if open
    Toggle,

    /// Continuously monitor the controller
    Watch {
        /// Polling interval in seconds
        #[arg(short, long, default_value = "10")]
        interval: u64,

        /// Treat the printer as busy (disables eject)
        #[arg(long)]
        printer_busy: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Parse an on/off argument with flexible input
pub fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "enable" | "enabled" => Ok(true),
        "off" | "false" | "no" | "0" | "disable" | "disabled" => Ok(false),
        _ => Err(format!("Invalid switch value '{}'. Use: on/off", s)),
    }
}

/// Configuration keys
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    /// Printer host URL
    Url,
    /// API key
    ApiKey,
    /// Plugin identity
    PluginId,
    /// Request timeout in seconds
    Timeout,
    /// Default output format
    Format,
    /// Disable colored output
    NoColor,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
        /// Configuration value
        value: String,
    },

    /// Remove a configuration value
    Unset {
        /// Configuration key to remove
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("on"), Ok(true));
        assert_eq!(parse_switch("OFF"), Ok(false));
        assert_eq!(parse_switch("enabled"), Ok(true));
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_parse_fan_command() {
        let cli = Cli::try_parse_from(["chainprod", "fan", "on", "--url", "http://octopi"]).unwrap();
        assert!(matches!(cli.command, Commands::Fan { state: true }));
        assert_eq!(cli.host.url.as_deref(), Some("http://octopi"));
    }

    #[test]
    fn test_parse_switch_positionals() {
        let cli = Cli::try_parse_from(["chainprod", "led", "off"]).unwrap();
        assert!(matches!(cli.command, Commands::Led { state: false }));
        let cli = Cli::try_parse_from(["chainprod", "fan", "enabled"]).unwrap();
        assert!(matches!(cli.command, Commands::Fan { state: true }));

        assert!(Cli::try_parse_from(["chainprod", "fan"]).is_err());
        assert!(Cli::try_parse_from(["chainprod", "led", "maybe"]).is_err());
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["chainprod", "watch"]).unwrap();
        match cli.command {
            Commands::Watch {
                interval,
                printer_busy,
            } => {
                assert_eq!(interval, 10);
                assert!(!printer_busy);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_parse_kebab_case_commands() {
        let cli = Cli::try_parse_from(["chainprod", "cool-and-eject"]).unwrap();
        assert!(matches!(cli.command, Commands::CoolAndEject));
        let cli = Cli::try_parse_from(["chainprod", "stop-eject"]).unwrap();
        assert!(matches!(cli.command, Commands::StopEject));
    }
}
