//! Command implementations for the CLI.

mod config;
mod send;
mod status;
mod watch;

pub use config::cmd_config;
pub use send::{ConnectionChoice, cmd_connection, cmd_send};
pub use status::cmd_status;
pub use watch::{WatchArgs, cmd_watch};
