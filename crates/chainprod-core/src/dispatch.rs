//! Command dispatch.
//!
//! Every command is followed by exactly one status refresh, whether the
//! controller accepted it or not. The refresh is what brings the model back
//! in line with the hardware; the command response itself carries no status.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use chainprod_types::{Command, CommandName};

use crate::error::{CommandError, SyncError};
use crate::events::{ChainEvent, EventDispatcher};
use crate::model::StatusModel;
use crate::sync::{StatusSynchronizer, SyncOutcome};
use crate::traits::ChainTransport;

/// Result of a delivered command.
#[derive(Debug)]
pub struct DispatchReport {
    /// The command that was delivered.
    pub command: CommandName,
    /// Outcome of the refresh that followed it.
    pub refresh: Result<SyncOutcome, SyncError>,
}

/// Sends commands to the controller and refreshes afterwards.
pub struct CommandDispatcher {
    transport: Arc<dyn ChainTransport>,
    synchronizer: Arc<StatusSynchronizer>,
    events: EventDispatcher,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("endpoint", &self.transport.endpoint())
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    /// Create a dispatcher sharing the synchronizer's transport.
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        synchronizer: Arc<StatusSynchronizer>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            transport,
            synchronizer,
            events,
        }
    }

    /// Send a command, then refresh once.
    ///
    /// A delivery failure is returned as [`CommandError`] after the refresh
    /// has run. A refresh failure after a delivered command is reported in
    /// [`DispatchReport::refresh`]; the command itself still succeeded.
    pub async fn send(&self, command: Command) -> Result<DispatchReport, CommandError> {
        info!(%command, "Sending command");
        let sent = self.transport.send_command(&command).await;

        match &sent {
            Ok(()) => {
                debug!(command = %command.name, "Command acknowledged");
                self.events.send(ChainEvent::CommandSent {
                    command: command.name,
                });
            }
            Err(e) => {
                warn!(command = %command.name, error = %e, "Command failed");
                self.events.send(ChainEvent::CommandFailed {
                    command: command.name,
                    error: e.to_string(),
                });
            }
        }

        let refresh = self.synchronizer.refresh().await;

        match sent {
            Ok(()) => Ok(DispatchReport {
                command: command.name,
                refresh,
            }),
            Err(e) => Err(CommandError::new(command.name, e)),
        }
    }

    /// Send a command by name with raw parameters.
    pub async fn send_named(
        &self,
        name: CommandName,
        params: Map<String, Value>,
    ) -> Result<DispatchReport, CommandError> {
        self.send(Command { name, params }).await
    }

    /// `reset`
    pub async fn reset(&self) -> Result<DispatchReport, CommandError> {
        self.send(Command::reset()).await
    }

    /// `eject`
    pub async fn eject(&self) -> Result<DispatchReport, CommandError> {
        self.send(Command::eject()).await
    }

    /// `stop_eject`
    pub async fn stop_eject(&self) -> Result<DispatchReport, CommandError> {
        self.send(Command::stop_eject()).await
    }

    /// `coolAndEject`
    pub async fn cool_and_eject(&self) -> Result<DispatchReport, CommandError> {
        self.send(Command::cool_and_eject()).await
    }

    /// `setFan` with `enabled`.
    pub async fn set_fan(&self, enabled: bool) -> Result<DispatchReport, CommandError> {
        self.send(Command::set_fan(enabled)).await
    }

    /// `setLed` with `enabled`.
    pub async fn set_led(&self, enabled: bool) -> Result<DispatchReport, CommandError> {
        self.send(Command::set_led(enabled)).await
    }

    /// `connect`
    pub async fn connect(&self) -> Result<DispatchReport, CommandError> {
        self.send(Command::connect()).await
    }

    /// `disconnect`
    pub async fn disconnect(&self) -> Result<DispatchReport, CommandError> {
        self.send(Command::disconnect()).await
    }

    /// Connect when the model says closed (or unknown), disconnect otherwise.
    pub async fn toggle_connection(&self) -> Result<DispatchReport, CommandError> {
        let command = toggle_command(self.model());
        self.send(command).await
    }

    fn model(&self) -> &StatusModel {
        self.synchronizer.model()
    }
}

/// The command the connection toggle would send right now.
pub fn toggle_command(model: &StatusModel) -> Command {
    if model.status().is_closed() {
        Command::connect()
    } else {
        Command::disconnect()
    }
}
