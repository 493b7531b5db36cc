//! Client event system for state-change notifications.
//!
//! Every change that could affect what a UI shows is published here: applied
//! status snapshots, countdown ticks, command outcomes and sync failures.
//! A presentation layer subscribes and recomputes its
//! [`DerivedView`](chainprod_types::DerivedView) on each event instead of
//! polling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use chainprod_types::{CommandName, DeviceStatus};

/// Events emitted by the client.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChainEvent {
    /// A fetched status replaced the model.
    StatusUpdated { seq: u64, status: DeviceStatus },
    /// A fetched status was older than the applied one and was dropped.
    StatusDiscarded { seq: u64, applied_seq: u64 },
    /// A status fetch failed; the model is unchanged.
    SyncFailed { seq: u64, error: String },
    /// The controller acknowledged a command.
    CommandSent { command: CommandName },
    /// A command could not be delivered.
    CommandFailed { command: CommandName, error: String },
    /// The countdown was re-anchored.
    CountdownStarted { seconds: u32 },
    /// The countdown decremented.
    CountdownTick { seconds_remaining: u32 },
    /// The countdown was stopped before running out.
    CountdownStopped,
    /// A push notification for this client arrived.
    NotificationReceived { source: String },
    /// The external printer-busy signal changed.
    PrinterBusyChanged { busy: bool },
}

/// Sender for client events.
pub type EventSender = broadcast::Sender<ChainEvent>;

/// Receiver for client events.
pub type EventReceiver = broadcast::Receiver<ChainEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: ChainEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
