//! Push notifications from the printer host.
//!
//! The host multiplexes notifications from all of its plugins on one push
//! channel. A frame for a plugin looks like
//! `{"plugin": {"plugin": "<identity>", "data": ...}}`. Only frames whose
//! identity matches ours trigger a refresh; the payload is never
//! interpreted.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::error::SyncError;
use crate::events::{ChainEvent, EventDispatcher};
use crate::sync::{StatusSynchronizer, SyncOutcome};

/// A notification from one of the host's plugins.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Identity of the plugin that sent it.
    pub source: String,
    /// Opaque payload.
    pub payload: Value,
}

impl Notification {
    /// Create a notification.
    pub fn new(source: impl Into<String>, payload: Value) -> Self {
        Self {
            source: source.into(),
            payload,
        }
    }

    /// Extract a plugin notification from a push frame.
    ///
    /// Returns `None` for frames of any other kind (`current`, `history`,
    /// `event`, ...).
    ///
    /// ```
    /// use chainprod_core::Notification;
    /// use serde_json::json;
    ///
    /// let frame = json!({"plugin": {"plugin": "prusa_chain_production", "data": {}}});
    /// let n = Notification::from_push_frame(&frame).unwrap();
    /// assert_eq!(n.source, "prusa_chain_production");
    ///
    /// assert!(Notification::from_push_frame(&json!({"current": {}})).is_none());
    /// ```
    pub fn from_push_frame(frame: &Value) -> Option<Self> {
        let inner = frame.get("plugin")?;
        let source = inner.get("plugin")?.as_str()?;
        let payload = inner.get("data").cloned().unwrap_or(Value::Null);
        Some(Self::new(source, payload))
    }

    /// Parse a push frame from its JSON text.
    pub fn from_push_json(text: &str) -> Option<Self> {
        let frame: Value = serde_json::from_str(text).ok()?;
        Self::from_push_frame(&frame)
    }
}

/// Sender half of a notification channel.
pub type NotificationSender = mpsc::Sender<Notification>;

/// Refreshes the status when a notification for this client arrives.
#[derive(Debug)]
pub struct NotificationListener {
    plugin_id: String,
    synchronizer: Arc<StatusSynchronizer>,
    events: EventDispatcher,
}

impl NotificationListener {
    /// Create a listener for notifications from `plugin_id`.
    pub fn new(
        plugin_id: impl Into<String>,
        synchronizer: Arc<StatusSynchronizer>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            synchronizer,
            events,
        }
    }

    /// The identity this listener accepts.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Whether a notification is addressed to this client.
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.source == self.plugin_id
    }

    /// Handle one notification.
    ///
    /// Returns `None` if the notification came from another plugin,
    /// otherwise the result of the refresh it triggered.
    pub async fn handle(
        &self,
        notification: &Notification,
    ) -> Option<Result<SyncOutcome, SyncError>> {
        if !self.matches(notification) {
            trace!(source = %notification.source, "Ignoring notification from other plugin");
            return None;
        }
        debug!(source = %notification.source, "Notification received");
        self.events.send(ChainEvent::NotificationReceived {
            source: notification.source.clone(),
        });
        Some(self.synchronizer.refresh().await)
    }

    /// Consume a stream of notifications until it ends or `cancel` fires.
    ///
    /// Notifications are handled one at a time in arrival order.
    pub fn spawn<S>(self: Arc<Self>, stream: S, cancel: CancellationToken) -> JoinHandle<()>
    where
        S: Stream<Item = Notification> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            info!(plugin_id = %self.plugin_id, "Listening for notifications");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Notification listener cancelled");
                        break;
                    }
                    next = stream.next() => match next {
                        Some(notification) => {
                            // Errors are already logged and published by the synchronizer.
                            let _ = self.handle(&notification).await;
                        }
                        None => {
                            debug!("Notification stream ended");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Consume notifications from an mpsc channel.
    pub fn spawn_channel(
        self: Arc<Self>,
        receiver: mpsc::Receiver<Notification>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let stream = futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|n| (n, rx))
        });
        self.spawn(stream, cancel)
    }
}
