//! High-level client for one chain production controller.
//!
//! [`ChainClient`] wires the transport, status model, countdown, command
//! dispatcher and notification listener together and exposes the derived
//! view a UI renders.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use chainprod_types::{Command, DerivedView, DeviceStatus};

use crate::config::ClientConfig;
use crate::countdown::{CountdownController, CountdownState};
use crate::dispatch::{CommandDispatcher, DispatchReport};
use crate::error::{CommandError, Result, SyncError};
use crate::events::{ChainEvent, EventDispatcher, EventReceiver};
use crate::http::HttpTransport;
use crate::model::{StatusModel, StatusSnapshot};
use crate::notify::{Notification, NotificationListener};
use crate::sync::{StatusSynchronizer, SyncOutcome};
use crate::traits::ChainTransport;

/// Client for one chain production controller.
///
/// # Example
///
/// ```no_run
/// use chainprod_core::{ChainClient, ClientConfig};
///
/// # async fn example() -> chainprod_core::Result<()> {
/// let client = ChainClient::new(ClientConfig::new("http://octopi.local"))?;
/// client.start().await?;
/// println!("{}", client.view());
/// client.dispatcher().set_fan(true).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChainClient {
    config: ClientConfig,
    model: Arc<StatusModel>,
    countdown: Arc<CountdownController>,
    synchronizer: Arc<StatusSynchronizer>,
    dispatcher: CommandDispatcher,
    listener: Arc<NotificationListener>,
    events: EventDispatcher,
    printer_busy: AtomicBool,
    cancel: CancellationToken,
}

impl ChainClient {
    /// Create a client that talks HTTP to the configured host.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn ChainTransport>) -> Result<Self> {
        config.validate()?;

        let events = EventDispatcher::new(config.event_capacity);
        let model = Arc::new(StatusModel::new());
        let countdown = Arc::new(CountdownController::new(
            config.tick_interval,
            events.clone(),
        ));
        let synchronizer = Arc::new(StatusSynchronizer::new(
            Arc::clone(&transport),
            Arc::clone(&model),
            Arc::clone(&countdown),
            events.clone(),
        ));
        let dispatcher =
            CommandDispatcher::new(transport, Arc::clone(&synchronizer), events.clone());
        let listener = Arc::new(NotificationListener::new(
            config.plugin_id.clone(),
            Arc::clone(&synchronizer),
            events.clone(),
        ));

        Ok(Self {
            config,
            model,
            countdown,
            synchronizer,
            dispatcher,
            listener,
            events,
            printer_busy: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        })
    }

    /// Announce the client and run the initial refresh.
    pub async fn start(&self) -> std::result::Result<SyncOutcome, SyncError> {
        info!(
            plugin_id = %self.config.plugin_id,
            url = %self.config.base_url,
            "Chain production client started"
        );
        self.synchronizer.refresh().await
    }

    /// Fetch and apply the status once.
    pub async fn refresh(&self) -> std::result::Result<SyncOutcome, SyncError> {
        self.synchronizer.refresh().await
    }

    /// Send a command, then refresh.
    pub async fn send(&self, command: Command) -> std::result::Result<DispatchReport, CommandError> {
        self.dispatcher.send(command).await
    }

    /// Connect if closed, disconnect if open.
    pub async fn toggle_connection(&self) -> std::result::Result<DispatchReport, CommandError> {
        self.dispatcher.toggle_connection().await
    }

    /// Handle one push notification.
    pub async fn notify(
        &self,
        notification: &Notification,
    ) -> Option<std::result::Result<SyncOutcome, SyncError>> {
        self.listener.handle(notification).await
    }

    /// Refresh on every matching notification from `receiver`.
    ///
    /// The task stops when the channel closes or on [`ChainClient::shutdown`].
    pub fn listen(&self, receiver: mpsc::Receiver<Notification>) -> JoinHandle<()> {
        Arc::clone(&self.listener).spawn_channel(receiver, self.cancel.child_token())
    }

    /// The last applied status.
    pub fn status(&self) -> DeviceStatus {
        self.model.status()
    }

    /// The last applied status with its bookkeeping.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.model.snapshot()
    }

    /// Seconds left on the cooling countdown.
    pub fn seconds_remaining(&self) -> u32 {
        self.countdown.seconds_remaining()
    }

    /// Countdown state.
    pub fn countdown_state(&self) -> CountdownState {
        self.countdown.state()
    }

    /// Compute what a UI should show right now.
    pub fn view(&self) -> DerivedView {
        DerivedView::compute(
            &self.model.status(),
            self.countdown.seconds_remaining(),
            self.printer_busy(),
        )
    }

    /// Whether the printer is busy.
    pub fn printer_busy(&self) -> bool {
        self.printer_busy.load(Ordering::SeqCst)
    }

    /// Update the externally supplied printer-busy signal.
    pub fn set_printer_busy(&self, busy: bool) {
        if self.printer_busy.swap(busy, Ordering::SeqCst) != busy {
            debug!(busy, "Printer busy changed");
            self.events.send(ChainEvent::PrinterBusyChanged { busy });
        }
    }

    /// Subscribe to client events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Stop listeners and the countdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.countdown.stop();
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The command dispatcher.
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// The status synchronizer.
    pub fn synchronizer(&self) -> &Arc<StatusSynchronizer> {
        &self.synchronizer
    }

    /// The countdown controller.
    pub fn countdown(&self) -> &Arc<CountdownController> {
        &self.countdown
    }
}

impl Drop for ChainClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
