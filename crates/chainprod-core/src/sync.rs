//! Status synchronization.
//!
//! [`StatusSynchronizer::refresh`] fetches the controller status, applies it
//! to the [`StatusModel`] and re-anchors the [`CountdownController`]. Refreshes
//! may overlap (mount, post-command, push notification); each one takes a
//! sequence number before its request is issued and the model only accepts
//! responses newer than what it holds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use chainprod_types::DeviceStatus;

use crate::countdown::CountdownController;
use crate::error::SyncError;
use crate::events::{ChainEvent, EventDispatcher};
use crate::model::{ApplyOutcome, StatusModel};
use crate::traits::ChainTransport;

/// What a successful fetch did to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The fetched status replaced the model.
    Applied(DeviceStatus),
    /// A newer response had already been applied; this one was dropped.
    Stale {
        /// Sequence number of the dropped response.
        seq: u64,
        /// Sequence number of the snapshot the model holds.
        applied_seq: u64,
    },
}

impl SyncOutcome {
    /// The applied status, if this refresh won.
    pub fn applied(&self) -> Option<&DeviceStatus> {
        match self {
            Self::Applied(status) => Some(status),
            Self::Stale { .. } => None,
        }
    }

    /// Whether the response was dropped as stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Fetches status and keeps the model and countdown consistent with it.
pub struct StatusSynchronizer {
    transport: Arc<dyn ChainTransport>,
    model: Arc<StatusModel>,
    countdown: Arc<CountdownController>,
    events: EventDispatcher,
    next_seq: AtomicU64,
}

impl std::fmt::Debug for StatusSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSynchronizer")
            .field("endpoint", &self.transport.endpoint())
            .field("next_seq", &self.next_seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl StatusSynchronizer {
    /// Create a synchronizer over the given transport and shared state.
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        model: Arc<StatusModel>,
        countdown: Arc<CountdownController>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            transport,
            model,
            countdown,
            events,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Fetch the status once and apply it.
    ///
    /// On success the model is replaced wholesale and the countdown is
    /// re-anchored:
    /// - `coolingTimeLeft` present: restart at that value
    /// - absent and `ejecting == true`: keep counting
    /// - otherwise: stop
    ///
    /// A response missing `errorOrClosed` is treated as closed.
    ///
    /// On failure nothing changes; the error is logged, published and
    /// returned. There is no retry.
    pub async fn refresh(&self) -> Result<SyncOutcome, SyncError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!(seq, endpoint = self.transport.endpoint(), "Refreshing status");

        let status = match self.transport.fetch_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(seq, error = %e, "Status refresh failed");
                self.events.send(ChainEvent::SyncFailed {
                    seq,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        if !status.is_known() {
            warn!(seq, "Status has no errorOrClosed field; treating controller as closed");
        }
        let status = status.with_connection_defaulted();

        match self
            .model
            .apply_with(seq, status, |applied| self.reconcile_countdown(applied))
        {
            ApplyOutcome::Applied => {
                info!(seq, ?status, "Status updated");
                self.events.send(ChainEvent::StatusUpdated { seq, status });
                Ok(SyncOutcome::Applied(status))
            }
            ApplyOutcome::Stale { applied_seq } => {
                debug!(seq, applied_seq, "Discarding stale status response");
                self.events
                    .send(ChainEvent::StatusDiscarded { seq, applied_seq });
                Ok(SyncOutcome::Stale { seq, applied_seq })
            }
        }
    }

    /// The model this synchronizer writes to.
    pub fn model(&self) -> &Arc<StatusModel> {
        &self.model
    }

    /// Number of refreshes issued so far.
    pub fn issued(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst) - 1
    }

    fn reconcile_countdown(&self, status: &DeviceStatus) {
        match status.cooling_time_left {
            Some(seconds) => self.countdown.restart(seconds),
            None if status.ejecting == Some(true) => {}
            None => self.countdown.stop(),
        }
    }
}
