//! The client's single source of truth for the last applied status.
//!
//! Writes are ordered by the sequence number a refresh took when it was
//! issued, not by when its response arrived. A response older than the one
//! already applied is dropped, so a slow request can never overwrite a newer
//! snapshot.

use std::sync::RwLock;

use serde::Serialize;
use time::OffsetDateTime;

use chainprod_types::DeviceStatus;

/// A copy of the model at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// The last applied status. All fields unknown until the first sync.
    pub status: DeviceStatus,
    /// Sequence number of the refresh that produced `status` (0 = never synced).
    pub seq: u64,
    /// When `status` was applied.
    #[serde(with = "time::serde::rfc3339::option")]
    pub synced_at: Option<OffsetDateTime>,
    /// Number of snapshots applied so far.
    pub sync_count: u64,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            status: DeviceStatus::unknown(),
            seq: 0,
            synced_at: None,
            sync_count: 0,
        }
    }
}

/// Result of offering a fetched status to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The status replaced the model.
    Applied,
    /// A newer response was already applied.
    Stale {
        /// Sequence number of the snapshot currently held.
        applied_seq: u64,
    },
}

/// Holds the last applied [`DeviceStatus`].
#[derive(Debug, Default)]
pub struct StatusModel {
    inner: RwLock<StatusSnapshot>,
}

impl StatusModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current status.
    pub fn status(&self) -> DeviceStatus {
        self.read().status
    }

    /// A full copy of the model.
    pub fn snapshot(&self) -> StatusSnapshot {
        *self.read()
    }

    /// Sequence number of the applied snapshot.
    pub fn applied_seq(&self) -> u64 {
        self.read().seq
    }

    /// Replace the status if `seq` is newer than the applied one.
    ///
    /// `on_applied` runs while the write lock is still held, so anything it
    /// updates stays consistent with the snapshot even when responses race.
    /// It must not call back into the model.
    pub(crate) fn apply_with<F>(&self, seq: u64, status: DeviceStatus, on_applied: F) -> ApplyOutcome
    where
        F: FnOnce(&DeviceStatus),
    {
        let mut inner = self
            .inner
            .write()
            .expect("status model lock poisoned - a thread panicked while holding the lock");

        if seq <= inner.seq {
            return ApplyOutcome::Stale {
                applied_seq: inner.seq,
            };
        }

        *inner = StatusSnapshot {
            status,
            seq,
            synced_at: Some(OffsetDateTime::now_utc()),
            sync_count: inner.sync_count + 1,
        };
        on_applied(&inner.status);
        ApplyOutcome::Applied
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StatusSnapshot> {
        self.inner
            .read()
            .expect("status model lock poisoned - a thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ejecting() -> DeviceStatus {
        DeviceStatus {
            error_or_closed: Some(false),
            ejecting: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_unknown() {
        let model = StatusModel::new();
        let snapshot = model.snapshot();
        assert_eq!(snapshot.status, DeviceStatus::unknown());
        assert_eq!(snapshot.seq, 0);
        assert!(snapshot.synced_at.is_none());
        assert_eq!(snapshot.sync_count, 0);
    }

    #[test]
    fn test_apply_replaces_whole_status() {
        let model = StatusModel::new();
        let first = DeviceStatus {
            fans_on: Some(true),
            ..ejecting()
        };
        assert_eq!(model.apply_with(1, first, |_| {}), ApplyOutcome::Applied);

        // Fields absent from the newer snapshot do not survive from the older one.
        let second = DeviceStatus {
            error_or_closed: Some(false),
            ..Default::default()
        };
        assert_eq!(model.apply_with(2, second, |_| {}), ApplyOutcome::Applied);
        assert_eq!(model.status(), second);
        assert_eq!(model.status().fans_on, None);
        assert_eq!(model.snapshot().sync_count, 2);
        assert!(model.snapshot().synced_at.is_some());
    }

    #[test]
    fn test_older_response_is_stale() {
        let model = StatusModel::new();
        model.apply_with(5, ejecting(), |_| {});

        let mut called = false;
        let outcome = model.apply_with(3, DeviceStatus::default(), |_| called = true);
        assert_eq!(outcome, ApplyOutcome::Stale { applied_seq: 5 });
        assert!(!called);
        assert_eq!(model.status(), ejecting());
        assert_eq!(model.applied_seq(), 5);
    }

    #[test]
    fn test_same_seq_is_stale() {
        let model = StatusModel::new();
        model.apply_with(1, ejecting(), |_| {});
        assert!(matches!(
            model.apply_with(1, DeviceStatus::default(), |_| {}),
            ApplyOutcome::Stale { .. }
        ));
    }

    #[test]
    fn test_callback_sees_applied_status() {
        let model = StatusModel::new();
        let mut seen = None;
        model.apply_with(1, ejecting(), |s| seen = Some(*s));
        assert_eq!(seen, Some(ejecting()));
    }
}
