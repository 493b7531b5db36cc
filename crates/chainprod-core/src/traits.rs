//! Trait abstraction for reaching the chain production controller.
//!
//! This module provides the [`ChainTransport`] trait that abstracts over the
//! real HTTP transport and the mock controller used in tests.

use async_trait::async_trait;

use chainprod_types::{Command, DeviceStatus};

use crate::error::{SyncError, TransportError};

/// Trait abstracting the controller's two endpoints.
///
/// Implementations only move data; they never touch client state. The
/// synchronizer and dispatcher decide what a fetched status or a failed
/// command means.
///
/// # Example
///
/// ```ignore
/// use chainprod_core::ChainTransport;
///
/// async fn is_ejecting<T: ChainTransport>(transport: &T) -> bool {
///     matches!(transport.fetch_status().await, Ok(s) if s.ejecting == Some(true))
/// }
/// ```
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Fetch the controller's current status.
    ///
    /// Absent fields in the response stay `None`.
    async fn fetch_status(&self) -> Result<DeviceStatus, SyncError>;

    /// Send a command and wait for the host to acknowledge it.
    ///
    /// The acknowledgement carries no status; callers refresh separately.
    async fn send_command(&self, command: &Command) -> Result<(), TransportError>;

    /// Human-readable location of the controller, for logs.
    fn endpoint(&self) -> &str;
}
