//! Mock controller for testing without a printer host.
//!
//! [`MockController`] implements [`ChainTransport`] with an in-memory status.
//! Commands update that status the way the real accessory would, so a client
//! driven by the mock behaves like one talking to hardware.
//!
//! # Features
//!
//! - **Scripted responses**: queue statuses with individual delays to make
//!   responses arrive out of order
//! - **Failure injection**: fail fetches or commands, permanently or for the
//!   next N calls
//! - **Latency simulation**: delay every call
//! - **Call recording**: count fetches and keep every command received
//!
//! # Example
//!
//! ```
//! use chainprod_core::{ChainTransport, MockControllerBuilder};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mock = MockControllerBuilder::new().connected(true).fans_on(false).build();
//! let status = mock.fetch_status().await.unwrap();
//! assert_eq!(status.fans_on, Some(false));
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chainprod_types::{Command, CommandName, DeviceStatus};

use crate::error::{SyncError, TransportError};
use crate::traits::ChainTransport;

/// One scripted status response.
#[derive(Debug, Clone)]
struct ScriptedResponse {
    status: Result<DeviceStatus, String>,
    delay: Duration,
}

/// A mock chain production controller.
#[derive(Debug)]
pub struct MockController {
    endpoint: String,
    status: RwLock<DeviceStatus>,
    scripted: std::sync::Mutex<VecDeque<ScriptedResponse>>,
    commands: RwLock<Vec<Command>>,
    fetch_count: AtomicU32,
    command_count: AtomicU32,
    fail_fetch: AtomicBool,
    fail_commands: AtomicBool,
    remaining_fetch_failures: AtomicU32,
    remaining_command_failures: AtomicU32,
    fail_message: RwLock<String>,
    latency_ms: AtomicU64,
    simulate_effects: AtomicBool,
    cooling_seconds: AtomicU32,
}

impl Default for MockController {
    fn default() -> Self {
        MockControllerBuilder::new().build()
    }
}

impl MockController {
    /// Create a mock with all fields unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status served by subsequent fetches.
    pub async fn set_status(&self, status: DeviceStatus) {
        *self.status.write().await = status;
    }

    /// The status currently held by the mock.
    pub async fn current_status(&self) -> DeviceStatus {
        *self.status.read().await
    }

    /// Queue a status to be returned by a future fetch after `delay`.
    ///
    /// Queued responses are consumed in the order fetches start, before the
    /// mock falls back to its current status.
    pub fn push_response(&self, status: DeviceStatus, delay: Duration) {
        self.push(ScriptedResponse {
            status: Ok(status),
            delay,
        });
    }

    /// Queue a failing fetch that resolves after `delay`.
    pub fn push_failure(&self, message: &str, delay: Duration) {
        self.push(ScriptedResponse {
            status: Err(message.to_string()),
            delay,
        });
    }

    /// Make every fetch fail.
    pub async fn set_fail_fetch(&self, fail: bool, message: Option<&str>) {
        self.fail_fetch.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Make every command fail.
    pub async fn set_fail_commands(&self, fail: bool, message: Option<&str>) {
        self.fail_commands.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Fail the next `count` fetches, then succeed.
    pub fn set_transient_fetch_failures(&self, count: u32) {
        self.remaining_fetch_failures.store(count, Ordering::Relaxed);
    }

    /// Fail the next `count` commands, then succeed.
    pub fn set_transient_command_failures(&self, count: u32) {
        self.remaining_command_failures
            .store(count, Ordering::Relaxed);
    }

    /// Set simulated latency for every call.
    ///
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Whether commands change the served status.
    pub fn set_simulate_effects(&self, enabled: bool) {
        self.simulate_effects.store(enabled, Ordering::Relaxed);
    }

    /// Number of status fetches started.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of commands received, including failed ones.
    pub fn command_count(&self) -> u32 {
        self.command_count.load(Ordering::Relaxed)
    }

    /// Reset both call counters.
    pub fn reset_counts(&self) {
        self.fetch_count.store(0, Ordering::Relaxed);
        self.command_count.store(0, Ordering::Relaxed);
    }

    /// Every command received, in order.
    pub async fn commands(&self) -> Vec<Command> {
        self.commands.read().await.clone()
    }

    /// The most recent command received.
    pub async fn last_command(&self) -> Option<Command> {
        self.commands.read().await.last().cloned()
    }

    fn push(&self, response: ScriptedResponse) {
        self.scripted
            .lock()
            .expect("mock script lock poisoned - a thread panicked while holding the lock")
            .push_back(response);
    }

    fn next_scripted(&self) -> Option<ScriptedResponse> {
        self.scripted
            .lock()
            .expect("mock script lock poisoned - a thread panicked while holding the lock")
            .pop_front()
    }

    async fn simulate_latency(&self) {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    async fn injected_failure(&self, permanent: &AtomicBool, remaining: &AtomicU32) -> Option<String> {
        // Check for transient failures first
        let transient = remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if transient || permanent.load(Ordering::Relaxed) {
            Some(self.fail_message.read().await.clone())
        } else {
            None
        }
    }

    async fn apply_effects(&self, command: &Command) {
        if !self.simulate_effects.load(Ordering::Relaxed) {
            return;
        }
        let mut status = self.status.write().await;
        match command.name {
            CommandName::Eject => {
                status.ejecting = Some(true);
                status.cooling_time_left = None;
            }
            CommandName::CoolAndEject => {
                status.ejecting = Some(true);
                status.cooling_time_left = Some(self.cooling_seconds.load(Ordering::Relaxed));
            }
            CommandName::StopEject | CommandName::Reset => {
                status.ejecting = Some(false);
                status.cooling_time_left = None;
            }
            CommandName::SetFan => {
                if let Some(enabled) = command.bool_param("enabled") {
                    status.fans_on = Some(enabled);
                }
            }
            CommandName::SetLed => {
                if let Some(enabled) = command.bool_param("enabled") {
                    status.leds_on = Some(enabled);
                }
            }
            CommandName::Connect => status.error_or_closed = Some(false),
            CommandName::Disconnect => status.error_or_closed = Some(true),
            _ => {}
        }
    }
}

#[async_trait]
impl ChainTransport for MockController {
    async fn fetch_status(&self) -> Result<DeviceStatus, SyncError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if let Some(scripted) = self.next_scripted() {
            if !scripted.delay.is_zero() {
                tokio::time::sleep(scripted.delay).await;
            }
            return scripted
                .status
                .map_err(|msg| TransportError::InvalidResponse(msg).into());
        }

        self.simulate_latency().await;
        if let Some(msg) = self
            .injected_failure(&self.fail_fetch, &self.remaining_fetch_failures)
            .await
        {
            return Err(TransportError::InvalidResponse(msg).into());
        }
        Ok(*self.status.read().await)
    }

    async fn send_command(&self, command: &Command) -> Result<(), TransportError> {
        self.command_count.fetch_add(1, Ordering::Relaxed);
        self.commands.write().await.push(command.clone());

        self.simulate_latency().await;
        if let Some(msg) = self
            .injected_failure(&self.fail_commands, &self.remaining_command_failures)
            .await
        {
            return Err(TransportError::ApiError {
                status: 500,
                message: msg,
            });
        }
        self.apply_effects(command).await;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Builder for creating mock controllers with custom settings.
#[derive(Debug, Clone)]
pub struct MockControllerBuilder {
    endpoint: String,
    status: DeviceStatus,
    latency: Duration,
    simulate_effects: bool,
    cooling_seconds: u32,
}

impl Default for MockControllerBuilder {
    fn default() -> Self {
        Self {
            endpoint: "mock://prusa_chain_production".to_string(),
            status: DeviceStatus::unknown(),
            latency: Duration::ZERO,
            simulate_effects: true,
            cooling_seconds: 120,
        }
    }
}

impl MockControllerBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint reported in logs.
    #[must_use]
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Set the whole initial status.
    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    /// Set whether the serial link is open.
    #[must_use]
    pub fn connected(mut self, connected: bool) -> Self {
        self.status.error_or_closed = Some(!connected);
        self
    }

    /// Set the ejecting flag.
    #[must_use]
    pub fn ejecting(mut self, ejecting: bool) -> Self {
        self.status.ejecting = Some(ejecting);
        self
    }

    /// Set the fan flag.
    #[must_use]
    pub fn fans_on(mut self, on: bool) -> Self {
        self.status.fans_on = Some(on);
        self
    }

    /// Set the LED flag.
    #[must_use]
    pub fn leds_on(mut self, on: bool) -> Self {
        self.status.leds_on = Some(on);
        self
    }

    /// Set the reported cooling time.
    #[must_use]
    pub fn cooling_time_left(mut self, seconds: u32) -> Self {
        self.status.cooling_time_left = Some(seconds);
        self
    }

    /// Set the cooling time reported after `coolAndEject`.
    #[must_use]
    pub fn cooling_seconds(mut self, seconds: u32) -> Self {
        self.cooling_seconds = seconds;
        self
    }

    /// Set latency for every call.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set whether commands change the served status.
    #[must_use]
    pub fn simulate_effects(mut self, enabled: bool) -> Self {
        self.simulate_effects = enabled;
        self
    }

    /// Build the mock controller.
    #[must_use]
    pub fn build(self) -> MockController {
        MockController {
            endpoint: self.endpoint,
            status: RwLock::new(self.status),
            scripted: std::sync::Mutex::new(VecDeque::new()),
            commands: RwLock::new(Vec::new()),
            fetch_count: AtomicU32::new(0),
            command_count: AtomicU32::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_commands: AtomicBool::new(false),
            remaining_fetch_failures: AtomicU32::new(0),
            remaining_command_failures: AtomicU32::new(0),
            fail_message: RwLock::new("Mock failure".to_string()),
            latency_ms: AtomicU64::new(self.latency.as_millis() as u64),
            simulate_effects: AtomicBool::new(self.simulate_effects),
            cooling_seconds: AtomicU32::new(self.cooling_seconds),
        }
    }
}
