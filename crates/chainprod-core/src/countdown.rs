//! Local countdown of the remaining cooling time.
//!
//! The controller reports `coolingTimeLeft` only when polled. Between polls
//! the client counts down locally at a fixed tick period and re-anchors the
//! count whenever a fresh value arrives. At most one tick task is armed at a
//! time: every restart bumps a generation counter and cancels the previous
//! task, and a tick from an older generation is ignored even if it raced the
//! cancellation.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::events::{ChainEvent, EventDispatcher};

/// Whether the countdown is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownState {
    /// Not counting; the remaining time is 0.
    Idle,
    /// Counting down, or waiting at 0 for the next restart.
    Running,
}

/// A spawned tick task. Dropping the handle cancels the task.
#[derive(Debug)]
struct TickTask {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug)]
struct Inner {
    seconds_remaining: u32,
    state: CountdownState,
    generation: u64,
    task: Option<TickTask>,
}

/// Counts the cooling time down once per tick.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use chainprod_core::{CountdownController, EventDispatcher};
///
/// # async fn example() {
/// let countdown = CountdownController::new(Duration::from_secs(1), EventDispatcher::default());
/// countdown.restart(30);
/// tokio::time::sleep(Duration::from_millis(2_100)).await;
/// assert_eq!(countdown.seconds_remaining(), 28);
/// # }
/// ```
#[derive(Debug)]
pub struct CountdownController {
    inner: Arc<Mutex<Inner>>,
    tick_interval: Duration,
    events: EventDispatcher,
}

impl CountdownController {
    /// Create an idle countdown.
    pub fn new(tick_interval: Duration, events: EventDispatcher) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                seconds_remaining: 0,
                state: CountdownState::Idle,
                generation: 0,
                task: None,
            })),
            tick_interval,
            events,
        }
    }

    /// Re-anchor the countdown at `seconds` and start ticking.
    ///
    /// Any previously armed tick is cancelled first. With `seconds == 0`
    /// the state becomes `Running` but no tick is armed.
    ///
    /// Must be called from within a Tokio runtime for ticks to happen; outside
    /// one the value is set and a warning is logged.
    pub fn restart(&self, seconds: u32) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.task = None;
        inner.seconds_remaining = seconds;
        inner.state = CountdownState::Running;
        if seconds > 0 {
            inner.task = self.arm(inner.generation);
        }
        debug!(seconds, generation = inner.generation, "Countdown restarted");
        self.events.send(ChainEvent::CountdownStarted { seconds });
    }

    /// Cancel any armed tick and reset to idle at 0.
    pub fn stop(&self) {
        let mut inner = self.lock();
        let was_active = inner.state == CountdownState::Running || inner.task.is_some();
        inner.generation += 1;
        inner.task = None;
        inner.seconds_remaining = 0;
        inner.state = CountdownState::Idle;
        if was_active {
            debug!("Countdown stopped");
            self.events.send(ChainEvent::CountdownStopped);
        }
    }

    /// Seconds left on the countdown.
    pub fn seconds_remaining(&self) -> u32 {
        self.lock().seconds_remaining
    }

    /// Current state.
    pub fn state(&self) -> CountdownState {
        self.lock().state
    }

    /// Whether a tick task is currently scheduled.
    pub fn is_armed(&self) -> bool {
        self.lock().task.is_some()
    }

    /// The configured tick period.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    fn arm(&self, generation: u64) -> Option<TickTask> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No Tokio runtime available; countdown will not tick");
                return None;
            }
        };

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let period = self.tick_interval;
        // Anchored at restart, not at the task's first poll.
        let first_tick = Instant::now() + period;

        let task = handle.spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => {
                        trace!(generation, "Countdown tick task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !tick(&inner, generation, &events) {
                            break;
                        }
                    }
                }
            }
        });

        Some(TickTask {
            cancel,
            _task: task,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

impl Drop for CountdownController {
    fn drop(&mut self) {
        // The tick task holds its own reference to `inner`; cancel it explicitly.
        if let Ok(mut inner) = self.inner.lock() {
            inner.task = None;
        }
    }
}

/// Apply one tick. Returns `false` when the task should exit.
fn tick(inner: &Mutex<Inner>, generation: u64, events: &EventDispatcher) -> bool {
    let mut inner = lock(inner);
    if inner.generation != generation {
        return false;
    }

    inner.seconds_remaining = inner.seconds_remaining.saturating_sub(1);
    let remaining = inner.seconds_remaining;
    trace!(remaining, "Countdown tick");
    events.send(ChainEvent::CountdownTick {
        seconds_remaining: remaining,
    });

    if remaining == 0 {
        inner.state = CountdownState::Idle;
        // Detaches this task; it is about to return anyway.
        inner.task = None;
        debug!("Countdown reached zero");
        return false;
    }
    true
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner
        .lock()
        .expect("countdown lock poisoned - a thread panicked while holding the lock")
}
