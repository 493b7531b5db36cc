//! UI-facing labels derived from a [`DeviceStatus`].
//!
//! Everything here is a pure function of its inputs. A presentation layer
//! should call [`DerivedView::compute`] whenever the status, the countdown or
//! the printer-busy signal changes, and never keep the result around as a
//! source of truth.
//!
//! Labels carry semantic values only (`"EJECTING"`, `"-"`, ...). Translating
//! them for display is up to the caller.

use core::fmt;

use serde::Serialize;

use crate::types::DeviceStatus;

/// Placeholder rendered for any unknown or unavailable value.
pub const UNKNOWN_LABEL: &str = "-";

/// Which connection command the connect/disconnect button would send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionAction {
    /// The controller is closed, errored or unknown.
    Connect,
    /// The controller is connected.
    Disconnect,
}

impl fmt::Display for ConnectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionAction::Connect => write!(f, "Connect"),
            ConnectionAction::Disconnect => write!(f, "Disconnect"),
        }
    }
}

/// Eject cycle indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EjectLabel {
    /// Closed, errored or not reported.
    Unknown,
    /// An eject cycle is running.
    Ejecting,
    /// No eject cycle is running.
    Idle,
}

impl fmt::Display for EjectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EjectLabel::Unknown => f.write_str(UNKNOWN_LABEL),
            EjectLabel::Ejecting => write!(f, "EJECTING"),
            EjectLabel::Idle => write!(f, "IDLE"),
        }
    }
}

/// On/off indicator for the fan and the LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SwitchLabel {
    /// Closed, errored or not reported.
    Unknown,
    On,
    Off,
}

impl fmt::Display for SwitchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchLabel::Unknown => f.write_str(UNKNOWN_LABEL),
            SwitchLabel::On => write!(f, "ON"),
            SwitchLabel::Off => write!(f, "OFF"),
        }
    }
}

/// Cooling countdown display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "seconds", rename_all = "snake_case")]
pub enum CoolingTime {
    /// Nothing to show.
    Inactive,
    /// Seconds left, as last predicted.
    Remaining(u32),
}

impl fmt::Display for CoolingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoolingTime::Inactive => f.write_str(UNKNOWN_LABEL),
            CoolingTime::Remaining(seconds) => f.write_str(&format_duration(u64::from(*seconds))),
        }
    }
}

/// Label of the connect/disconnect action.
#[must_use]
pub fn connection_label(status: &DeviceStatus) -> ConnectionAction {
    if status.is_closed() {
        ConnectionAction::Connect
    } else {
        ConnectionAction::Disconnect
    }
}

/// Eject cycle label.
#[must_use]
pub fn eject_label(status: &DeviceStatus) -> EjectLabel {
    if status.is_closed() {
        return EjectLabel::Unknown;
    }
    match status.ejecting {
        Some(true) => EjectLabel::Ejecting,
        Some(false) => EjectLabel::Idle,
        None => EjectLabel::Unknown,
    }
}

fn switch_label(status: &DeviceStatus, flag: Option<bool>) -> SwitchLabel {
    if status.is_closed() {
        return SwitchLabel::Unknown;
    }
    match flag {
        Some(true) => SwitchLabel::On,
        Some(false) => SwitchLabel::Off,
        None => SwitchLabel::Unknown,
    }
}

/// Fan label.
#[must_use]
pub fn fan_label(status: &DeviceStatus) -> SwitchLabel {
    switch_label(status, status.fans_on)
}

/// LED label.
#[must_use]
pub fn led_label(status: &DeviceStatus) -> SwitchLabel {
    switch_label(status, status.leds_on)
}

/// Whether an eject may be started.
///
/// Requires the printer to be idle, the controller to be known-connected and
/// known not to be ejecting already.
#[must_use]
pub fn eject_enabled(status: &DeviceStatus, printer_busy: bool) -> bool {
    !printer_busy && status.error_or_closed == Some(false) && status.ejecting == Some(false)
}

/// Cooling countdown value for display.
///
/// Shows nothing only when the controller is not ejecting and the countdown
/// has run out; otherwise shows the predicted seconds, even zero.
#[must_use]
pub fn cooling_time(status: &DeviceStatus, seconds_remaining: u32) -> CoolingTime {
    if status.ejecting != Some(true) && seconds_remaining == 0 {
        CoolingTime::Inactive
    } else {
        CoolingTime::Remaining(seconds_remaining)
    }
}

/// Format a second count in human-readable form.
///
/// ```
/// use chainprod_types::view::format_duration;
///
/// assert_eq!(format_duration(42), "42s");
/// assert_eq!(format_duration(65), "1m 05s");
/// assert_eq!(format_duration(3720), "1h 02m");
/// ```
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// All UI bindings for one moment in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedView {
    pub connection: ConnectionAction,
    pub eject: EjectLabel,
    pub fan: SwitchLabel,
    pub led: SwitchLabel,
    pub eject_enabled: bool,
    pub cooling_time: CoolingTime,
}

impl DerivedView {
    /// Compute every binding from the current inputs.
    ///
    /// ```
    /// use chainprod_types::{DerivedView, DeviceStatus};
    ///
    /// let status = DeviceStatus {
    ///     error_or_closed: Some(false),
    ///     ejecting: Some(true),
    ///     fans_on: Some(true),
    ///     leds_on: Some(false),
    ///     cooling_time_left: Some(5),
    /// };
    /// let view = DerivedView::compute(&status, 5, false);
    /// assert_eq!(view.eject.to_string(), "EJECTING");
    /// assert_eq!(view.fan.to_string(), "ON");
    /// assert_eq!(view.led.to_string(), "OFF");
    /// assert_eq!(view.cooling_time.to_string(), "5s");
    /// ```
    #[must_use]
    pub fn compute(status: &DeviceStatus, seconds_remaining: u32, printer_busy: bool) -> Self {
        Self {
            connection: connection_label(status),
            eject: eject_label(status),
            fan: fan_label(status),
            led: led_label(status),
            eject_enabled: eject_enabled(status, printer_busy),
            cooling_time: cooling_time(status, seconds_remaining),
        }
    }
}

impl fmt::Display for DerivedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "eject={} fan={} led={} cooling={} eject_enabled={} action={}",
            self.eject, self.fan, self.led, self.cooling_time, self.eject_enabled, self.connection
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A closed or faulted controller never shows a state label.
        #[test]
        fn closed_controller_labels_are_placeholders(
            ejecting in proptest::option::of(any::<bool>()),
            fans_on in proptest::option::of(any::<bool>()),
            leds_on in proptest::option::of(any::<bool>()),
            cooling_time_left in proptest::option::of(any::<u32>()),
            seconds in any::<u32>(),
            printer_busy in any::<bool>(),
        ) {
            let status = DeviceStatus {
                error_or_closed: Some(true),
                ejecting,
                fans_on,
                leds_on,
                cooling_time_left,
            };
            let view = DerivedView::compute(&status, seconds, printer_busy);
            prop_assert_eq!(view.eject.to_string(), "-");
            prop_assert_eq!(view.fan.to_string(), "-");
            prop_assert_eq!(view.led.to_string(), "-");
            prop_assert!(!view.eject_enabled);
            prop_assert_eq!(view.connection, ConnectionAction::Connect);
        }

        /// A busy printer always disables eject.
        #[test]
        fn busy_printer_disables_eject(
            error_or_closed in proptest::option::of(any::<bool>()),
            ejecting in proptest::option::of(any::<bool>()),
        ) {
            let status = DeviceStatus { error_or_closed, ejecting, ..Default::default() };
            prop_assert!(!eject_enabled(&status, true));
        }
    }
}
