//! Core types for chain production controller data.

use core::fmt;
use core::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ParseError, ParseResult};

/// Default plugin identity of the chain production controller.
///
/// This is the name the controller registers under on the printer host. It
/// is used both to build the API path and to match push notifications.
pub const DEFAULT_PLUGIN_ID: &str = "prusa_chain_production";

/// Snapshot of the controller's authoritative state.
///
/// Every field is optional: a field is `None` when the controller has not
/// reported it (before the first successful sync, or when the firmware omits
/// it). `None` means *unknown*, never `false`.
///
/// The JSON representation uses the controller's camelCase keys:
///
/// ```
/// use chainprod_types::DeviceStatus;
///
/// let status = DeviceStatus::from_json(r#"{"errorOrClosed": false, "ejecting": true}"#).unwrap();
/// assert_eq!(status.error_or_closed, Some(false));
/// assert_eq!(status.ejecting, Some(true));
/// assert_eq!(status.fans_on, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// True if the controller's serial connection is absent or faulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_or_closed: Option<bool>,
    /// True while an eject cycle is in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ejecting: Option<bool>,
    /// Cooling fan state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fans_on: Option<bool>,
    /// Indicator LED state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leds_on: Option<bool>,
    /// Seconds left on the cooling countdown, present only while one is active.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_seconds"
    )]
    pub cooling_time_left: Option<u32>,
}

/// Negative counts are clamped to zero; very large ones to `u32::MAX`.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.clamp(0, i64::from(u32::MAX)) as u32))
}

impl DeviceStatus {
    /// A status with every field unknown.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Parse a status from the controller's JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidStatus`] if `body` is not a JSON object
    /// with the expected field types.
    pub fn from_json(body: &str) -> ParseResult<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Parse a status from an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidStatus`] if the value has the wrong shape.
    pub fn from_value(value: Value) -> ParseResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Whether the connection state has been reported.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.error_or_closed.is_some()
    }

    /// Whether the controller is known to be connected and healthy.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.error_or_closed == Some(false)
    }

    /// Whether the controller should be treated as closed.
    ///
    /// Unknown connection state counts as closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.error_or_closed != Some(false)
    }

    /// Fill in a missing `error_or_closed` as `true`.
    ///
    /// A synced snapshot always carries a connection state; a controller that
    /// omits it is treated as faulted.
    #[must_use]
    pub fn with_connection_defaulted(mut self) -> Self {
        if self.error_or_closed.is_none() {
            self.error_or_closed = Some(true);
        }
        self
    }
}

/// Commands understood by the chain production controller.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new commands
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CommandName {
    /// Reset the controller.
    #[serde(rename = "reset")]
    Reset,
    /// Start an eject cycle immediately.
    #[serde(rename = "eject")]
    Eject,
    /// Abort a running eject cycle.
    #[serde(rename = "stop_eject")]
    StopEject,
    /// Run the cooling countdown, then eject.
    #[serde(rename = "coolAndEject")]
    CoolAndEject,
    /// Switch the cooling fan (`enabled` param).
    #[serde(rename = "setFan")]
    SetFan,
    /// Switch the indicator LED (`enabled` param).
    #[serde(rename = "setLed")]
    SetLed,
    /// Open the controller's serial connection.
    #[serde(rename = "connect")]
    Connect,
    /// Close the controller's serial connection.
    #[serde(rename = "disconnect")]
    Disconnect,
}

impl CommandName {
    /// All supported commands.
    pub const ALL: [CommandName; 8] = [
        CommandName::Reset,
        CommandName::Eject,
        CommandName::StopEject,
        CommandName::CoolAndEject,
        CommandName::SetFan,
        CommandName::SetLed,
        CommandName::Connect,
        CommandName::Disconnect,
    ];

    /// The name sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Reset => "reset",
            CommandName::Eject => "eject",
            CommandName::StopEject => "stop_eject",
            CommandName::CoolAndEject => "coolAndEject",
            CommandName::SetFan => "setFan",
            CommandName::SetLed => "setLed",
            CommandName::Connect => "connect",
            CommandName::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ParseError;

    /// Parse a wire command name.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainprod_types::CommandName;
    ///
    /// assert_eq!("coolAndEject".parse::<CommandName>().unwrap(), CommandName::CoolAndEject);
    /// assert!("launch".parse::<CommandName>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseError::UnknownCommand(s.to_string()))
    }
}

/// A command plus its flat key/value parameters.
///
/// Serializes to the body the controller expects, with the name under
/// `"command"` and every parameter at the top level:
///
/// ```
/// use chainprod_types::Command;
///
/// let body = serde_json::to_value(Command::set_fan(true)).unwrap();
/// assert_eq!(body, serde_json::json!({"command": "setFan", "enabled": true}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Which command to run.
    pub name: CommandName,
    /// Extra parameters, flattened into the request body.
    pub params: Map<String, Value>,
}

impl Command {
    /// Create a command without parameters.
    #[must_use]
    pub fn new(name: CommandName) -> Self {
        Self {
            name,
            params: Map::new(),
        }
    }

    /// Add a parameter.
    ///
    /// The key `"command"` is reserved for the command name and is dropped
    /// when the command is serialized.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// `reset`
    #[must_use]
    pub fn reset() -> Self {
        Self::new(CommandName::Reset)
    }

    /// `eject`
    #[must_use]
    pub fn eject() -> Self {
        Self::new(CommandName::Eject)
    }

    /// `stop_eject`
    #[must_use]
    pub fn stop_eject() -> Self {
        Self::new(CommandName::StopEject)
    }

    /// `coolAndEject`
    #[must_use]
    pub fn cool_and_eject() -> Self {
        Self::new(CommandName::CoolAndEject)
    }

    /// `setFan{enabled}`
    #[must_use]
    pub fn set_fan(enabled: bool) -> Self {
        Self::new(CommandName::SetFan).with_param("enabled", enabled)
    }

    /// `setLed{enabled}`
    #[must_use]
    pub fn set_led(enabled: bool) -> Self {
        Self::new(CommandName::SetLed).with_param("enabled", enabled)
    }

    /// `connect`
    #[must_use]
    pub fn connect() -> Self {
        Self::new(CommandName::Connect)
    }

    /// `disconnect`
    #[must_use]
    pub fn disconnect() -> Self {
        Self::new(CommandName::Disconnect)
    }

    /// Look up a boolean parameter.
    #[must_use]
    pub fn bool_param(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self.params.keys().filter(|k| k.as_str() != "command").count();
        let mut map = serializer.serialize_map(Some(extra + 1))?;
        map.serialize_entry("command", self.name.as_str())?;
        for (key, value) in &self.params {
            if key == "command" {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "{{{}}}", params.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_absent_fields_are_unknown() {
        let status = DeviceStatus::from_json("{}").unwrap();
        assert_eq!(status, DeviceStatus::unknown());
        assert!(!status.is_known());
        assert!(status.is_closed());
    }

    #[test]
    fn test_status_full_payload() {
        let status = DeviceStatus::from_json(
            r#"{"errorOrClosed":false,"ejecting":true,"fansOn":true,"ledsOn":false,"coolingTimeLeft":5}"#,
        )
        .unwrap();
        assert_eq!(status.error_or_closed, Some(false));
        assert_eq!(status.ejecting, Some(true));
        assert_eq!(status.fans_on, Some(true));
        assert_eq!(status.leds_on, Some(false));
        assert_eq!(status.cooling_time_left, Some(5));
        assert!(status.is_connected());
    }

    #[test]
    fn test_status_null_is_unknown() {
        let status = DeviceStatus::from_json(r#"{"errorOrClosed":true,"fansOn":null}"#).unwrap();
        assert_eq!(status.fans_on, None);
    }

    #[test]
    fn test_status_negative_cooling_time_clamped() {
        let status = DeviceStatus::from_json(r#"{"coolingTimeLeft":-3}"#).unwrap();
        assert_eq!(status.cooling_time_left, Some(0));
    }

    #[test]
    fn test_status_ignores_unknown_fields() {
        let status = DeviceStatus::from_json(r#"{"errorOrClosed":false,"firmware":"1.2"}"#).unwrap();
        assert!(status.is_connected());
    }

    #[test]
    fn test_status_rejects_wrong_types() {
        let result = DeviceStatus::from_json(r#"{"ejecting":"yes"}"#);
        assert!(matches!(result, Err(ParseError::InvalidStatus(_))));
    }

    #[test]
    fn test_status_serializes_without_unknowns() {
        let status = DeviceStatus {
            error_or_closed: Some(false),
            ejecting: Some(false),
            ..Default::default()
        };
        let value = serde_json::to_value(status).unwrap();
        assert_eq!(value, json!({"errorOrClosed": false, "ejecting": false}));
    }

    #[test]
    fn test_connection_defaulted() {
        let status = DeviceStatus::unknown().with_connection_defaulted();
        assert_eq!(status.error_or_closed, Some(true));

        let status = DeviceStatus {
            error_or_closed: Some(false),
            ..Default::default()
        }
        .with_connection_defaulted();
        assert_eq!(status.error_or_closed, Some(false));
    }

    #[test]
    fn test_command_name_wire_names() {
        for name in CommandName::ALL {
            assert_eq!(name.as_str().parse::<CommandName>().unwrap(), name);
            let serialized = serde_json::to_value(name).unwrap();
            assert_eq!(serialized, json!(name.as_str()));
        }
    }

    #[test]
    fn test_command_without_params() {
        let body = serde_json::to_value(Command::cool_and_eject()).unwrap();
        assert_eq!(body, json!({"command": "coolAndEject"}));
    }

    #[test]
    fn test_command_set_led_params() {
        let command = Command::set_led(false);
        assert_eq!(command.bool_param("enabled"), Some(false));
        let body = serde_json::to_value(&command).unwrap();
        assert_eq!(body, json!({"command": "setLed", "enabled": false}));
    }

    #[test]
    fn test_command_reserved_key_dropped() {
        let command = Command::eject().with_param("command", "other");
        let body = serde_json::to_value(&command).unwrap();
        assert_eq!(body, json!({"command": "eject"}));
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::stop_eject().to_string(), "stop_eject");
        assert_eq!(Command::set_fan(true).to_string(), "setFan{enabled=true}");
    }
}
