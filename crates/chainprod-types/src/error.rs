//! Error types for data parsing in chainprod-types.

use thiserror::Error;

/// Errors that can occur when parsing data received from the chain
/// production controller.
///
/// This error type is transport-agnostic and does not include HTTP
/// errors (those belong in chainprod-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The status body was not valid JSON or had the wrong shape.
    #[error("Invalid status payload: {0}")]
    InvalidStatus(#[from] serde_json::Error),

    /// A command name that the controller does not understand.
    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),

    /// A value that parsed but is outside its allowed range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using chainprod-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_display() {
        let err = ParseError::UnknownCommand("launch".to_string());
        assert_eq!(err.to_string(), "Unknown command: 'launch'");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ParseError = json_err.into();
        assert!(matches!(err, ParseError::InvalidStatus(_)));
        assert!(err.to_string().starts_with("Invalid status payload"));
    }
}
