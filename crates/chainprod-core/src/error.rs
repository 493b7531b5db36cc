//! Error types for chainprod-core.
//!
//! This module defines the errors that can occur while talking to the chain
//! production controller.
//!
//! # Taxonomy
//!
//! | Error | Raised by | Effect on client state |
//! |-------|-----------|------------------------|
//! | [`TransportError`] | [`crate::ChainTransport`] implementations | none, wrapped by the two below |
//! | [`SyncError`] | [`crate::StatusSynchronizer::refresh`] | status model left unchanged |
//! | [`CommandError`] | [`crate::CommandDispatcher::send`] | none, the post-command refresh still runs |
//! | [`Error`] | configuration and the [`crate::ChainClient`] facade | umbrella type |
//!
//! Both [`SyncError`] and [`CommandError`] are non-fatal. The client keeps
//! operating on the last good status and the countdown keeps ticking. There
//! is no automatic retry; callers use the error to notify the user.

use std::time::Duration;

use thiserror::Error;

use chainprod_types::{CommandName, ParseError};

/// Failure while reaching the controller over its transport.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The controller host did not answer.
    #[error("Controller not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed after a connection was made.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The API key cannot be sent as a header value.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    /// The host answered with a non-success status.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be used.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },
}

impl TransportError {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// HTTP status code, if the host answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A status fetch failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// The request did not complete.
    #[error("Status fetch failed: {0}")]
    Transport(#[from] TransportError),

    /// The body was not a valid status.
    #[error("Status parse failed: {0}")]
    Parse(#[from] ParseError),
}

/// A command could not be delivered or was rejected.
#[derive(Debug, Error)]
#[error("Command '{command}' failed: {source}")]
pub struct CommandError {
    /// The command that failed.
    pub command: CommandName,
    /// Why it failed.
    #[source]
    pub source: TransportError,
}

impl CommandError {
    /// Create a command error.
    pub fn new(command: CommandName, source: TransportError) -> Self {
        Self { command, source }
    }
}

/// Errors that can occur when using the chain production client.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Status synchronization failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Command dispatch failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Transport setup failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type alias using chainprod-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
