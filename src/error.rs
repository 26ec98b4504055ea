//! Error types for the receiver pipeline.
//!
//! Every error implements `std::error::Error` and carries structured context.
//!
//! ## Error Categories
//!
//! - **Socket Errors**: binding the listen address or accepting the client
//! - **Transport Errors**: a read on the established connection failed
//! - **Configuration Errors**: invalid values or an unreadable config file
//! - **Parse Errors**: malformed YAML or NMEA input
//! - **Frame Length Errors**: a byte slice that is not exactly one frame
//!
//! Short reads are not errors. The reassembler holds partial frames until the
//! rest of the bytes arrive.
//!
//! ## Session Termination
//!
//! Transport errors end the session. There is no retry and no reconnect:
//!
//! ```rust
//! use gpsrx::ReceiverError;
//!
//! let error = ReceiverError::transport_failed(
//!     "reading from client",
//!     std::io::Error::from(std::io::ErrorKind::ConnectionReset),
//! );
//! assert!(error.ends_session());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for receiver operations.
pub type Result<T, E = ReceiverError> = std::result::Result<T, E>;

/// Main error type for receiver operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReceiverError {
    #[error("Failed to bind listener on {address}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept client connection")]
    Accept {
        #[source]
        source: std::io::Error,
    },

    #[error("Transport failure while {context}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("Config file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Frame must be exactly {expected} bytes, got {found}")]
    FrameLength { expected: usize, found: usize },
}

impl ReceiverError {
    /// Returns whether this error terminates the current session.
    pub fn ends_session(&self) -> bool {
        match self {
            ReceiverError::Transport { .. } => true,
            ReceiverError::Accept { .. } => true,
            ReceiverError::Bind { .. } => true,
            ReceiverError::Config { .. } => false,
            ReceiverError::ConfigFile { .. } => false,
            ReceiverError::Parse { .. } => false,
            ReceiverError::FrameLength { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ReceiverError::Bind { .. } => vec![
                "Check that no other process is listening on the port",
                "Verify the listen address belongs to this host",
                "Use a port above 1024 when running unprivileged",
            ],
            ReceiverError::Accept { .. } => vec![
                "Check the process file descriptor limit",
                "Restart the receiver and reconnect the sender",
            ],
            ReceiverError::Transport { .. } => vec![
                "Restart the receiver and reconnect the sender",
                "Check network connectivity between sender and receiver",
            ],
            ReceiverError::Config { .. } => vec![
                "Check window_size and read_buffer_size are at least 1",
                "Compare the config file against the documented defaults",
            ],
            ReceiverError::ConfigFile { .. } => vec![
                "Check the config file exists and is readable",
                "Pass the path with --config",
            ],
            ReceiverError::Parse { .. } => vec![
                "Check the input format",
                "Verify the source data is not truncated",
            ],
            ReceiverError::FrameLength { .. } => vec![
                "Slice exactly one 24-byte record before decoding",
                "Feed raw bytes through the stream reassembler instead",
            ],
        }
    }

    /// Helper constructor for read failures on an established connection.
    pub fn transport_failed(context: impl Into<String>, source: std::io::Error) -> Self {
        ReceiverError::Transport { context: context.into(), source }
    }

    /// Helper constructor for configuration validation errors.
    pub fn config_invalid(details: impl Into<String>) -> Self {
        ReceiverError::Config { details: details.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        ReceiverError::Parse { context: context.into(), details: details.into() }
    }
}

impl From<std::io::Error> for ReceiverError {
    fn from(err: std::io::Error) -> Self {
        ReceiverError::Transport { context: "an unknown operation".to_string(), source: err }
    }
}
