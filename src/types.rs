// src/types.rs
//! Shared records and error types.
//!
//! Requests and responses exchanged with the caller, the connection
//! descriptor, and the error taxonomy used across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::constants::SSH_PORT;

/// Independent connection context. Each slot owns at most one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionSlot {
    /// General shell workflow; commands run verbatim
    Linux,
    /// Container workflow; commands go through the catalog and normalizer
    Docker,
}

impl SessionSlot {
    pub const ALL: [SessionSlot; 2] = [SessionSlot::Linux, SessionSlot::Docker];

    /// Whether free-form input on this slot is auto-corrected
    pub fn normalizes(&self) -> bool {
        matches!(self, SessionSlot::Docker)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionSlot::Linux => "linux",
            SessionSlot::Docker => "docker",
        }
    }
}

impl fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a connect request. The port is always 22.
#[derive(Clone)]
pub struct ConnectionRequest {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl ConnectionRequest {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            host: host.into(),
            port: SSH_PORT,
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    /// Reject empty host, username or password before any network I/O
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        for (field, value) in [
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Keep the password out of logs.
impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Output of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Execution request from the CLI or console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Free-form command, or a catalog label on the docker slot
    pub raw_command_or_label: String,
    #[serde(default)]
    pub argument: Option<String>,
    pub slot: SessionSlot,
}

impl ExecutionRequest {
    pub fn new(raw_command_or_label: impl Into<String>, slot: SessionSlot) -> Self {
        Self {
            raw_command_or_label: raw_command_or_label.into(),
            argument: None,
            slot,
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }
}

/// Combined result reported back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub slot: SessionSlot,
    pub corrected_command: String,
    pub correction_note: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub succeeded: bool,
    pub executed_at: String,
}

/// Raw input could not be split into shell words
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("could not tokenize '{input}': {reason}")]
pub struct ParseError {
    pub input: String,
    pub reason: String,
}

/// Caught before any network activity
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("catalog entry '{label}' needs an argument")]
    MissingArgument { label: String },

    #[error("no command specified")]
    EmptyCommand,
}

/// Opening a session failed; the slot stays disconnected
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TCP connect to {address} failed: {source}")]
    Tcp {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to {host} after {seconds}s")]
    Timeout { host: String, seconds: u64 },

    #[error("SSH handshake with {host} failed: {message}")]
    Handshake { host: String, message: String },

    #[error("authentication failed for {username}@{host}: {message}")]
    Authentication {
        host: String,
        username: String,
        message: String,
    },

    #[error("host key for {host} changed (remembered {expected}, presented {presented})")]
    HostKeyMismatch {
        host: String,
        expected: String,
        presented: String,
    },

    #[error("connect worker for {host} failed: {message}")]
    Worker { host: String, message: String },
}

/// Running a command failed before its result was collected
#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("{slot} slot is not connected; cannot run '{command}'")]
    NotConnected { slot: SessionSlot, command: String },

    #[error("running '{command}' failed: {message}")]
    Transport {
        command: String,
        message: String,
        /// Transport confirmed dead; the session was dropped
        disconnected: bool,
    },

    #[error("execution worker for '{command}' failed: {message}")]
    Worker { command: String, message: String },
}

/// Error types for remote runner operations
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl RemoteError {
    /// Process exit code for this failure: 1 for usage, 2 for transport
    pub fn exit_code(&self) -> i32 {
        match self {
            RemoteError::Validation(_) => crate::config::constants::EXIT_USAGE,
            RemoteError::Connection(_) | RemoteError::Execution(_) => {
                crate::config::constants::EXIT_TRANSPORT
            }
        }
    }
}

/// Result type for remote runner operations
pub type Result<T> = std::result::Result<T, RemoteError>;
