// src/session/transport.rs
//! Remote transport abstraction.
//!
//! The session manager and executor only talk to these traits; the SSH
//! implementation lives in `session::ssh`. Both calls are blocking and are
//! driven from `tokio::task::spawn_blocking`.

use crate::types::{ConnectionError, ConnectionRequest, ExecutionResult};

/// Failure while running a command on an open transport
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// The underlying connection is gone and cannot be reused
    pub fatal: bool,
}

impl TransportError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: true,
        }
    }
}

/// An open, authenticated channel to one host
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Run one command to completion, collecting stdout, stderr and exit code
    fn run(&mut self, command: &str) -> Result<ExecutionResult, TransportError>;

    /// Close the connection. Must tolerate being called more than once.
    fn close(&mut self);
}

/// A freshly opened transport and the host key it presented
pub struct Established {
    pub transport: Box<dyn Transport>,
    /// `SHA256:<base64>` fingerprint of the host key, when available
    pub fingerprint: Option<String>,
}

/// Opens transports
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    fn connect(&self, request: &ConnectionRequest) -> Result<Established, ConnectionError>;
}
