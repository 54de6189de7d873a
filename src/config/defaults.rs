// src/config/defaults.rs
//! Default configurations for the remote runner.
//!
//! This module provides sensible default values for configuration settings
//! when not explicitly specified by the user.

/// Default connect timeout in seconds (covers TCP, handshake and auth)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;

/// Default remote username
pub const DEFAULT_USERNAME: &str = "root";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Default log file prefix when file logging is enabled
pub const DEFAULT_LOG_FILE_PREFIX: &str = "remote-runner";
