// src/config/constants.rs
//! Application constants and fixed settings.
//!
//! Values here are not user-configurable.

/// Remote sessions always use the standard SSH port
pub const SSH_PORT: u16 = 22;

/// Minimum similarity ratio (exclusive) for an auto-correction
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Cutoff (inclusive) for the sub-command close-match search
pub const CLOSE_MATCH_CUTOFF: f64 = 0.6;

/// Sequences at least this long get the popular-element heuristic
pub const AUTOJUNK_MIN_LEN: usize = 200;

/// Placeholder substituted by catalog templates
pub const TEMPLATE_PLACEHOLDER: &str = "{arg}";

/// Process exit code for usage and validation errors
pub const EXIT_USAGE: i32 = 1;

/// Process exit code for connection and transport errors
pub const EXIT_TRANSPORT: i32 = 2;

/// Environment variable consulted for the SSH password
pub const PASSWORD_ENV: &str = "REMOTE_RUNNER_PASSWORD";

/// Bounds for the connect timeout, in seconds
pub const MIN_CONNECT_TIMEOUT_SECS: u64 = 1;
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 600;
