// src/session/known_hosts.rs
//! Trust-on-first-use host key store.
//!
//! The first fingerprint presented by a host is accepted without
//! out-of-band verification and remembered for the lifetime of the store.
//! Any later connection to that host must present the same fingerprint.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::ConnectionError;
use crate::utils::logging::log_security_event;

/// Outcome of checking a presented host key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyStatus {
    /// Never seen this host before
    Unknown,
    /// Matches the remembered fingerprint
    Known,
}

/// In-memory host to fingerprint map
#[derive(Debug, Default)]
pub struct KnownHosts {
    fingerprints: RwLock<HashMap<String, String>>,
}

impl KnownHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a presented fingerprint against the remembered one
    pub fn check(&self, host: &str, presented: &str) -> Result<HostKeyStatus, ConnectionError> {
        match self.fingerprints.read().get(host) {
            None => Ok(HostKeyStatus::Unknown),
            Some(expected) if expected == presented => Ok(HostKeyStatus::Known),
            Some(expected) => {
                log_security_event(
                    "HOST_KEY_MISMATCH",
                    &format!("{} presented {}, remembered {}", host, presented, expected),
                );
                Err(ConnectionError::HostKeyMismatch {
                    host: host.to_string(),
                    expected: expected.clone(),
                    presented: presented.to_string(),
                })
            }
        }
    }

    /// Remember the fingerprint for a host if none is stored yet
    pub fn remember(&self, host: &str, fingerprint: &str) {
        let mut fingerprints = self.fingerprints.write();
        if !fingerprints.contains_key(host) {
            log_security_event(
                "HOST_KEY_TRUSTED_ON_FIRST_USE",
                &format!("{} {}", host, fingerprint),
            );
            fingerprints.insert(host.to_string(), fingerprint.to_string());
        }
    }

    pub fn fingerprint(&self, host: &str) -> Option<String> {
        self.fingerprints.read().get(host).cloned()
    }

    pub fn len(&self) -> usize {
        self.fingerprints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
