// src/session/mod.rs
//! Remote session management.
//!
//! A [`SessionManager`] owns the single session of one slot and drives its
//! state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnected
//!                     |
//!                     +-> Disconnected   (connect failed)
//! ```
//!
//! The session sits behind an async mutex shared with the executor. Connect
//! and disconnect take the same lock, so they wait for an in-flight command
//! to finish rather than tearing the transport down under it.

pub mod known_hosts;
pub mod ssh;
pub mod transport;

use parking_lot::Mutex as StateLock;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::types::{ConnectionError, ConnectionRequest, ExecutionResult, Result, SessionSlot};
use transport::{Connector, Established, Transport, TransportError};

/// Lifecycle of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Identity of the host a slot connected to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub host: String,
    pub username: String,
    pub fingerprint: Option<String>,
}

/// One authenticated connection. Closing happens on drop.
pub struct RemoteSession {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub fingerprint: Option<String>,
    pub connected_at: Instant,
    transport: Box<dyn Transport>,
}

impl RemoteSession {
    fn new(request: &ConnectionRequest, established: Established) -> Self {
        Self {
            host: request.host.clone(),
            port: request.port,
            username: request.username.clone(),
            fingerprint: established.fingerprint,
            connected_at: Instant::now(),
            transport: established.transport,
        }
    }

    pub(crate) fn run(&mut self, command: &str) -> std::result::Result<ExecutionResult, TransportError> {
        self.transport.run(command)
    }

    fn identity(&self) -> HostIdentity {
        HostIdentity {
            host: self.host.clone(),
            username: self.username.clone(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        debug!("Closing session to {}@{}", self.username, self.host);
        self.transport.close();
    }
}

impl fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSession")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

pub(crate) type SessionGuard = OwnedMutexGuard<Option<RemoteSession>>;

/// Owner of one slot's session
pub struct SessionManager {
    slot: SessionSlot,
    connector: Arc<dyn Connector>,
    session: Arc<Mutex<Option<RemoteSession>>>,
    state: Arc<StateLock<SessionState>>,
}

impl SessionManager {
    pub fn new(slot: SessionSlot, connector: Arc<dyn Connector>) -> Self {
        Self {
            slot,
            connector,
            session: Arc::new(Mutex::new(None)),
            state: Arc::new(StateLock::new(SessionState::Disconnected)),
        }
    }

    pub fn slot(&self) -> SessionSlot {
        self.slot
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Identity of the current session, if any
    pub async fn identity(&self) -> Option<HostIdentity> {
        self.session.lock().await.as_ref().map(RemoteSession::identity)
    }

    /// Open a session, replacing any existing one in this slot.
    ///
    /// Empty host, username or password fail validation before any network
    /// activity. Any prior session is discarded first, so a failed reconnect
    /// leaves the slot disconnected.
    #[instrument(skip(self, request), fields(slot = %self.slot, host = %request.host))]
    pub async fn connect(&self, request: ConnectionRequest) -> Result<HostIdentity> {
        request.validate()?;

        let mut guard = self.session.clone().lock_owned().await;
        let previous = guard.take();
        if previous.is_some() {
            info!("Discarding previous {} session before reconnecting", self.slot);
        }
        self.set_state(SessionState::Connecting);

        let connector = Arc::clone(&self.connector);
        let host = request.host.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            drop(previous);
            let established = connector.connect(&request);
            (request, established)
        })
        .await;

        match outcome {
            Ok((request, Ok(established))) => {
                let session = RemoteSession::new(&request, established);
                let identity = session.identity();
                *guard = Some(session);
                self.set_state(SessionState::Connected);
                info!(
                    "Connected {} slot to {}@{}:{}",
                    self.slot, request.username, request.host, request.port
                );
                Ok(identity)
            }
            Ok((_, Err(e))) => {
                self.set_state(SessionState::Disconnected);
                warn!("Connect failed: {}", e);
                Err(e.into())
            }
            Err(e) => {
                self.set_state(SessionState::Disconnected);
                Err(ConnectionError::Worker {
                    host,
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Close the session. Disconnecting an idle slot is a no-op.
    pub async fn disconnect(&self) {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            let host = session.host.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || drop(session)).await {
                warn!("Closing session to {} failed: {}", host, e);
            }
            info!("Disconnected {} slot from {}", self.slot, host);
        }
        self.set_state(SessionState::Disconnected);
    }

    /// Exclusive access to the session for the duration of one command
    pub(crate) async fn lease(&self) -> SessionGuard {
        self.session.clone().lock_owned().await
    }

    pub(crate) fn state_handle(&self) -> Arc<StateLock<SessionState>> {
        Arc::clone(&self.state)
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!("{} slot: {} -> {}", self.slot, *current, state);
            *current = state;
        }
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("slot", &self.slot)
            .field("state", &self.state())
            .finish()
    }
}
