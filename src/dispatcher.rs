// src/dispatcher.rs
//! Request routing.
//!
//! Owns the two session slots and turns an [`ExecutionRequest`] into the
//! command that actually runs:
//!
//! - on the docker slot, an exact catalog label resolves to its template;
//!   anything else goes through the normalizer
//! - on the linux slot, input runs verbatim
//!
//! The slots share nothing but the connector, so work on one never waits
//! for the other.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::{Catalog, DOCKER_CATALOG};
use crate::executor;
use crate::normalizer::{self, CorrectionResult};
use crate::session::ssh::SshConnector;
use crate::session::transport::Connector;
use crate::session::{HostIdentity, SessionManager, SessionState};
use crate::types::{
    ConnectionRequest, ExecutionRequest, ExecutionResponse, Result, SessionSlot, ValidationError,
};
use crate::vocabulary::{Vocabulary, DOCKER};

/// Routes requests to the right slot after catalog lookup and normalization
pub struct Dispatcher {
    linux: SessionManager,
    docker: SessionManager,
    vocabulary: Vocabulary,
    catalog: Catalog,
}

impl Dispatcher {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            linux: SessionManager::new(SessionSlot::Linux, Arc::clone(&connector)),
            docker: SessionManager::new(SessionSlot::Docker, connector),
            vocabulary: DOCKER,
            catalog: DOCKER_CATALOG,
        }
    }

    /// Dispatcher backed by real SSH connections
    pub fn with_ssh() -> Self {
        Self::new(Arc::new(SshConnector::default()))
    }

    pub fn session(&self, slot: SessionSlot) -> &SessionManager {
        match slot {
            SessionSlot::Linux => &self.linux,
            SessionSlot::Docker => &self.docker,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub async fn connect(
        &self,
        slot: SessionSlot,
        request: ConnectionRequest,
    ) -> Result<HostIdentity> {
        self.session(slot).connect(request).await
    }

    pub async fn disconnect(&self, slot: SessionSlot) {
        self.session(slot).disconnect().await
    }

    pub async fn disconnect_all(&self) {
        tokio::join!(self.linux.disconnect(), self.docker.disconnect());
    }

    pub fn is_connected(&self, slot: SessionSlot) -> bool {
        self.session(slot).is_connected()
    }

    pub fn state(&self, slot: SessionSlot) -> SessionState {
        self.session(slot).state()
    }

    /// Work out what `request` would run without touching the network.
    ///
    /// Fails on blank input, or on a catalog entry that needs an argument
    /// that was not supplied.
    pub fn preview(&self, request: &ExecutionRequest) -> Result<CorrectionResult> {
        let raw = request.raw_command_or_label.as_str();

        if request.slot.normalizes() {
            if let Some(template) = self.catalog.get(raw.trim()) {
                let command = template.resolve(request.argument.as_deref());
                if command.is_empty() {
                    return Err(ValidationError::MissingArgument {
                        label: template.label.to_string(),
                    }
                    .into());
                }
                debug!("Catalog entry '{}' resolved to: {}", template.label, command);
                return Ok(CorrectionResult {
                    corrected_command: command,
                    note: String::new(),
                });
            }
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCommand.into());
        }

        if request.slot.normalizes() {
            Ok(normalizer::normalize(trimmed, &self.vocabulary))
        } else {
            Ok(CorrectionResult {
                corrected_command: trimmed.to_string(),
                note: String::new(),
            })
        }
    }

    /// Resolve, normalize and run one request on its slot
    pub async fn dispatch(&self, request: ExecutionRequest) -> Result<ExecutionResponse> {
        let correction = self.preview(&request)?;
        if correction.was_corrected() {
            info!(
                "{} slot: {} ({})",
                request.slot, correction.corrected_command, correction.note
            );
        }

        let result =
            executor::execute(self.session(request.slot), &correction.corrected_command).await?;

        Ok(ExecutionResponse {
            slot: request.slot,
            corrected_command: correction.corrected_command,
            correction_note: correction.note,
            succeeded: result.exit_code == 0,
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
            executed_at: Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests;
