// Export all modules for public use
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod interactive;
pub mod normalizer;
pub mod session;
pub mod types;
pub mod utils;
pub mod vocabulary;

// Re-export the most commonly used items for convenience
pub use crate::catalog::{Catalog, CommandTemplate, DOCKER_CATALOG};
pub use crate::dispatcher::Dispatcher;
pub use crate::normalizer::{normalize, CorrectionResult};
pub use crate::session::{HostIdentity, SessionManager, SessionState};
pub use crate::types::{
    ConnectionRequest, ExecutionRequest, ExecutionResponse, ExecutionResult, RemoteError, Result,
    SessionSlot,
};
pub use crate::vocabulary::{Vocabulary, DOCKER};
