// src/executor.rs
//! Command execution on an open session.
//!
//! Each call holds the slot's session lock from before the command is sent
//! until its exit status is collected, so commands on one slot run strictly
//! one after another in the order their callers acquired the lock. Callers
//! on other slots are never blocked.

use tracing::{debug, info, warn};

use crate::session::SessionManager;
use crate::session::SessionState;
use crate::types::{ExecutionError, ExecutionResult, Result, ValidationError};

/// Run `command` on the session owned by `manager` and wait for it to finish.
///
/// A fatal transport failure drops the session and leaves the slot
/// disconnected; any other failure leaves the session usable.
pub async fn execute(manager: &SessionManager, command: &str) -> Result<ExecutionResult> {
    if command.trim().is_empty() {
        return Err(ValidationError::EmptyCommand.into());
    }

    let slot = manager.slot();
    let mut guard = manager.lease().await;
    if guard.is_none() {
        return Err(ExecutionError::NotConnected {
            slot,
            command: command.to_string(),
        }
        .into());
    }

    debug!("Executing on {} slot: {}", slot, command);
    let state = manager.state_handle();
    let owned = command.to_string();
    let outcome = tokio::task::spawn_blocking(move || {
        let session = match guard.as_mut() {
            Some(session) => session,
            None => {
                return Err(ExecutionError::NotConnected {
                    slot,
                    command: owned,
                })
            }
        };

        match session.run(&owned) {
            Ok(result) => Ok(result),
            Err(e) => {
                if e.fatal {
                    // Dropping the session closes what is left of the transport
                    guard.take();
                    *state.lock() = SessionState::Disconnected;
                }
                Err(ExecutionError::Transport {
                    command: owned,
                    message: e.message,
                    disconnected: e.fatal,
                })
            }
        }
    })
    .await
    .map_err(|e| ExecutionError::Worker {
        command: command.to_string(),
        message: e.to_string(),
    })?;

    match outcome {
        Ok(result) => {
            info!(
                "Command on {} slot exited with {}: {}",
                slot, result.exit_code, command
            );
            Ok(result)
        }
        Err(e) => {
            warn!("{}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{connector_with, request};
    use crate::session::transport::{Established, MockConnector, MockTransport, TransportError};
    use crate::types::{RemoteError, SessionSlot};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn manager_with_transport(transport: MockTransport) -> SessionManager {
        let transport = parking_lot::Mutex::new(Some(transport));
        let mut connector = MockConnector::new();
        connector.expect_connect().returning(move |_| {
            let transport = transport.lock().take().expect("connected once");
            Ok(Established {
                transport: Box::new(transport),
                fingerprint: None,
            })
        });
        SessionManager::new(SessionSlot::Docker, Arc::new(connector))
    }

    #[tokio::test]
    async fn test_execute_returns_output() {
        let manager = SessionManager::new(SessionSlot::Linux, connector_with(Arc::default()));
        manager.connect(request()).await.unwrap();

        let result = execute(&manager, "uname -a").await.unwrap();
        assert_eq!(result.stdout, "uname -a");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_execute_without_session() {
        let manager = SessionManager::new(SessionSlot::Docker, connector_with(Arc::default()));
        let err = execute(&manager, "docker ps").await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Execution(ExecutionError::NotConnected {
                slot: SessionSlot::Docker,
                ..
            })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let manager = SessionManager::new(SessionSlot::Docker, connector_with(Arc::default()));
        manager.connect(request()).await.unwrap();
        let err = execute(&manager, "  ").await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Validation(ValidationError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let mut transport = MockTransport::new();
        transport.expect_run().returning(|_| {
            Ok(ExecutionResult {
                stdout: String::new(),
                stderr: "No such container: web\n".to_string(),
                exit_code: 1,
            })
        });
        transport.expect_close().return_const(());
        let manager = manager_with_transport(transport);
        manager.connect(request()).await.unwrap();

        let result = execute(&manager, "docker logs web").await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "No such container: web\n");
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_fatal_transport_error_disconnects() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let mut transport = MockTransport::new();
        transport
            .expect_run()
            .returning(|_| Err(TransportError::fatal("connection reset")));
        transport.expect_close().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let manager = manager_with_transport(transport);
        manager.connect(request()).await.unwrap();

        let err = execute(&manager, "docker ps").await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Execution(ExecutionError::Transport {
                disconnected: true,
                ..
            })
        ));
        assert_eq!(manager.state(), SessionState::Disconnected);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let err = execute(&manager, "docker ps").await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Execution(ExecutionError::NotConnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_recoverable_transport_error_keeps_session() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_run()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(TransportError::recoverable("channel refused")));
        transport
            .expect_run()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|command| {
                Ok(ExecutionResult {
                    stdout: command.to_string(),
                    stderr: String::new(),
                    exit_code: 0,
                })
            });
        transport.expect_close().return_const(());
        let manager = manager_with_transport(transport);
        manager.connect(request()).await.unwrap();

        let err = execute(&manager, "docker ps").await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Execution(ExecutionError::Transport {
                disconnected: false,
                ..
            })
        ));
        assert!(manager.is_connected());
        assert_eq!(execute(&manager, "docker ps").await.unwrap().stdout, "docker ps");
    }

    #[tokio::test]
    async fn test_commands_on_one_slot_never_overlap() {
        let in_flight = Arc::new(AtomicBool::new(false));
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let busy = in_flight.clone();
        let seen = order.clone();
        let mut transport = MockTransport::new();
        transport.expect_run().returning(move |command| {
            assert!(!busy.swap(true, Ordering::SeqCst), "overlapping execution");
            std::thread::sleep(Duration::from_millis(30));
            seen.lock().push(command.to_string());
            busy.store(false, Ordering::SeqCst);
            Ok(ExecutionResult {
                stdout: command.to_string(),
                stderr: String::new(),
                exit_code: 0,
            })
        });
        transport.expect_close().return_const(());
        let manager = manager_with_transport(transport);
        manager.connect(request()).await.unwrap();

        let (first, second, third) = tokio::join!(
            execute(&manager, "docker ps"),
            execute(&manager, "docker images"),
            execute(&manager, "docker info"),
        );

        assert_eq!(first.unwrap().stdout, "docker ps");
        assert_eq!(second.unwrap().stdout, "docker images");
        assert_eq!(third.unwrap().stdout, "docker info");
        assert_eq!(
            *order.lock(),
            vec!["docker ps", "docker images", "docker info"]
        );
    }

    #[tokio::test]
    async fn test_disconnect_waits_for_running_command() {
        let mut transport = MockTransport::new();
        transport.expect_run().returning(|command| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(ExecutionResult {
                stdout: command.to_string(),
                stderr: String::new(),
                exit_code: 0,
            })
        });
        transport.expect_close().return_const(());
        let manager = manager_with_transport(transport);
        manager.connect(request()).await.unwrap();

        let (result, ()) = tokio::join!(execute(&manager, "sleep 1"), manager.disconnect());
        assert_eq!(result.unwrap().stdout, "sleep 1");
        assert_eq!(manager.state(), SessionState::Disconnected);
    }
}
