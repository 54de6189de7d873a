// src/dispatcher/tests.rs

use super::*;
use crate::normalizer::{NOTE_COMMENT_ONLY, NOTE_UNPARSEABLE};
use crate::session::tests::{connector_with, request};
use crate::session::transport::{Established, MockConnector, MockTransport};
use crate::types::{ExecutionError, ExecutionResult, RemoteError};
use test_case::test_case;

async fn connected(slots: &[SessionSlot]) -> Dispatcher {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    for slot in slots {
        dispatcher.connect(*slot, request()).await.unwrap();
    }
    dispatcher
}

#[test_case("List Containers (all)", None, "docker ps -a" ; "fixed entry")]
#[test_case("Pull Image (name)", Some("alpine"), "docker pull alpine" ; "entry with argument")]
#[test_case("  Docker Info  ", None, "docker info" ; "label is trimmed")]
#[test_case("Stop Container", Some("web db"), "docker stop web db" ; "argument substituted verbatim")]
fn test_preview_catalog(label: &str, argument: Option<&str>, expected: &str) {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    let mut request = ExecutionRequest::new(label, SessionSlot::Docker);
    request.argument = argument.map(str::to_string);

    let correction = dispatcher.preview(&request).unwrap();
    assert_eq!(correction.corrected_command, expected);
    assert_eq!(correction.note, "");
}

#[test]
fn test_preview_missing_argument() {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    for request in [
        ExecutionRequest::new("Pull Image (name)", SessionSlot::Docker),
        ExecutionRequest::new("Pull Image (name)", SessionSlot::Docker).with_argument(""),
    ] {
        let err = dispatcher.preview(&request).unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Validation(ValidationError::MissingArgument { ref label })
                if label == "Pull Image (name)"
        ));
        assert_eq!(err.exit_code(), 1);
    }
}

#[test_case(SessionSlot::Docker ; "docker")]
#[test_case(SessionSlot::Linux ; "linux")]
fn test_preview_empty_command(slot: SessionSlot) {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    for raw in ["", "   \t"] {
        let err = dispatcher.preview(&ExecutionRequest::new(raw, slot)).unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Validation(ValidationError::EmptyCommand)
        ));
    }
}

#[test]
fn test_preview_normalizes_docker_input() {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    let correction = dispatcher
        .preview(&ExecutionRequest::new("dcker pss -a", SessionSlot::Docker))
        .unwrap();
    assert_eq!(correction.corrected_command, "docker ps -a");
    assert!(correction.was_corrected());
}

#[tokio::test]
async fn test_dispatch_comment_only_docker_input() {
    let dispatcher = connected(&[SessionSlot::Docker]).await;
    let response = dispatcher
        .dispatch(ExecutionRequest::new("# nothing yet", SessionSlot::Docker))
        .await
        .unwrap();
    assert_eq!(response.corrected_command, "# nothing yet");
    assert_eq!(response.correction_note, NOTE_COMMENT_ONLY);
    assert_eq!(response.stdout, "# nothing yet");
}

#[test]
fn test_preview_linux_is_verbatim() {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    for raw in ["dcker pss -a", "ps -a", "List Images", "echo 'a  b'"] {
        let correction = dispatcher
            .preview(&ExecutionRequest::new(raw, SessionSlot::Linux))
            .unwrap();
        assert_eq!(correction.corrected_command, raw);
        assert_eq!(correction.note, "");
    }
}

#[test]
fn test_preview_unparseable_runs_verbatim() {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    let correction = dispatcher
        .preview(&ExecutionRequest::new("docker run \"oops", SessionSlot::Docker))
        .unwrap();
    assert_eq!(correction.corrected_command, "docker run \"oops");
    assert_eq!(correction.note, NOTE_UNPARSEABLE);
}

#[tokio::test]
async fn test_dispatch_corrected_command() {
    let dispatcher = connected(&[SessionSlot::Docker]).await;
    let response = dispatcher
        .dispatch(ExecutionRequest::new("ps -a", SessionSlot::Docker))
        .await
        .unwrap();

    assert_eq!(response.slot, SessionSlot::Docker);
    assert_eq!(response.corrected_command, "docker ps -a");
    assert_eq!(response.correction_note, "inserted missing top-level command prefix.");
    assert_eq!(response.stdout, "docker ps -a");
    assert_eq!(response.exit_code, 0);
    assert!(response.succeeded);
    assert!(chrono::DateTime::parse_from_rfc3339(&response.executed_at).is_ok());
}

#[tokio::test]
async fn test_dispatch_catalog_entry() {
    let dispatcher = connected(&[SessionSlot::Docker]).await;
    let response = dispatcher
        .dispatch(
            ExecutionRequest::new("Container Logs", SessionSlot::Docker).with_argument("web"),
        )
        .await
        .unwrap();
    assert_eq!(response.corrected_command, "docker logs web");
    assert_eq!(response.stdout, "docker logs web");
    assert_eq!(response.correction_note, "");
}

#[tokio::test]
async fn test_dispatch_requires_connected_slot() {
    let dispatcher = connected(&[SessionSlot::Docker]).await;
    assert!(dispatcher.is_connected(SessionSlot::Docker));
    assert!(!dispatcher.is_connected(SessionSlot::Linux));

    let err = dispatcher
        .dispatch(ExecutionRequest::new("uptime", SessionSlot::Linux))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Execution(ExecutionError::NotConnected {
            slot: SessionSlot::Linux,
            ..
        })
    ));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_validation_precedes_connection_check() {
    let dispatcher = Dispatcher::new(connector_with(Arc::default()));
    let err = dispatcher
        .dispatch(ExecutionRequest::new("Remove Image (name/id)", SessionSlot::Docker))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_dispatch_nonzero_exit() {
    let mut connector = MockConnector::new();
    connector.expect_connect().returning(|_| {
        let mut transport = MockTransport::new();
        transport.expect_run().returning(|_| {
            Ok(ExecutionResult {
                stdout: String::new(),
                stderr: "ls: cannot access '/nope'\n".to_string(),
                exit_code: 2,
            })
        });
        transport.expect_close().return_const(());
        Ok(Established {
            transport: Box::new(transport),
            fingerprint: None,
        })
    });
    let dispatcher = Dispatcher::new(Arc::new(connector));
    dispatcher.connect(SessionSlot::Linux, request()).await.unwrap();

    let response = dispatcher
        .dispatch(ExecutionRequest::new("ls /nope", SessionSlot::Linux))
        .await
        .unwrap();
    assert_eq!(response.exit_code, 2);
    assert!(!response.succeeded);
    assert_eq!(response.stderr, "ls: cannot access '/nope'\n");
}

#[tokio::test]
async fn test_slots_are_independent() {
    let dispatcher = connected(&SessionSlot::ALL).await;
    dispatcher.disconnect(SessionSlot::Linux).await;

    assert_eq!(dispatcher.state(SessionSlot::Linux), SessionState::Disconnected);
    assert_eq!(dispatcher.state(SessionSlot::Docker), SessionState::Connected);

    let response = dispatcher
        .dispatch(ExecutionRequest::new("docker ps", SessionSlot::Docker))
        .await
        .unwrap();
    assert_eq!(response.stdout, "docker ps");

    dispatcher.disconnect_all().await;
    assert!(!dispatcher.is_connected(SessionSlot::Docker));
}
