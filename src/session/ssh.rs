// src/session/ssh.rs
//! SSH transport over libssh2.
//!
//! Password authentication on port 22 with trust-on-first-use host keys.
//! The connect timeout bounds TCP connect, handshake and authentication; it
//! is cleared before any command runs.

use std::io::{self, ErrorKind, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ssh2::{ErrorCode, Session};
use tracing::{debug, info, warn};

use crate::session::known_hosts::{HostKeyStatus, KnownHosts};
use crate::session::transport::{Connector, Established, Transport, TransportError};
use crate::types::{ConnectionError, ConnectionRequest, ExecutionResult};

const READ_BUFFER_SIZE: usize = 8192;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

// libssh2 error codes
const LIBSSH2_ERROR_SOCKET_SEND: i32 = -7;
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_SOCKET_DISCONNECT: i32 = -13;
const LIBSSH2_ERROR_SOCKET_TIMEOUT: i32 = -30;
const LIBSSH2_ERROR_SOCKET_RECV: i32 = -43;

/// Opens password-authenticated SSH sessions
pub struct SshConnector {
    known_hosts: Arc<KnownHosts>,
}

impl SshConnector {
    pub fn new(known_hosts: Arc<KnownHosts>) -> Self {
        Self { known_hosts }
    }

    pub fn known_hosts(&self) -> &Arc<KnownHosts> {
        &self.known_hosts
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new(Arc::new(KnownHosts::new()))
    }
}

impl Connector for SshConnector {
    fn connect(&self, request: &ConnectionRequest) -> Result<Established, ConnectionError> {
        let addr = resolve(request)?;
        let host = request.host.clone();
        let timeout_ms = request.timeout.as_millis().min(u32::MAX as u128) as u32;

        let tcp = TcpStream::connect_timeout(&addr, request.timeout).map_err(|source| {
            if source.kind() == ErrorKind::TimedOut {
                ConnectionError::Timeout {
                    host: host.clone(),
                    seconds: request.timeout.as_secs(),
                }
            } else {
                ConnectionError::Tcp {
                    address: addr.to_string(),
                    source,
                }
            }
        })?;

        let mut session = Session::new().map_err(|e| ConnectionError::Handshake {
            host: host.clone(),
            message: e.to_string(),
        })?;
        session.set_timeout(timeout_ms);
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| {
            if is_timeout(&e) {
                ConnectionError::Timeout {
                    host: host.clone(),
                    seconds: request.timeout.as_secs(),
                }
            } else {
                ConnectionError::Handshake {
                    host: host.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let fingerprint = fingerprint_host_key_sha256(&session);
        let status = match &fingerprint {
            Some(fp) => Some(self.known_hosts.check(&host, fp)?),
            None => {
                warn!("{} presented no host key hash; skipping host key check", host);
                None
            }
        };

        session
            .userauth_password(&request.username, &request.password)
            .map_err(|e| ConnectionError::Authentication {
                host: host.clone(),
                username: request.username.clone(),
                message: e.to_string(),
            })?;
        if !session.authenticated() {
            return Err(ConnectionError::Authentication {
                host,
                username: request.username.clone(),
                message: "server did not accept the password".to_string(),
            });
        }

        if let (Some(fp), Some(HostKeyStatus::Unknown)) = (&fingerprint, status) {
            info!("Trusting host key for {} on first use: {}", host, fp);
            self.known_hosts.remember(&host, fp);
        }

        // Commands run without a timeout
        session.set_timeout(0);

        debug!("SSH session to {} authenticated as {}", addr, request.username);
        Ok(Established {
            transport: Box::new(SshTransport { session, host }),
            fingerprint,
        })
    }
}

fn resolve(request: &ConnectionRequest) -> Result<SocketAddr, ConnectionError> {
    let resolve_error = |source| ConnectionError::Resolve {
        host: request.host.clone(),
        source,
    };
    request
        .address()
        .to_socket_addrs()
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| resolve_error(std::io::Error::new(ErrorKind::NotFound, "no addresses")))
}

fn fingerprint_host_key_sha256(session: &Session) -> Option<String> {
    session
        .host_key_hash(ssh2::HashType::Sha256)
        .map(format_fingerprint)
}

/// OpenSSH-style `SHA256:<base64 without padding>`
fn format_fingerprint(hash: &[u8]) -> String {
    format!(
        "SHA256:{}",
        base64::encode_config(hash, base64::STANDARD_NO_PAD)
    )
}

fn is_timeout(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT | LIBSSH2_ERROR_SOCKET_TIMEOUT)
    )
}

fn is_socket_failure(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::Session(
            LIBSSH2_ERROR_SOCKET_SEND | LIBSSH2_ERROR_SOCKET_DISCONNECT | LIBSSH2_ERROR_SOCKET_RECV
        )
    )
}

fn ssh_failure(context: &str, err: ssh2::Error) -> TransportError {
    let message = format!("{}: {}", context, err);
    if is_socket_failure(&err) {
        TransportError::fatal(message)
    } else {
        TransportError::recoverable(message)
    }
}

/// Channel reads surface libssh2 errors as `ErrorKind::Other` with the
/// code stripped, so a dead socket cannot be told apart from anything else.
/// Any read failure other than `WouldBlock` drops the session.
fn read_failure(context: &str, err: io::Error) -> TransportError {
    TransportError::fatal(format!("{}: {}", context, err))
}

/// Both output streams of a running command
trait ChannelOutput {
    fn read_stdout(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn read_stderr(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn at_eof(&self) -> bool;
}

impl ChannelOutput for ssh2::Channel {
    fn read_stdout(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn read_stderr(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stderr().read(buf)
    }

    fn at_eof(&self) -> bool {
        self.eof()
    }
}

/// Drain stdout and stderr together so neither stream can stall the other
fn collect<C: ChannelOutput>(channel: &mut C) -> Result<(Vec<u8>, Vec<u8>), TransportError> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let mut progressed = false;

        match channel.read_stdout(&mut buf) {
            Ok(n) if n > 0 => {
                stdout.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => return Err(read_failure("stdout read failed", e)),
        }

        match channel.read_stderr(&mut buf) {
            Ok(n) if n > 0 => {
                stderr.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => return Err(read_failure("stderr read failed", e)),
        }

        if !progressed {
            if channel.at_eof() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    Ok((stdout, stderr))
}

/// One authenticated SSH session
pub struct SshTransport {
    session: Session,
    host: String,
}

impl Transport for SshTransport {
    fn run(&mut self, command: &str) -> Result<ExecutionResult, TransportError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| ssh_failure("opening channel failed", e))?;
        channel
            .exec(command)
            .map_err(|e| ssh_failure("exec request failed", e))?;

        self.session.set_blocking(false);
        let collected = collect(&mut channel);
        self.session.set_blocking(true);
        let (stdout, stderr) = collected?;

        channel
            .wait_close()
            .map_err(|e| ssh_failure("closing channel failed", e))?;
        let exit_code = channel
            .exit_status()
            .map_err(|e| ssh_failure("reading exit status failed", e))?;

        Ok(ExecutionResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }

    fn close(&mut self) {
        if let Err(e) = self.session.disconnect(None, "closed by client", None) {
            debug!("Ignoring error while disconnecting from {}: {}", self.host, e);
        }
    }
}
