// SPDX-License-Identifier: MIT

//! Reference remote-session transport. The wire protocol spoken to managed
//! hosts is explicitly out of scope; this opens a TCP connection, performs a
//! line-oriented credential handshake, writes the script, and reads back a
//! length-prefixed result. It exists so the executor layer has something
//! concrete to drive end to end.

use appliance_core::{Credential, Secret, Target};
use appliance_transport::{escape_for_shell, RemoteSession, SessionOpener, SessionOutput, ShellDialect, TransportError};
use async_trait::async_trait;
use appliance_core::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub struct TcpSessionOpener;

impl TcpSessionOpener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TcpSessionOpener {
    fn default() -> Self {
        Self::new()
    }
}

fn dialect_for(target: &Target) -> ShellDialect {
    match target.platform {
        appliance_core::Platform::Windows => ShellDialect::PowerShell,
        _ => ShellDialect::Posix,
    }
}

fn connect_error(err: std::io::Error) -> TransportError {
    use std::io::ErrorKind as IoKind;
    let kind = match err.kind() {
        IoKind::ConnectionRefused => ErrorKind::ConnectionRefused,
        IoKind::TimedOut => ErrorKind::Timeout,
        _ => ErrorKind::NoRoute,
    };
    TransportError::new(kind, err.to_string())
}

#[async_trait]
impl SessionOpener for TcpSessionOpener {
    async fn open(&self, target: &Target, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        open_tagged(&target.address, target.port, dialect_for(target), credential, "direct", None).await
    }
}

/// Opens a tagged session against `address:port`, identifying the
/// authentication method and (for proxied sessions) the downstream
/// workstation id in the handshake line.
pub(crate) async fn open_tagged(
    address: &str,
    port: u16,
    dialect: ShellDialect,
    credential: &Credential,
    method: &str,
    workstation_id: Option<&str>,
) -> Result<Box<dyn RemoteSession>, TransportError> {
    let endpoint = format!("{address}:{port}");
    let stream = tokio::time::timeout(Duration::from_secs(10), TcpStream::connect(&endpoint))
        .await
        .map_err(|_| TransportError::timeout(format!("connect to {endpoint} timed out")))?
        .map_err(connect_error)?;

    let mut session = TcpRemoteSession { stream: Mutex::new(stream), dialect };
    session.authenticate(credential, method, workstation_id).await?;
    Ok(Box::new(session))
}

struct TcpRemoteSession {
    stream: Mutex<TcpStream>,
    dialect: ShellDialect,
}

impl TcpRemoteSession {
    async fn authenticate(&mut self, credential: &Credential, method: &str, workstation_id: Option<&str>) -> Result<(), TransportError> {
        let secret = match &credential.secret {
            Secret::Password(password) => escape_for_shell(password, self.dialect),
            Secret::PrivateKey(key) => escape_for_shell(key, self.dialect),
        };
        let target_hint = workstation_id.unwrap_or("-");
        let handshake =
            format!("AUTH {method} {target_hint} {} {}\n", escape_for_shell(&credential.username, self.dialect), secret);
        let mut stream = self.stream.lock().await;
        stream
            .write_all(handshake.as_bytes())
            .await
            .map_err(|err| TransportError::new(ErrorKind::ConnectionRefused, err.to_string()))?;

        let mut ack = [0u8; 2];
        stream
            .read_exact(&mut ack)
            .await
            .map_err(|err| TransportError::new(ErrorKind::ConnectionRefused, err.to_string()))?;
        if &ack != b"OK" {
            return Err(TransportError::auth_failed("remote session rejected credentials"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSession for TcpRemoteSession {
    async fn run_script(&self, script: &str, timeout: Duration) -> Result<SessionOutput, TransportError> {
        let mut stream = self.stream.lock().await;
        let payload = format!("RUN {}\n{}\n", script.len(), script);

        tokio::time::timeout(timeout, stream.write_all(payload.as_bytes()))
            .await
            .map_err(|_| TransportError::timeout("write timed out"))?
            .map_err(|err| TransportError::new(ErrorKind::ConnectionRefused, err.to_string()))?;

        let mut header = [0u8; 12];
        tokio::time::timeout(timeout, stream.read_exact(&mut header))
            .await
            .map_err(|_| TransportError::timeout("read timed out"))?
            .map_err(|err| TransportError::new(ErrorKind::ConnectionRefused, err.to_string()))?;

        let exit_code = i32::from_be_bytes(header[0..4].try_into().unwrap_or_default());
        let body_len = u64::from_be_bytes(header[4..12].try_into().unwrap_or_default()) as usize;

        let mut body = vec![0u8; body_len];
        tokio::time::timeout(timeout, stream.read_exact(&mut body))
            .await
            .map_err(|_| TransportError::timeout("read timed out"))?
            .map_err(|err| TransportError::new(ErrorKind::ConnectionRefused, err.to_string()))?;

        Ok(SessionOutput { std_out: String::from_utf8_lossy(&body).into_owned(), exit_code })
    }
}
