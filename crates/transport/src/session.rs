// SPDX-License-Identifier: MIT

//! The seam between this crate's retry/auth-ladder/backoff logic and the
//! actual remote-shell wire protocol. Concrete transports (WinRM over TCP,
//! SSH, a test double) implement [`SessionOpener`]/[`RemoteSession`]; nothing
//! above this module knows or cares which one is wired in.

use crate::error::TransportError;
use appliance_core::{Credential, Target};
use async_trait::async_trait;
use std::time::Duration;

pub struct SessionOutput {
    pub std_out: String,
    pub exit_code: i32,
}

/// One open remote-shell session, already authenticated.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn run_script(&self, script: &str, timeout: Duration) -> Result<SessionOutput, TransportError>;
}

/// Opens a [`RemoteSession`] against a target with a given credential. A
/// single call is "one attempt" in the retry algorithm: open transport,
/// authenticate, hand back a session or a classified error.
#[async_trait]
pub trait SessionOpener: Send + Sync {
    async fn open(&self, target: &Target, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError>;
}
