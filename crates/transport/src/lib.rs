// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! appliance-transport: the remote-execution fabric (C1 Remote Executor, C2
//! Proxy Executor). The wire protocol a [`session::RemoteSession`] actually
//! speaks — WinRM, SSH, whatever a given deployment wires in — is opaque to
//! this crate; everything here is generic over the `SessionOpener`/
//! `RemoteSession` trait pair.

pub mod backoff;
pub mod error;
pub mod executor;
pub mod proxy;
pub mod session;
pub mod shell_quote;
pub mod staging;
pub mod sticky;

pub use error::TransportError;
pub use executor::{ExecuteRequest, Phase, RemoteExecutor, RemoteExecutorConfig};
pub use proxy::{AuthTier, ProxyAuthLadder, ProxyExecutor, TierCache};
pub use session::{RemoteSession, SessionOpener, SessionOutput};
pub use shell_quote::{escape_for_shell, ShellDialect};
pub use staging::DistributionPoint;
pub use sticky::StickyFailureSet;
