// SPDX-License-Identifier: MIT

//! Credential bundles. Never logged — [`Credential`] has a hand-written
//! `Debug` impl that redacts every secret field, so an accidental `{:?}` in a
//! log line or error message can't leak a password or private key.

use serde::{Deserialize, Serialize};

/// The secret half of a credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Secret {
    Password(String),
    PrivateKey(String),
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Secret::Password(_) => write!(f, "Password(<redacted>)"),
            Secret::PrivateKey(_) => write!(f, "PrivateKey(<redacted>)"),
        }
    }
}

/// An opaque credential bundle: username plus a secret, and an optional
/// privilege-escalation secret (e.g. sudo password, enable secret).
///
/// Injected by the central sync client into targets and never written to
/// disk in cleartext except through the state persistor, which restricts the
/// file to owner-only permissions.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub secret: Secret,
    pub privilege_escalation_secret: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &self.secret)
            .field(
                "privilege_escalation_secret",
                &self.privilege_escalation_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credential {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Password(password.into()),
            privilege_escalation_secret: None,
        }
    }

    pub fn private_key(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::PrivateKey(key.into()),
            privilege_escalation_secret: None,
        }
    }

    pub fn with_privilege_escalation(mut self, secret: impl Into<String>) -> Self {
        self.privilege_escalation_secret = Some(secret.into());
        self
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
