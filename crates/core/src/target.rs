// SPDX-License-Identifier: MIT

//! Fleet targets: reachable endpoints the appliance is responsible for.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Stable identifier for a fleet target, minted once at discovery time.
    ///
    /// Every downstream table (cooldowns, deploy state, flap windows) keys off
    /// this id rather than off hostname or IP — see the "hostname vs host id"
    /// open question in the design notes. A `HostId` is never recomputed from
    /// a hostname string; it is assigned once by [`crate::target::Target::new`]
    /// (or carried over from central-supplied target definitions) and then
    /// threaded through every component that talks about this host.
    pub struct HostId("hst-");
}

/// Platform family of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Linux,
    /// The appliance itself, probed through a local shell rather than a
    /// remote transport.
    SelfHost,
}

crate::simple_display! {
    Platform {
        Windows => "windows",
        Linux => "linux",
        SelfHost => "self",
    }
}

/// Trust posture for connecting to a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustFlags {
    /// When true, TLS certificate verification is skipped for this target
    /// (self-signed certs are common on freshly-enrolled workstations).
    #[serde(default)]
    pub allow_self_signed: bool,
}

/// A reachable fleet endpoint.
///
/// Owned by the scan orchestrator's target set; mutated only by the central
/// sync client (refreshed target definitions) and target discovery (newly
/// enumerated hosts). Never deleted mid-scan — removal is deferred to the
/// end of the current cycle so in-flight per-target work always sees a
/// consistent target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub host_id: HostId,
    /// IP address or FQDN.
    pub address: String,
    pub port: u16,
    pub platform: Platform,
    /// Opaque reference into the credential store; resolved lazily so that
    /// secrets never sit in the long-lived target snapshot.
    pub credential_ref: Option<String>,
    pub trust: TrustFlags,
}

impl Target {
    pub fn new(host_id: HostId, address: impl Into<String>, port: u16, platform: Platform) -> Self {
        Self {
            host_id,
            address: address.into(),
            port,
            platform,
            credential_ref: None,
            trust: TrustFlags::default(),
        }
    }

    /// Default remote-shell port for this platform (WinRM plaintext for
    /// Windows, SSH for Linux). Self-hosted targets have no network port.
    pub fn default_port(platform: Platform) -> u16 {
        match platform {
            Platform::Windows => 5985,
            Platform::Linux => 22,
            Platform::SelfHost => 0,
        }
    }

    pub fn with_credential_ref(mut self, credential_ref: impl Into<String>) -> Self {
        self.credential_ref = Some(credential_ref.into());
        self
    }

    pub fn with_trust(mut self, trust: TrustFlags) -> Self {
        self.trust = trust;
        self
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
