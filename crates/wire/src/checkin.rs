// SPDX-License-Identifier: MIT

//! `POST /api/appliances/checkin` request/response bodies.

use crate::order::OrderDto;
use appliance_core::Platform;
use serde::{Deserialize, Serialize};

/// System-info payload the appliance posts on every checkin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub appliance_id: Option<String>,
    pub hostname: String,
    pub addresses: Vec<String>,
    pub uptime_seconds: u64,
    pub version: String,
    pub public_key_fingerprint: String,
}

/// A target as described by central: one workstation or Linux host, with the
/// credential bundle needed to reach it. Decoded here as a loosely-typed DTO;
/// `appliance-sync` converts each entry into an `appliance_core::Target` plus
/// an `appliance_core::Credential` before anything downstream sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDto {
    pub host_id: String,
    pub address: String,
    pub port: Option<u16>,
    pub platform: Platform,
    pub username: String,
    pub password: Option<String>,
    pub private_key: Option<String>,
    pub privilege_escalation_secret: Option<String>,
    #[serde(default)]
    pub allow_self_signed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceMode {
    Auto,
    Manual,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Trialing,
    Unknown,
    Suspended,
}

impl SubscriptionState {
    pub fn healing_allowed(self) -> bool {
        matches!(self, SubscriptionState::Active | SubscriptionState::Trialing | SubscriptionState::Unknown)
    }
}

/// What central returns from a checkin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub appliance_id: String,
    pub server_public_key: Option<String>,
    pub pending_orders: Vec<OrderDto>,
    pub targets: Vec<TargetDto>,
    pub enabled_runbooks: Vec<String>,
    pub mode: ApplianceMode,
    pub subscription_state: SubscriptionState,
    #[serde(default)]
    pub trigger_drift_scan: bool,
}

#[cfg(test)]
#[path = "checkin_tests.rs"]
mod tests;
