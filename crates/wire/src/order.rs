// SPDX-License-Identifier: MIT

//! Order DTOs as received from central, before signature verification and
//! before the loose `type` string is lifted into `appliance_core::OrderKind`.

use serde::{Deserialize, Serialize};

/// The order-type tag as it appears on the wire. Kept as a string here
/// because central can introduce a type this build doesn't recognize yet;
/// `appliance-sync` maps known variants into `appliance_core::OrderKind` and
/// fails fast on anything else ("unknown order type"), per the dispatch
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderKindWire {
    ForceCheckin,
    TriggerDriftScan,
    SyncRules,
    RestartAgent,
    RebuildOs,
    UpdateAgent,
    UpdateIso,
    CollectDiagnostic,
    SensorLifecycle,
    PromotedRuleSync,
    HealingRun,
    CredentialRefresh,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OrderKindWire,
    #[serde(default)]
    pub params: serde_json::Value,
    pub nonce: u64,
    pub signature: String,
    /// The canonical-JSON payload the signature was computed over, exactly
    /// as sent — re-deriving it locally from the other fields would risk a
    /// spacing/ordering mismatch with the signer.
    pub canonical_payload: String,
    pub issued_epoch_ms: u64,
    pub completion_url: String,
}

#[cfg(test)]
#[path = "order_tests.rs"]
mod tests;
