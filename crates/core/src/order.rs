// SPDX-License-Identifier: MIT

//! Orders: signed directives pushed down from the central command server
//! during a checkin, applied sequentially in the order received.

use serde::{Deserialize, Serialize};

crate::define_str_id! {
    /// Assigned by the central command server, not minted locally.
    pub struct OrderId;
}

/// Order types named in the central sync contract. `appliance-wire`'s
/// `OrderKindWire` is the tolerant decode-boundary version of this same list
/// (with an `Unknown` catch-all); `appliance-sync` maps a recognized wire
/// kind into one of these before an order is queued for sequential
/// processing, and fails the order fast if the wire kind didn't map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
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
}

crate::simple_display! {
    OrderKind {
        ForceCheckin => "force_checkin",
        TriggerDriftScan => "trigger_drift_scan",
        SyncRules => "sync_rules",
        RestartAgent => "restart_agent",
        RebuildOs => "rebuild_os",
        UpdateAgent => "update_agent",
        UpdateIso => "update_iso",
        CollectDiagnostic => "collect_diagnostic",
        SensorLifecycle => "sensor_lifecycle",
        PromotedRuleSync => "promoted_rule_sync",
        HealingRun => "healing_run",
        CredentialRefresh => "credential_refresh",
    }
}

/// A single order as received over the wire. `payload` and `signature` are
/// carried opaquely here; `appliance-rules`'s verifier is what actually
/// checks `signature` against the canonical encoding of `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub kind: OrderKind,
    /// Monotonically increasing per appliance, rejects replay of a stale order.
    pub nonce: u64,
    pub payload: serde_json::Value,
    pub signature: String,
    pub issued_epoch_ms: u64,
}

impl Order {
    /// The bytes the signature was computed over: canonical JSON of
    /// `(id, kind, nonce, payload, issued_epoch_ms)`, sorted keys, no
    /// insignificant whitespace. Kept here so both the sync client that
    /// verifies inbound orders and any test fixture that signs a fake one
    /// agree on the exact byte sequence.
    pub fn canonical_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.0,
            "kind": self.kind,
            "nonce": self.nonce,
            "payload": self.payload,
            "issued_epoch_ms": self.issued_epoch_ms,
        })
    }
}

#[cfg(test)]
#[path = "order_tests.rs"]
mod tests;
