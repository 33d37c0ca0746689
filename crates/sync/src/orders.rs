// SPDX-License-Identifier: MIT

//! Sequential order processing. Orders are applied one at a time in arrival
//! order; each gets exactly one completion POST, success or failure. An
//! order whose wire type doesn't map to a known `OrderKind` fails fast
//! without calling any handler — `appliance-sync` never guesses at an
//! unrecognized type.

use crate::error::SyncError;
use appliance_core::OrderKind;
use appliance_rules::BundleVerifier;
use appliance_wire::{CompletionPayload, OrderDto, OrderKindWire};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

fn lift_kind(kind: &OrderKindWire) -> Result<OrderKind, SyncError> {
    Ok(match kind {
        OrderKindWire::ForceCheckin => OrderKind::ForceCheckin,
        OrderKindWire::TriggerDriftScan => OrderKind::TriggerDriftScan,
        OrderKindWire::SyncRules => OrderKind::SyncRules,
        OrderKindWire::RestartAgent => OrderKind::RestartAgent,
        OrderKindWire::RebuildOs => OrderKind::RebuildOs,
        OrderKindWire::UpdateAgent => OrderKind::UpdateAgent,
        OrderKindWire::UpdateIso => OrderKind::UpdateIso,
        OrderKindWire::CollectDiagnostic => OrderKind::CollectDiagnostic,
        OrderKindWire::SensorLifecycle => OrderKind::SensorLifecycle,
        OrderKindWire::PromotedRuleSync => OrderKind::PromotedRuleSync,
        OrderKindWire::HealingRun => OrderKind::HealingRun,
        OrderKindWire::CredentialRefresh => OrderKind::CredentialRefresh,
        OrderKindWire::Unknown => return Err(SyncError::UnknownOrderType),
    })
}

/// One handler per order kind, implemented by the daemon binary, which has
/// the wiring (scanner, rule loader, deploy orchestrator, storage) this
/// crate doesn't know about. Each returns the result map for the completion
/// payload, or a human-readable failure message.
#[async_trait]
pub trait OrderHandlers: Send + Sync {
    async fn force_checkin(&self) -> Result<Value, String>;
    async fn trigger_drift_scan(&self) -> Result<Value, String>;
    async fn sync_rules(&self, params: &Value) -> Result<Value, String>;
    async fn restart_agent(&self, params: &Value) -> Result<Value, String>;
    async fn rebuild_os(&self, order: &OrderDto) -> Result<Value, String>;
    async fn update_agent(&self, params: &Value) -> Result<Value, String>;
    async fn update_iso(&self, params: &Value) -> Result<Value, String>;
    async fn collect_diagnostic(&self, params: &Value) -> Result<Value, String>;
    async fn sensor_lifecycle(&self, params: &Value) -> Result<Value, String>;
    async fn promoted_rule_sync(&self, params: &Value) -> Result<Value, String>;
    async fn healing_run(&self, params: &Value) -> Result<Value, String>;
    async fn credential_refresh(&self, params: &Value) -> Result<Value, String>;
}

pub struct OrderProcessor<'a> {
    http: reqwest::Client,
    verifier: &'a BundleVerifier,
    handlers: &'a dyn OrderHandlers,
}

impl<'a> OrderProcessor<'a> {
    pub fn new(verifier: &'a BundleVerifier, handlers: &'a dyn OrderHandlers) -> Self {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_else(|_| reqwest::Client::new());
        Self { http, verifier, handlers }
    }

    /// Processes every pending order in the order received, posting a
    /// completion for each before moving to the next. Never parallelized —
    /// central relies on orders landing in sequence (e.g. `sync-rules` then
    /// `healing-run` against the freshly synced set).
    pub async fn process_all(&self, orders: Vec<OrderDto>) {
        for order in orders {
            self.process_one(order).await;
        }
    }

    async fn process_one(&self, order: OrderDto) {
        let completion_url = order.completion_url.clone();
        let payload = match self.handle(&order).await {
            Ok(result) => CompletionPayload::success(result),
            Err(message) => {
                warn!(order_id = %order.id, %message, "order failed");
                CompletionPayload::failure(message)
            }
        };
        self.post_completion(&completion_url, &payload, &order.id).await;
    }

    async fn handle(&self, order: &OrderDto) -> Result<Value, String> {
        let canonical: Value = serde_json::from_str(&order.canonical_payload).map_err(|err| err.to_string())?;
        let verified = self.verifier.verify(&canonical, Some(&order.signature)).map_err(|err| err.to_string())?;
        if !verified && self.verifier.has_known_key() {
            warn!(order_id = %order.id, "order accepted unsigned during rollout");
        }

        let kind = lift_kind(&order.kind).map_err(|err| err.to_string())?;
        info!(order_id = %order.id, %kind, "processing order");

        match kind {
            OrderKind::ForceCheckin => self.handlers.force_checkin().await,
            OrderKind::TriggerDriftScan => self.handlers.trigger_drift_scan().await,
            OrderKind::SyncRules => self.handlers.sync_rules(&order.params).await,
            OrderKind::RestartAgent => self.handlers.restart_agent(&order.params).await,
            OrderKind::RebuildOs => self.handlers.rebuild_os(order).await,
            OrderKind::UpdateAgent => self.handlers.update_agent(&order.params).await,
            OrderKind::UpdateIso => self.handlers.update_iso(&order.params).await,
            OrderKind::CollectDiagnostic => self.handlers.collect_diagnostic(&order.params).await,
            OrderKind::SensorLifecycle => self.handlers.sensor_lifecycle(&order.params).await,
            OrderKind::PromotedRuleSync => self.handlers.promoted_rule_sync(&order.params).await,
            OrderKind::HealingRun => self.handlers.healing_run(&order.params).await,
            OrderKind::CredentialRefresh => self.handlers.credential_refresh(&order.params).await,
        }
    }

    async fn post_completion(&self, url: &str, payload: &CompletionPayload, order_id: &str) {
        match self.http.post(url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(order_id, "order completion posted");
            }
            Ok(response) => {
                error!(order_id, status = %response.status(), "completion POST rejected");
            }
            Err(err) => {
                error!(order_id, %err, "completion POST failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
