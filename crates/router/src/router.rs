// SPDX-License-Identifier: MIT

//! C8: the healing router. Consumes one finding at a time — single-consumer,
//! no concurrent pipelines for the same input stream — and walks it through
//! the cooldown gate, the subscription gate, L1 (deterministic rules), L2
//! (remote planner, mode-aware), and finally L3 (structured-log escalation).
//!
//! Concurrency model: the router itself never awaits a side effect.
//! Telemetry posts, dashboard writes, and the firewall/GPO root-cause fix
//! are each handed to a [`BackgroundSpawner`] and forgotten; only the L1/L2
//! remediation dispatch (via the injected [`ActionExecutor`]) and the L2
//! planner call are awaited inline, since their outcome decides the
//! disposition.

use crate::cooldown::{CooldownDecision, CooldownPolicy, HealingCooldownTable};
use crate::sink::HealingSideEffects;
use appliance_core::{Action, BackgroundSpawner, Clock, Finding, Incident};
use appliance_planner::{PlannerClient, PlannerDecision, PlannerRouting};
use appliance_rules::{ActionExecutor, EngineOutcome, RuleEngine};
use appliance_wire::checkin::{ApplianceMode, SubscriptionState};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Terminal disposition recorded for every finding the router handles.
/// `SuppressedDisabled` is not named in the upstream disposition list but
/// follows the same shape — see DESIGN.md for why appliance mode gets its
/// own early exit rather than being folded into the subscription gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    HealedL1,
    HealedL2,
    EscalatedL3,
    SuppressedCooldown,
    SuppressedSubscription,
    SuppressedDisabled,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::HealedL1 => "healed-l1",
            Disposition::HealedL2 => "healed-l2",
            Disposition::EscalatedL3 => "escalated-l3",
            Disposition::SuppressedCooldown => "suppressed-cooldown",
            Disposition::SuppressedSubscription => "suppressed-subscription",
            Disposition::SuppressedDisabled => "suppressed-disabled",
        }
    }
}

const FIREWALL_CHECK_ID: &str = "firewall_status";

pub struct RouterConfig {
    pub l2_enabled: bool,
}

pub struct HealingRouter<C: Clock> {
    config: RouterConfig,
    cooldowns: HealingCooldownTable<C>,
    rule_engine: Arc<RuleEngine<C>>,
    action_executor: Arc<dyn ActionExecutor>,
    planner: Option<Arc<dyn PlannerClient>>,
    side_effects: Arc<dyn HealingSideEffects>,
    background: Arc<dyn BackgroundSpawner>,
    clock: C,
}

impl<C: Clock + 'static> HealingRouter<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RouterConfig,
        cooldown_policy: CooldownPolicy,
        rule_engine: Arc<RuleEngine<C>>,
        action_executor: Arc<dyn ActionExecutor>,
        planner: Option<Arc<dyn PlannerClient>>,
        side_effects: Arc<dyn HealingSideEffects>,
        background: Arc<dyn BackgroundSpawner>,
        clock: C,
    ) -> Self {
        Self {
            cooldowns: HealingCooldownTable::new(cooldown_policy, clock.clone()),
            config,
            rule_engine,
            action_executor,
            planner,
            side_effects,
            background,
            clock,
        }
    }

    pub async fn route(&self, finding: Finding, mode: ApplianceMode, subscription: SubscriptionState) -> Disposition {
        if !subscription.healing_allowed() {
            info!(host_id = %finding.host_id, check_id = %finding.check_id.as_str(), subscription_state = ?subscription, "healing suppressed: subscription not active");
            return Disposition::SuppressedSubscription;
        }
        if mode == ApplianceMode::Disabled {
            info!(host_id = %finding.host_id, check_id = %finding.check_id.as_str(), "healing suppressed: appliance disabled");
            return Disposition::SuppressedDisabled;
        }

        match self.cooldowns.check_and_record(finding.host_id, finding.check_id.as_str()) {
            CooldownDecision::Suppress => {
                info!(host_id = %finding.host_id, check_id = %finding.check_id.as_str(), "healing suppressed: cooldown window active");
                return Disposition::SuppressedCooldown;
            }
            CooldownDecision::Allow => {}
        }

        let incident = Incident::from_finding(finding, self.clock.epoch_ms());
        self.route_incident(incident, mode).await
    }

    async fn route_incident(&self, incident: Incident, mode: ApplianceMode) -> Disposition {
        match self.rule_engine.evaluate(&incident, self.action_executor.as_ref()).await {
            EngineOutcome::Matched { rule_id, result } => {
                info!(host_id = %incident.host_id, check_id = %incident.check_id.as_str(), %rule_id, success = result.is_success(), "L1 rule matched");
                self.fan_out(&incident, Disposition::HealedL1);
                if result.is_success() {
                    self.dispatch_dashboard_resolved(&incident, Disposition::HealedL1);
                    if incident.check_id.as_str() == FIREWALL_CHECK_ID {
                        self.dispatch_firewall_gpo_fix(incident.host_id);
                    }
                }
                Disposition::HealedL1
            }
            EngineOutcome::Unmatched { .. } => self.try_l2(incident, mode).await,
        }
    }

    async fn try_l2(&self, incident: Incident, mode: ApplianceMode) -> Disposition {
        let Some(planner) = self.planner.as_ref().filter(|_| self.config.l2_enabled) else {
            return self.escalate_to_l3(incident, "L2 disabled or not configured").await;
        };

        let decision = match planner.plan(&incident).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(host_id = %incident.host_id, check_id = %incident.check_id.as_str(), error = %err, "planner unavailable, escalating to L3");
                return self.escalate_to_l3(incident, "planner unavailable").await;
            }
        };

        match routing_for(&decision, mode) {
            PlannerRouting::AutoApply => {
                let action = lift_planner_action(&decision);
                let result = self.action_executor.execute(&incident, &action).await;
                info!(host_id = %incident.host_id, check_id = %incident.check_id.as_str(), confidence = decision.confidence, success = result.is_success(), "L2 decision applied");
                self.fan_out(&incident, Disposition::HealedL2);
                if result.is_success() {
                    self.dispatch_dashboard_resolved(&incident, Disposition::HealedL2);
                }
                Disposition::HealedL2
            }
            PlannerRouting::ApprovalArtifact => {
                let reason = format!(
                    "planner recommended '{}' at confidence {:.2} but requires human approval: {}",
                    decision.recommended_action, decision.confidence, decision.reasoning
                );
                self.escalate_to_l3(incident, &reason).await
            }
        }
    }

    async fn escalate_to_l3(&self, incident: Incident, reason: &str) -> Disposition {
        tracing::error!(
            incident_id = %incident.id,
            host_id = %incident.host_id,
            check_id = %incident.check_id.as_str(),
            compliance_tag = ?incident.finding.compliance_tag,
            reason,
            "incident escalated to L3"
        );
        self.fan_out(&incident, Disposition::EscalatedL3);
        self.dispatch_dashboard_resolved(&incident, Disposition::EscalatedL3);
        Disposition::EscalatedL3
    }

    fn fan_out(&self, incident: &Incident, disposition: Disposition) {
        let incident = incident.clone();
        let sink = self.side_effects.clone();
        self.background.spawn(Box::pin(async move {
            sink.record_telemetry(&incident, disposition).await;
        }));
    }

    fn dispatch_dashboard_resolved(&self, incident: &Incident, disposition: Disposition) {
        let incident = incident.clone();
        let sink = self.side_effects.clone();
        self.background.spawn(Box::pin(async move {
            sink.notify_dashboard(&incident, disposition).await;
        }));
    }

    fn dispatch_firewall_gpo_fix(&self, host_id: appliance_core::HostId) {
        let sink = self.side_effects.clone();
        self.background.spawn(Box::pin(async move {
            sink.run_firewall_gpo_fix(host_id).await;
        }));
    }
}

/// Applies the mode-aware routing rule from the decision semantics: even an
/// executable decision is funneled to L3 as an approval artifact while the
/// appliance is in manual mode.
fn routing_for(decision: &PlannerDecision, mode: ApplianceMode) -> PlannerRouting {
    if decision.is_executable() && mode != ApplianceMode::Manual {
        PlannerRouting::AutoApply
    } else {
        PlannerRouting::ApprovalArtifact
    }
}

fn lift_planner_action(decision: &PlannerDecision) -> Action {
    let params = decision
        .action_params
        .iter()
        .map(|(key, value)| (key.clone(), value_to_string(value)))
        .collect::<HashMap<_, _>>();
    Action::RunScript { script: decision.recommended_action.clone(), params }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
