// SPDX-License-Identifier: MIT

//! C6: the L1 rule engine. Iterates the loaded rule table in priority
//! order, applies the per-(rule, host, check) cooldown gate at match time
//! (not after execution, so a slow action can't cause thrashing), and
//! dispatches the matched rule's lifted [`Action`] to an injected
//! [`ActionExecutor`].

use crate::matcher::matches_conditions;
use appliance_core::{Action, Clock, CooldownKey, Incident, Rule};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, incident: &Incident, action: &Action) -> appliance_core::ExecutionResult;
}

/// A nil executor: dry-run mode. Returns success with `std_out = "DRY_RUN"`
/// without taking any corrective action, used when `HEALING_DRY_RUN` is set
/// or no executor has been wired yet.
pub struct DryRunExecutor;

#[async_trait]
impl ActionExecutor for DryRunExecutor {
    async fn execute(&self, _incident: &Incident, _action: &Action) -> appliance_core::ExecutionResult {
        appliance_core::ExecutionResult::success("DRY_RUN", 0)
    }
}

/// Lifts a rule's loosely-typed `action` string + `action_params` map into
/// the real [`Action`] sum type, the boundary between the free-form decode
/// shape rules are authored in and the typed shape everything downstream
/// works with.
pub fn lift_action(rule: &Rule) -> Action {
    match rule.action.as_str() {
        "run_script" => {
            let script = rule
                .action_params
                .get("script")
                .and_then(Value::as_str)
                .unwrap_or(rule.action.as_str())
                .to_string();
            let params = rule
                .action_params
                .iter()
                .filter(|(key, _)| key.as_str() != "script")
                .map(|(key, value)| (key.clone(), value_to_string(value)))
                .collect();
            Action::RunScript { script, params }
        }
        "escalate" => Action::Escalate { reason: rule.action_params.get("reason").and_then(Value::as_str).map(String::from) },
        "reset_counter" => Action::ResetCounter,
        "root_cause_fix" => Action::RootCauseFix {
            command: rule.action_params.get("command").and_then(Value::as_str).unwrap_or_default().to_string(),
            explanation: rule.action_params.get("explanation").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        other => Action::RunScript { script: other.to_string(), params: HashMap::new() },
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub enum EngineOutcome {
    Matched { rule_id: appliance_core::RuleId, result: appliance_core::ExecutionResult },
    /// Every rule either didn't match or was cooling down; `skipped_cooldowns`
    /// lists rules that would have matched but were suppressed.
    Unmatched { skipped_cooldowns: Vec<appliance_core::RuleId> },
}

pub struct RuleEngine<C: Clock> {
    rules: RwLock<Vec<Rule>>,
    cooldowns: Mutex<HashMap<CooldownKey, u64>>,
    clock: C,
}

impl<C: Clock> RuleEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { rules: RwLock::new(Vec::new()), cooldowns: Mutex::new(HashMap::new()), clock }
    }

    /// Atomically swaps in a newly loaded rule set, sorted by priority
    /// ascending. Loading order and id-collision handling are the caller's
    /// concern (see `appliance-rules::load`/`bundle`); this only sorts.
    pub fn reload(&self, mut rules: Vec<Rule>) {
        rules.sort_by_key(|rule| rule.priority);
        *self.rules.write() = rules;
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    pub async fn evaluate(&self, incident: &Incident, executor: &dyn ActionExecutor) -> EngineOutcome {
        let incident_json = serde_json::to_value(incident).unwrap_or(Value::Null);
        let rules = self.rules.read().clone();
        let mut skipped_cooldowns = Vec::new();

        for rule in &rules {
            if !rule.enabled || !rule.matches_severity(incident.severity) {
                continue;
            }
            if !matches_conditions(&rule.conditions, &incident_json) {
                continue;
            }

            let key: CooldownKey = (incident.host_id, incident.check_id.0.clone(), rule.id.clone());
            let now = self.clock.epoch_ms();
            let cooling_down = {
                let cooldowns = self.cooldowns.lock();
                cooldowns.get(&key).is_some_and(|&last| now.saturating_sub(last) < rule.cooldown_seconds * 1_000)
            };
            if cooling_down {
                debug!(rule_id = %rule.id, host_id = %incident.host_id, "rule matched but is cooling down, continuing search");
                skipped_cooldowns.push(rule.id.clone());
                continue;
            }

            // Recorded before execution: a slow action must not leave the
            // window open for a second concurrent match against the same pair.
            self.cooldowns.lock().insert(key, now);

            let action = lift_action(rule);
            let result = executor.execute(incident, &action).await;
            return EngineOutcome::Matched { rule_id: rule.id.clone(), result };
        }

        EngineOutcome::Unmatched { skipped_cooldowns }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
