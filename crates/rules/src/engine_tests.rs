// SPDX-License-Identifier: MIT

use super::*;
use appliance_core::{Condition, ExecutionResult, FakeClock, Finding, HostId, Operator, Platform, Provenance, Severity};
use parking_lot::Mutex as PMutex;
use serde_json::Value;
use std::sync::Arc;

fn sample_rule(id: &str, priority: i64, cooldown_seconds: u64) -> Rule {
    Rule {
        id: id.into(),
        name: "test rule".to_string(),
        conditions: vec![Condition::new("check_id", Operator::Eq, Value::String("firewall_status".into()))],
        action: "run_script".to_string(),
        action_params: HashMap::from([("script".to_string(), Value::String("RB-TEST-001".into()))]),
        severity_filter: vec![],
        priority,
        cooldown_seconds,
        max_retries: 0,
        enabled: true,
        provenance: Provenance::Custom,
        signature_verified: true,
    }
}

fn sample_incident() -> Incident {
    let finding = Finding::new(HostId::new(), "firewall_status", Severity::High, Platform::Windows, Value::Bool(true), Value::Bool(false));
    Incident::from_finding(finding, 1_000)
}

struct RecordingExecutor {
    calls: PMutex<Vec<String>>,
}

impl RecordingExecutor {
    fn new() -> Self {
        Self { calls: PMutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, _incident: &Incident, action: &Action) -> ExecutionResult {
        self.calls.lock().push(action.kind_name().to_string());
        ExecutionResult::success("ok", 1)
    }
}

#[tokio::test]
async fn first_match_wins_by_priority() {
    let clock = FakeClock::new();
    let engine = RuleEngine::new(clock.clone());
    engine.reload(vec![sample_rule("low-priority", 200, 600), sample_rule("high-priority", 10, 600)]);

    let executor = DryRunExecutor;
    let outcome = engine.evaluate(&sample_incident(), &executor).await;

    match outcome {
        EngineOutcome::Matched { rule_id, .. } => assert_eq!(rule_id.as_str(), "high-priority"),
        EngineOutcome::Unmatched { .. } => panic!("expected a match"),
    }
}

#[tokio::test]
async fn cooldown_suppresses_repeat_match_for_same_host_check_rule() {
    let clock = FakeClock::new();
    let engine = RuleEngine::new(clock.clone());
    engine.reload(vec![sample_rule("L1-FW-001", 100, 600)]);
    let executor = RecordingExecutor::new();

    let incident = sample_incident();
    let first = engine.evaluate(&incident, &executor).await;
    assert!(matches!(first, EngineOutcome::Matched { .. }));

    clock.advance(std::time::Duration::from_secs(60));
    let second = engine.evaluate(&incident, &executor).await;
    match second {
        EngineOutcome::Unmatched { skipped_cooldowns } => assert_eq!(skipped_cooldowns[0].as_str(), "L1-FW-001"),
        EngineOutcome::Matched { .. } => panic!("expected cooldown suppression"),
    }
    assert_eq!(executor.calls.lock().len(), 1);
}

#[tokio::test]
async fn cooldown_releases_after_window_elapses() {
    let clock = FakeClock::new();
    let engine = RuleEngine::new(clock.clone());
    engine.reload(vec![sample_rule("L1-FW-001", 100, 60)]);
    let executor = DryRunExecutor;

    let incident = sample_incident();
    assert!(matches!(engine.evaluate(&incident, &executor).await, EngineOutcome::Matched { .. }));

    clock.advance(std::time::Duration::from_secs(61));
    assert!(matches!(engine.evaluate(&incident, &executor).await, EngineOutcome::Matched { .. }));
}

#[tokio::test]
async fn disabled_rule_never_matches() {
    let clock = FakeClock::new();
    let engine = RuleEngine::new(clock.clone());
    let mut rule = sample_rule("disabled", 100, 600);
    rule.enabled = false;
    engine.reload(vec![rule]);
    let executor = DryRunExecutor;

    let outcome = engine.evaluate(&sample_incident(), &executor).await;
    assert!(matches!(outcome, EngineOutcome::Unmatched { .. }));
}

#[test]
fn lift_action_maps_run_script_params() {
    let rule = sample_rule("L1-FW-001", 100, 600);
    let action = lift_action(&rule);
    match action {
        Action::RunScript { script, params } => {
            assert_eq!(script, "RB-TEST-001");
            assert!(params.is_empty());
        }
        _ => panic!("expected RunScript"),
    }
}

#[test]
fn lift_action_maps_root_cause_fix() {
    let mut rule = sample_rule("L1-GPO-001", 100, 600);
    rule.action = "root_cause_fix".to_string();
    rule.action_params = HashMap::from([
        ("command".to_string(), Value::String("gpupdate /force".into())),
        ("explanation".to_string(), Value::String("inherited GPO disabled the firewall".into())),
    ]);

    match lift_action(&rule) {
        Action::RootCauseFix { command, explanation } => {
            assert_eq!(command, "gpupdate /force");
            assert_eq!(explanation, "inherited GPO disabled the firewall");
        }
        _ => panic!("expected RootCauseFix"),
    }
}
