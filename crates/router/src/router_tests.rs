use super::*;
use appliance_core::{Condition, ExecutionResult, FakeClock, HostId, NullSpawner, Operator, Platform, Provenance, Rule, Severity};
use appliance_planner::PlannerError;
use async_trait::async_trait;
use parking_lot::Mutex as PMutex;
use serde_json::Value;
use std::sync::Arc;

fn firewall_rule() -> Rule {
    Rule {
        id: "L1-FW-001".into(),
        name: "firewall drift".to_string(),
        conditions: vec![Condition::new("check_id", Operator::Eq, Value::String("firewall_status".into()))],
        action: "run_script".to_string(),
        action_params: HashMap::from([("script".to_string(), Value::String("RB-FW-001".into()))]),
        severity_filter: vec![],
        priority: 10,
        cooldown_seconds: 600,
        max_retries: 0,
        enabled: true,
        provenance: Provenance::Builtin,
        signature_verified: true,
    }
}

fn finding(check_id: &str) -> Finding {
    Finding::new(HostId::new(), check_id, Severity::High, Platform::Windows, Value::Bool(true), Value::Bool(false))
}

struct RecordingExecutor {
    calls: PMutex<Vec<String>>,
    succeed: bool,
}

impl RecordingExecutor {
    fn new(succeed: bool) -> Self {
        Self { calls: PMutex::new(Vec::new()), succeed }
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, _incident: &Incident, action: &Action) -> ExecutionResult {
        self.calls.lock().push(action.kind_name().to_string());
        if self.succeed {
            ExecutionResult::success("ok", 1)
        } else {
            ExecutionResult::Failure { kind: appliance_core::ErrorKind::ScriptError, message: "boom".into(), duration_ms: 1 }
        }
    }
}

struct StubPlanner {
    decision: PlannerDecision,
}

#[async_trait]
impl PlannerClient for StubPlanner {
    async fn plan(&self, _incident: &Incident) -> Result<PlannerDecision, PlannerError> {
        Ok(self.decision.clone())
    }
}

struct FailingPlanner;

#[async_trait]
impl PlannerClient for FailingPlanner {
    async fn plan(&self, _incident: &Incident) -> Result<PlannerDecision, PlannerError> {
        Err(PlannerError::DailyBudgetExhausted)
    }
}

#[derive(Default)]
struct RecordingSideEffects {
    telemetry: PMutex<Vec<Disposition>>,
    gpo_fixes: PMutex<Vec<HostId>>,
}

#[async_trait]
impl HealingSideEffects for RecordingSideEffects {
    async fn record_telemetry(&self, _incident: &Incident, disposition: Disposition) {
        self.telemetry.lock().push(disposition);
    }
    async fn notify_dashboard(&self, _incident: &Incident, _disposition: Disposition) {}
    async fn run_firewall_gpo_fix(&self, host_id: HostId) {
        self.gpo_fixes.lock().push(host_id);
    }
}

fn router_with(
    executor_succeeds: bool,
    planner: Option<Arc<dyn PlannerClient>>,
    l2_enabled: bool,
) -> (HealingRouter<FakeClock>, Arc<RecordingSideEffects>) {
    let clock = FakeClock::new();
    let engine = Arc::new(RuleEngine::new(clock.clone()));
    engine.reload(vec![firewall_rule()]);
    let side_effects = Arc::new(RecordingSideEffects::default());
    let router = HealingRouter::new(
        RouterConfig { l2_enabled },
        CooldownPolicy::default(),
        engine,
        Arc::new(RecordingExecutor::new(executor_succeeds)),
        planner,
        side_effects.clone(),
        Arc::new(NullSpawner),
        clock,
    );
    (router, side_effects)
}

#[tokio::test]
async fn subscription_not_active_suppresses_before_any_matching() {
    let (router, _) = router_with(true, None, false);
    let disposition = router.route(finding("firewall_status"), ApplianceMode::Auto, SubscriptionState::Suspended).await;
    assert_eq!(disposition, Disposition::SuppressedSubscription);
}

#[tokio::test]
async fn disabled_mode_suppresses_before_matching() {
    let (router, _) = router_with(true, None, false);
    let disposition = router.route(finding("firewall_status"), ApplianceMode::Disabled, SubscriptionState::Active).await;
    assert_eq!(disposition, Disposition::SuppressedDisabled);
}

#[tokio::test]
async fn l1_match_heals_the_firewall_finding() {
    let (router, _side_effects) = router_with(true, None, false);
    let host = HostId::new();
    let f = Finding::new(host, "firewall_status", Severity::High, Platform::Windows, Value::Bool(true), Value::Bool(false));

    let disposition = router.route(f, ApplianceMode::Auto, SubscriptionState::Active).await;

    assert_eq!(disposition, Disposition::HealedL1);
}

#[tokio::test]
async fn second_firewall_finding_within_cooldown_is_suppressed() {
    let (router, _) = router_with(true, None, false);
    let host = HostId::new();

    let first = router
        .route(
            Finding::new(host, "firewall_status", Severity::High, Platform::Windows, Value::Bool(true), Value::Bool(false)),
            ApplianceMode::Auto,
            SubscriptionState::Active,
        )
        .await;
    assert_eq!(first, Disposition::HealedL1);

    let second = router
        .route(
            Finding::new(host, "firewall_status", Severity::High, Platform::Windows, Value::Bool(true), Value::Bool(false)),
            ApplianceMode::Auto,
            SubscriptionState::Active,
        )
        .await;
    assert_eq!(second, Disposition::SuppressedCooldown);
}

#[tokio::test]
async fn unmatched_finding_with_l2_disabled_escalates_to_l3() {
    let (router, _) = router_with(true, None, false);
    let disposition = router.route(finding("unrelated_check"), ApplianceMode::Auto, SubscriptionState::Active).await;
    assert_eq!(disposition, Disposition::EscalatedL3);
}

#[tokio::test]
async fn executable_l2_decision_is_auto_applied_in_auto_mode() {
    let decision = PlannerDecision {
        recommended_action: "Restart-Service wuauserv".into(),
        action_params: HashMap::new(),
        confidence: 0.82,
        requires_approval: false,
        escalate_to_l3: false,
        reasoning: "service observed stopped".into(),
        runbook_id: None,
    };
    let planner: Arc<dyn PlannerClient> = Arc::new(StubPlanner { decision });
    let (router, _) = router_with(true, Some(planner), true);

    let disposition = router.route(finding("unrelated_check"), ApplianceMode::Auto, SubscriptionState::Active).await;
    assert_eq!(disposition, Disposition::HealedL2);
}

/// Mirrors the planner-manual-mode example: an executable decision is still
/// funneled to L3 while the appliance is in manual mode, and the executor is
/// never invoked.
#[tokio::test]
async fn executable_l2_decision_in_manual_mode_is_an_approval_artifact() {
    let decision = PlannerDecision {
        recommended_action: "Restart-Service wuauserv".into(),
        action_params: HashMap::new(),
        confidence: 0.82,
        requires_approval: false,
        escalate_to_l3: false,
        reasoning: "service observed stopped".into(),
        runbook_id: None,
    };
    let planner: Arc<dyn PlannerClient> = Arc::new(StubPlanner { decision });
    let (router, _) = router_with(true, Some(planner), true);

    let disposition = router.route(finding("unrelated_check"), ApplianceMode::Manual, SubscriptionState::Active).await;
    assert_eq!(disposition, Disposition::EscalatedL3);
}

#[tokio::test]
async fn planner_failure_falls_through_to_l3() {
    let planner: Arc<dyn PlannerClient> = Arc::new(FailingPlanner);
    let (router, _) = router_with(true, Some(planner), true);

    let disposition = router.route(finding("unrelated_check"), ApplianceMode::Auto, SubscriptionState::Active).await;
    assert_eq!(disposition, Disposition::EscalatedL3);
}

struct TokioSpawner;

impl BackgroundSpawner for TokioSpawner {
    fn spawn(&self, task: appliance_core::BackgroundFuture) {
        tokio::spawn(task);
    }
}

/// Exercises the actual fire-and-forget dispatch (not just the routing
/// decision): a real spawner is wired so the telemetry post and the
/// firewall/GPO root-cause fix both get a chance to run before asserting.
#[tokio::test]
async fn firewall_heal_fans_out_telemetry_and_the_gpo_fix() {
    let clock = FakeClock::new();
    let engine = Arc::new(RuleEngine::new(clock.clone()));
    engine.reload(vec![firewall_rule()]);
    let side_effects = Arc::new(RecordingSideEffects::default());
    let router = HealingRouter::new(
        RouterConfig { l2_enabled: false },
        CooldownPolicy::default(),
        engine,
        Arc::new(RecordingExecutor::new(true)),
        None,
        side_effects.clone(),
        Arc::new(TokioSpawner),
        clock,
    );

    let host = HostId::new();
    let disposition = router
        .route(
            Finding::new(host, "firewall_status", Severity::High, Platform::Windows, Value::Bool(true), Value::Bool(false)),
            ApplianceMode::Auto,
            SubscriptionState::Active,
        )
        .await;
    assert_eq!(disposition, Disposition::HealedL1);

    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    assert_eq!(side_effects.telemetry.lock().as_slice(), [Disposition::HealedL1]);
    assert_eq!(side_effects.gpo_fixes.lock().as_slice(), [host]);
}
