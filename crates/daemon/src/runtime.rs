// SPDX-License-Identifier: MIT

//! Ties every component crate together: the startup sequence (load state,
//! load or mint the signing key, complete a pending rebuild if one is
//! outstanding, load rules), the checkin/scan ticker loop, and the two
//! long-lived HTTP servers, all bounded by one graceful-shutdown path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use appliance_core::{BackgroundSpawner, Credential, HostId, OneShotRegistry, Platform, Target};
use appliance_deploy::{DeployOrchestrator, DeployStateTable};
use appliance_discovery::{HostIdentityRegistry, TargetDiscovery};
use appliance_planner::{BudgetGate, BudgetLimits, HttpPlannerClient, PlannerClient};
use appliance_router::cooldown::CooldownPolicy;
use appliance_router::{HealingRouter, RouterConfig};
use appliance_rules::{BundleVerifier, DryRunExecutor, RuleEngine};
use appliance_scanner::{ScanDispatcher, ScanOrchestrator, ScanScripts, ScanTargets};
use appliance_storage::{RebuildMarkers, SigningKey, StatePersistor};
use appliance_sync::{CheckinClient, OrderProcessor, RebuildCoordinator};
use appliance_transport::staging::DistributionPoint;
use appliance_transport::{ProxyExecutor, RemoteExecutor, RemoteExecutorConfig, StickyFailureSet, TierCache};
use appliance_wire::checkin::{ApplianceMode, CheckinRequest, SubscriptionState};
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::adapters::{
    DaemonActionExecutor, DaemonEvidenceSigner, DaemonOrderHandlers, FilesystemDistributionPointUploader, HttpSideEffects,
    ProcessLocalShell, ScriptedDeployStage, ScriptedDirectoryQuery, ScriptedProxyAuthLadder, TcpSessionOpener,
};
use crate::background::TaskPool;
use crate::config::Config;
use crate::credential_store::FleetRegistry;
use crate::http::agent_rpc::{self, AgentRpcState};
use crate::http::file_server::{self, AgentFileServer};
use crate::rules_loader::{self, RuleDirs};
use crate::shutdown::ShutdownCoordinator;
use crate::AppClock;

const SCAN_SCRIPT_SELF_HOST: &str = include_str!("../scripts/scan_self_host.sh");
const SCAN_SCRIPT_WINDOWS: &str = include_str!("../scripts/scan_windows.ps1");
const SCAN_SCRIPT_LINUX: &str = include_str!("../scripts/scan_linux.sh");

/// Mints a stable id for the appliance's own host once, then reuses it on
/// every later boot — deploy/scan/cooldown state is keyed by `HostId` and
/// must never shift under a restart.
fn load_or_mint_self_host_id(state_dir: &std::path::Path) -> std::io::Result<HostId> {
    let path = state_dir.join("self_host_id");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(HostId::from(contents.trim())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let id = HostId::new();
            std::fs::create_dir_all(state_dir)?;
            std::fs::write(&path, id.to_string())?;
            Ok(id)
        }
        Err(err) => Err(err),
    }
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "appliance".to_string())
}

pub struct Daemon {
    config: Config,
    shutdown: ShutdownCoordinator,
    task_pool: Arc<TaskPool>,
    fleet: Arc<FleetRegistry>,
    identities: Arc<HostIdentityRegistry>,
    mode_state: Arc<RwLock<(ApplianceMode, SubscriptionState)>>,
    bundle_verifier: Arc<BundleVerifier>,
    healing_router: Arc<HealingRouter<AppClock>>,
    scan_orchestrator: Arc<ScanOrchestrator<AppClock>>,
    scan_targets: Arc<RwLock<ScanTargets>>,
    rebuild_coordinator: Arc<RebuildCoordinator<AppClock>>,
    checkin_client: Arc<CheckinClient>,
    order_handlers: Arc<DaemonOrderHandlers>,
    file_server: Arc<AgentFileServer>,
    agent_rpc_state: Arc<AgentRpcState>,
    checkin_requested: Arc<Notify>,
    evidence_signer: Arc<DaemonEvidenceSigner>,
    signing_key: Arc<SigningKey>,
    self_host_id: HostId,
    appliance_id: Arc<RwLock<Option<String>>>,
    target_discovery: Arc<TargetDiscovery>,
    discovery_interval: Duration,
}

impl Daemon {
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.state_dir)?;

        let shutdown = ShutdownCoordinator::new(config.shutdown_grace);
        let self_host_id = load_or_mint_self_host_id(&config.state_dir)?;
        let signing_key = Arc::new(SigningKey::load_or_generate(config.state_dir.join("signing_key.hex"))?);
        let evidence_signer = Arc::new(DaemonEvidenceSigner::new(signing_key.clone()));
        let fleet = Arc::new(FleetRegistry::new());
        let identities = Arc::new(HostIdentityRegistry::new());
        let one_shots = Arc::new(OneShotRegistry::new());
        let state_persistor = StatePersistor::new(&config.state_dir);

        let persisted = state_persistor.load()?;
        let (mode, subscription) = persisted
            .as_ref()
            .map(|state| (state.mode, state.subscription))
            .unwrap_or((ApplianceMode::Auto, SubscriptionState::Unknown));
        let mode_state = Arc::new(RwLock::new((mode, subscription)));

        let task_pool = Arc::new(TaskPool::new(16, tokio::runtime::Handle::current()));

        let local_shell: Arc<dyn appliance_scanner::LocalShell> = Arc::new(ProcessLocalShell::default());
        let session_opener = Arc::new(TcpSessionOpener::new());
        let direct_executor = Arc::new(RemoteExecutor::new(session_opener, RemoteExecutorConfig::default()));
        let proxy_ladder = Arc::new(ScriptedProxyAuthLadder::new());
        let tier_cache = Arc::new(TierCache::new());
        let proxy_executor = Arc::new(ProxyExecutor::new(proxy_ladder, tier_cache.clone()));
        let sticky = Arc::new(StickyFailureSet::new());

        let directory_server_id = identities.resolve_or_mint(&config.directory_server.external_id);
        let directory_server_target =
            Target::new(directory_server_id, config.directory_server.address.clone(), config.directory_server.port, Platform::Windows);
        let directory_server_credential = match &config.directory_server.private_key_pem {
            Some(key) => Credential::private_key(config.directory_server.username.clone(), key.clone()),
            None => Credential::password(config.directory_server.username.clone(), config.directory_server.password.clone().unwrap_or_default()),
        };

        let directory_query = Arc::new(ScriptedDirectoryQuery::new(
            direct_executor.clone(),
            directory_server_target.clone(),
            directory_server_credential,
        ));
        let target_discovery = Arc::new(TargetDiscovery::new(directory_query, identities.clone()));

        let action_executor = Arc::new(DaemonActionExecutor::new(
            fleet.clone(),
            direct_executor.clone(),
            proxy_executor.clone(),
            tier_cache.clone(),
            sticky.clone(),
            local_shell.clone(),
            directory_server_id,
            self_host_id,
        ));

        let rule_engine = Arc::new(RuleEngine::new(AppClock::default()));
        let bundle_verifier = Arc::new(BundleVerifier::new());
        let rule_dirs = RuleDirs::new(&config.state_dir);
        let initial_rules = rules_loader::load_all(&rule_dirs, &bundle_verifier).map_err(anyhow::Error::msg)?;
        rule_engine.reload(initial_rules);

        let planner: Option<Arc<dyn PlannerClient>> = if config.l2_enabled {
            let limits = BudgetLimits {
                daily_spend_cap_usd: config.planner.daily_spend_cap_usd,
                calls_per_hour_cap: config.planner.calls_per_hour_cap,
                concurrent_calls_cap: config.planner.concurrent_calls_cap,
            };
            let budget = BudgetGate::new(limits, AppClock::default());
            Some(Arc::new(HttpPlannerClient::new(config.planner.endpoint.clone(), budget, config.planner.call_cost_usd)))
        } else {
            None
        };

        let http_client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;

        let side_effects: Arc<dyn appliance_router::HealingSideEffects> = Arc::new(HttpSideEffects::new(
            http_client.clone(),
            config.central_base_url.clone(),
            config.api_key.clone(),
            direct_executor.clone(),
            fleet.clone(),
            one_shots.clone(),
            directory_server_id,
        ));

        let dry_run_executor: Arc<dyn appliance_rules::ActionExecutor> =
            if config.healing_dry_run { Arc::new(DryRunExecutor) } else { action_executor.clone() };

        let healing_router = Arc::new(HealingRouter::new(
            RouterConfig { l2_enabled: config.l2_enabled },
            CooldownPolicy::default(),
            rule_engine.clone(),
            dry_run_executor,
            planner,
            side_effects,
            task_pool.clone() as Arc<dyn BackgroundSpawner>,
            AppClock::default(),
        ));

        let scan_dispatcher = Arc::new(ScanDispatcher::new(
            direct_executor.clone(),
            proxy_executor.clone(),
            tier_cache.clone(),
            sticky.clone(),
            local_shell.clone(),
            Duration::from_secs(120),
        ));
        let scan_orchestrator = Arc::new(ScanOrchestrator::new(
            scan_dispatcher,
            ScanScripts {
                self_host: SCAN_SCRIPT_SELF_HOST.to_string(),
                windows: SCAN_SCRIPT_WINDOWS.to_string(),
                linux: SCAN_SCRIPT_LINUX.to_string(),
            },
            AppClock::default(),
            self_host_id,
            self_host_platform(),
        ));
        let scan_targets = Arc::new(RwLock::new(ScanTargets { directory_server: directory_server_target, workstations: Vec::new() }));

        let uploader = Arc::new(FilesystemDistributionPointUploader::new(config.state_dir.join("distribution")));
        let distribution_point = Arc::new(DistributionPoint::new(uploader));
        let distribution_base_url = format!("http://127.0.0.1:{}/agent/distribution", config.agent_file_server_port);
        let deploy_stage = Arc::new(ScriptedDeployStage::new(direct_executor.clone(), distribution_point, distribution_base_url));
        let deploy_states = Arc::new(DeployStateTable::new());
        let deploy_orchestrator = Arc::new(DeployOrchestrator::new(
            deploy_stage,
            deploy_states,
            AppClock::default(),
            config.control_plane_address.clone(),
        ));

        let rebuild_markers = RebuildMarkers::new(&config.state_dir);
        let rebuild_coordinator = Arc::new(RebuildCoordinator::new(rebuild_markers, AppClock::default()));

        let checkin_client = Arc::new(CheckinClient::new(
            format!("{}/api/appliances/checkin", config.central_base_url.trim_end_matches('/')),
            config.api_key.clone(),
        ));

        let agent_dir = config.state_dir.join("agent");
        std::fs::create_dir_all(&agent_dir)?;
        let file_server = AgentFileServer::new(agent_dir, "appliance-agent");

        let checkin_requested = Arc::new(Notify::new());

        let order_handlers = Arc::new(DaemonOrderHandlers {
            state_dir: config.state_dir.clone(),
            rule_engine: rule_engine.clone(),
            bundle_verifier: bundle_verifier.clone(),
            scan_orchestrator: scan_orchestrator.clone(),
            scan_targets: scan_targets.clone(),
            fleet: fleet.clone(),
            evidence_signer: evidence_signer.clone(),
            deploy_orchestrator: deploy_orchestrator.clone(),
            rebuild_coordinator: rebuild_coordinator.clone(),
            direct_executor: direct_executor.clone(),
            local_shell: local_shell.clone(),
            healing_router: healing_router.clone(),
            identities: identities.clone(),
            signing_key: signing_key.clone(),
            one_shots: one_shots.clone(),
            scan_cancel: shutdown.token(),
            checkin_requested: checkin_requested.clone(),
            mode_state: mode_state.clone(),
            http: http_client.clone(),
        });

        let agent_rpc_state = Arc::new(AgentRpcState {
            fleet: fleet.clone(),
            file_server: file_server.clone(),
            healing_router: healing_router.clone(),
            mode_state: mode_state.clone(),
        });

        let discovery_interval = config.directory_server.discovery_interval;

        Ok(Self {
            shutdown,
            config,
            task_pool,
            fleet,
            identities,
            mode_state,
            bundle_verifier,
            healing_router,
            scan_orchestrator,
            scan_targets,
            rebuild_coordinator,
            checkin_client,
            order_handlers,
            file_server,
            agent_rpc_state,
            checkin_requested,
            evidence_signer,
            signing_key,
            self_host_id,
            appliance_id: Arc::new(RwLock::new(None)),
            target_discovery,
            discovery_interval,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        if let Some(pending) = self.rebuild_coordinator.pending_order()? {
            tracing::info!(order_id = %pending.order_id, "resuming after rebuild-os, will complete on first successful checkin");
        }

        let shutdown_token = self.shutdown.token();

        let file_server_router = file_server::router(self.file_server.clone());
        let file_server_addr = SocketAddr::from(([0, 0, 0, 0], self.config.agent_file_server_port));
        let file_server_listener = tokio::net::TcpListener::bind(file_server_addr).await?;
        let file_server_token = shutdown_token.clone();
        let file_server_task = tokio::spawn(async move {
            let _ = axum::serve(file_server_listener, file_server_router)
                .with_graceful_shutdown(async move { file_server_token.cancelled().await })
                .await;
        });

        let agent_rpc_router = agent_rpc::router(self.agent_rpc_state.clone());
        let agent_rpc_addr = SocketAddr::from(([0, 0, 0, 0], self.config.agent_rpc_port));
        let agent_rpc_listener = tokio::net::TcpListener::bind(agent_rpc_addr).await?;
        let agent_rpc_token = shutdown_token.clone();
        let agent_rpc_task = tokio::spawn(async move {
            let _ = axum::serve(agent_rpc_listener, agent_rpc_router)
                .with_graceful_shutdown(async move { agent_rpc_token.cancelled().await })
                .await;
        });

        let signal_wait = self.shutdown.wait_for_signal();
        tokio::pin!(signal_wait);

        let mut checkin_interval = tokio::time::interval(self.config.checkin_interval);
        let mut scan_interval = tokio::time::interval(self.config.scan_interval);
        let mut discovery_interval = tokio::time::interval(self.discovery_interval);
        let checkin_in_flight = Arc::new(tokio::sync::Mutex::new(()));
        let scan_in_flight = Arc::new(tokio::sync::Mutex::new(()));

        loop {
            tokio::select! {
                _ = &mut signal_wait => break,
                _ = checkin_interval.tick() => self.spawn_checkin(checkin_in_flight.clone(), scan_in_flight.clone()),
                _ = self.checkin_requested.notified() => self.spawn_checkin(checkin_in_flight.clone(), scan_in_flight.clone()),
                _ = scan_interval.tick() => self.spawn_scan(scan_in_flight.clone()),
                _ = discovery_interval.tick() => self.spawn_discovery(),
            }
        }

        file_server_task.abort();
        agent_rpc_task.abort();
        self.shutdown.drain(&self.task_pool).await;
        Ok(())
    }

    fn spawn_checkin(&self, checkin_lock: Arc<tokio::sync::Mutex<()>>, scan_lock: Arc<tokio::sync::Mutex<()>>) {
        let Ok(_guard) = checkin_lock.clone().try_lock_owned() else {
            tracing::debug!("checkin already in flight, skipping this tick");
            return;
        };
        let checkin_client = self.checkin_client.clone();
        let fleet = self.fleet.clone();
        let identities = self.identities.clone();
        let mode_state = self.mode_state.clone();
        let bundle_verifier = self.bundle_verifier.clone();
        let order_handlers = self.order_handlers.clone();
        let scan_targets = self.scan_targets.clone();
        let scan_orchestrator = self.scan_orchestrator.clone();
        let evidence_signer = self.evidence_signer.clone();
        let rebuild_coordinator = self.rebuild_coordinator.clone();
        let appliance_id = self.appliance_id.clone();
        let self_host_id = self.self_host_id;
        let signing_key = self.signing_key.clone();

        tokio::spawn(async move {
            let request = CheckinRequest {
                appliance_id: appliance_id.read().clone(),
                hostname: local_hostname(),
                addresses: Vec::new(),
                uptime_seconds: 0,
                version: env!("CARGO_PKG_VERSION").to_string(),
                public_key_fingerprint: signing_key.public_key_hex(),
            };

            let response = match checkin_client.checkin(&request).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(error = %err, "checkin failed");
                    return;
                }
            };

            *appliance_id.write() = Some(response.appliance_id.clone());
            *mode_state.write() = (response.mode, response.subscription_state);

            if let Some(server_public_key) = &response.server_public_key {
                if let Err(err) = bundle_verifier.set_public_key_hex(server_public_key) {
                    tracing::warn!(error = %err, "central's public key is malformed, signature verification left unchanged");
                }
            }

            let mut map: HashMap<HostId, (Target, Credential)> = HashMap::new();
            let mut workstations = Vec::new();
            for dto in response.targets {
                if let Some((target, credential)) = appliance_sync::lift_target(dto, &identities) {
                    if target.host_id != self_host_id {
                        workstations.push(target.clone());
                    }
                    map.insert(target.host_id, (target, credential));
                }
            }
            fleet.replace(map);
            scan_targets.write().workstations = workstations;

            if rebuild_coordinator.pending_order().ok().flatten().is_some() {
                if let Err(err) = rebuild_coordinator.complete() {
                    tracing::warn!(error = %err, "failed to write rebuild-verified marker");
                }
            }

            let processor = OrderProcessor::new(bundle_verifier.as_ref(), order_handlers.as_ref());
            processor.process_all(response.pending_orders).await;

            if response.trigger_drift_scan {
                if scan_lock.try_lock().is_ok() {
                    let targets = scan_targets.read();
                    let credentials: HashMap<HostId, Credential> = fleet
                        .host_ids()
                        .into_iter()
                        .filter_map(|host_id| fleet.get(&host_id).map(|(_, credential)| (host_id, credential)))
                        .collect();
                    let cancel = CancellationToken::new();
                    let _ = scan_orchestrator.run_cycle(&targets, &credentials, evidence_signer.as_ref(), &cancel).await;
                }
            }
        });
    }

    fn spawn_scan(&self, lock: Arc<tokio::sync::Mutex<()>>) {
        let Ok(_guard) = lock.clone().try_lock_owned() else {
            tracing::debug!("scan cycle already in flight, skipping this tick");
            return;
        };
        let scan_orchestrator = self.scan_orchestrator.clone();
        let scan_targets = self.scan_targets.clone();
        let fleet = self.fleet.clone();
        let evidence_signer = self.evidence_signer.clone();
        let cancel = CancellationToken::new();

        tokio::spawn(async move {
            let targets = scan_targets.read();
            let credentials: HashMap<HostId, Credential> = fleet
                .host_ids()
                .into_iter()
                .filter_map(|host_id| fleet.get(&host_id).map(|(_, credential)| (host_id, credential)))
                .collect();
            let result = scan_orchestrator.run_cycle(&targets, &credentials, evidence_signer.as_ref(), &cancel).await;
            tracing::info!(findings = result.findings.len(), cancelled = result.cancelled, "scan cycle complete");
        });
    }

    /// Enumerates the fleet from the directory service and merges newly
    /// found hosts into the workstation set by `HostId`. Credentials for a
    /// host discovered here, but not yet pushed by a checkin, arrive on a
    /// later checkin; until then the scan orchestrator skips it for lack of
    /// one, same as any other workstation with no credential on file.
    fn spawn_discovery(&self) {
        let target_discovery = self.target_discovery.clone();
        let scan_targets = self.scan_targets.clone();
        let self_host_id = self.self_host_id;

        tokio::spawn(async move {
            let result = match target_discovery.discover().await {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!(error = %err, "directory discovery failed");
                    return;
                }
            };

            let discovered = result.ordered();
            let mut targets = scan_targets.write();
            let mut by_host_id: HashMap<HostId, Target> =
                targets.workstations.drain(..).map(|target| (target.host_id, target)).collect();
            for target in discovered {
                if target.host_id != self_host_id {
                    by_host_id.insert(target.host_id, target);
                }
            }
            targets.workstations = by_host_id.into_values().collect();
            tracing::info!(workstation_count = targets.workstations.len(), "directory discovery merged into workstation set");
        });
    }
}

fn self_host_platform() -> Platform {
    if cfg!(windows) {
        Platform::Windows
    } else {
        Platform::Linux
    }
}
