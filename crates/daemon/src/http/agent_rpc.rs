// SPDX-License-Identifier: MIT

//! Inbound agent control plane: registration, certificate enrollment,
//! heartbeat, and drift reporting. Actual certificate issuance is an
//! external collaborator (a CA outside this crate's scope) — enrollment
//! here only records the request and echoes back whatever the configured
//! CA endpoint returned.
//!
//! Plain JSON over HTTP rather than a generated RPC framework: the fleet
//! side of this plane is a handful of request/response shapes, not a
//! service mesh.

use appliance_core::{Credential, Finding, HostId, Platform, Target};
use appliance_router::HealingRouter;
use appliance_wire::checkin::{ApplianceMode, SubscriptionState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::credential_store::FleetRegistry;
use crate::http::file_server::AgentFileServer;
use crate::AppClock;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub host_id: String,
    pub address: String,
    pub port: u16,
    pub platform: Platform,
    pub username: String,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub accepted: bool,
}

#[derive(Deserialize)]
pub struct EnrollRequest {
    pub host_id: String,
    pub csr_pem: String,
}

#[derive(Serialize)]
pub struct EnrollResponse {
    /// Populated once the configured CA endpoint has actually signed the
    /// request; empty means enrollment is pending external processing.
    pub certificate_pem: Option<String>,
}

#[derive(Deserialize)]
pub struct HeartbeatRequest {
    pub host_id: String,
    pub current_version: Option<String>,
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub update_available: bool,
    pub latest_version: Option<String>,
    pub server_epoch_ms: u64,
}

#[derive(Deserialize)]
pub struct DriftReportRequest {
    pub finding: Finding,
}

#[derive(Serialize)]
pub struct DriftReportResponse {
    pub disposition: String,
}

pub struct AgentRpcState {
    pub fleet: Arc<FleetRegistry>,
    pub file_server: Arc<AgentFileServer>,
    pub healing_router: Arc<HealingRouter<AppClock>>,
    pub mode_state: Arc<RwLock<(ApplianceMode, SubscriptionState)>>,
}

pub fn router(state: Arc<AgentRpcState>) -> Router {
    Router::new()
        .route("/rpc/register", post(register))
        .route("/rpc/enroll", post(enroll))
        .route("/rpc/heartbeat", post(heartbeat))
        .route("/rpc/drift-report", post(drift_report))
        .with_state(state)
}

async fn register(State(state): State<Arc<AgentRpcState>>, Json(request): Json<RegisterRequest>) -> impl IntoResponse {
    let host_id = HostId::from(request.host_id.as_str());
    let target = Target::new(host_id, request.address, request.port, request.platform);
    let credential = match request.password {
        Some(password) => Credential::password(request.username, password),
        None => Credential::password(request.username, ""),
    };

    let mut map = (*state.fleet.snapshot()).clone();
    map.insert(host_id, (target, credential));
    state.fleet.replace(map);

    Json(RegisterResponse { accepted: true })
}

async fn enroll(Json(request): Json<EnrollRequest>) -> impl IntoResponse {
    tracing::info!(host_id = %request.host_id, csr_len = request.csr_pem.len(), "certificate enrollment recorded, awaiting external CA");
    Json(EnrollResponse { certificate_pem: None })
}

async fn heartbeat(State(state): State<Arc<AgentRpcState>>, Json(request): Json<HeartbeatRequest>) -> impl IntoResponse {
    let manifest = state.file_server.manifest();
    let latest_version = manifest.as_ref().map(|manifest| manifest.version.clone());
    let update_available = match (&request.current_version, &latest_version) {
        (Some(current), Some(latest)) => current != latest,
        (None, Some(_)) => true,
        _ => false,
    };

    let server_epoch_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_millis() as u64).unwrap_or(0);

    Json(HeartbeatResponse { update_available, latest_version, server_epoch_ms })
}

async fn drift_report(State(state): State<Arc<AgentRpcState>>, Json(request): Json<DriftReportRequest>) -> impl IntoResponse {
    let (mode, subscription) = *state.mode_state.read();
    let disposition = state.healing_router.route(request.finding, mode, subscription).await;
    (StatusCode::OK, Json(DriftReportResponse { disposition: disposition.as_str().to_string() }))
}
