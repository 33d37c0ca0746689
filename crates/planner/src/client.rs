// SPDX-License-Identifier: MIT

use crate::budget::BudgetGate;
use crate::decision::PlannerDecision;
use crate::error::PlannerError;
use appliance_core::{Clock, Incident};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Anything that can turn an incident into a planner decision. Exists so
/// the healing router can be tested against a stub without ever touching
/// the network.
#[async_trait]
pub trait PlannerClient: Send + Sync {
    async fn plan(&self, incident: &Incident) -> Result<PlannerDecision, PlannerError>;
}

#[derive(Serialize)]
struct IncidentPlanRequest<'a> {
    incident_id: String,
    host_id: String,
    check_id: &'a str,
    platform: appliance_core::Platform,
    severity: appliance_core::Severity,
    finding: &'a appliance_core::Finding,
    flap_count: u32,
}

impl<'a> IncidentPlanRequest<'a> {
    fn from_incident(incident: &'a Incident) -> Self {
        Self {
            incident_id: incident.id.to_string(),
            host_id: incident.host_id.to_string(),
            check_id: incident.check_id.as_str(),
            platform: incident.platform,
            severity: incident.severity,
            finding: &incident.finding,
            flap_count: incident.flap_count,
        }
    }
}

/// `PlannerClient` over HTTP, budget-gated and retried at most once on a
/// transport-level failure. A non-2xx response is never retried — the
/// planner has an opinion and repeating the call won't change it.
pub struct HttpPlannerClient<C: Clock> {
    http: reqwest::Client,
    endpoint: String,
    budget: BudgetGate<C>,
    call_cost_usd: f64,
}

impl<C: Clock> HttpPlannerClient<C> {
    pub fn new(endpoint: impl Into<String>, budget: BudgetGate<C>, call_cost_usd: f64) -> Self {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_else(|_| reqwest::Client::new());
        Self { http, endpoint: endpoint.into(), budget, call_cost_usd }
    }

    async fn post_once(&self, request: &IncidentPlanRequest<'_>) -> Result<PlannerDecision, PlannerError> {
        let response = self.http.post(&self.endpoint).json(request).send().await?;
        if !response.status().is_success() {
            return Err(PlannerError::ServerRejection(response.status()));
        }
        Ok(response.json::<PlannerDecision>().await?)
    }
}

#[async_trait]
impl<C: Clock> PlannerClient for HttpPlannerClient<C> {
    async fn plan(&self, incident: &Incident) -> Result<PlannerDecision, PlannerError> {
        let permit = self.budget.acquire()?;
        let request = IncidentPlanRequest::from_incident(incident);

        let result = match self.post_once(&request).await {
            Err(PlannerError::Transport(_)) => self.post_once(&request).await,
            other => other,
        };

        if result.is_ok() {
            permit.record_spend(self.call_cost_usd);
        }
        result
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
