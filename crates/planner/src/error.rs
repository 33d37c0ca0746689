// SPDX-License-Identifier: MIT

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("daily spend budget exhausted")]
    DailyBudgetExhausted,
    #[error("per-hour call cap reached")]
    HourlyCapReached,
    #[error("too many in-flight planner calls")]
    ConcurrencyCapReached,
    #[error("planner transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("planner rejected the request with status {0}")]
    ServerRejection(reqwest::StatusCode),
}
