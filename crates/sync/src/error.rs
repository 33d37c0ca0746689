// SPDX-License-Identifier: MIT

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("checkin transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("central rejected the request with status {0}")]
    ServerRejection(reqwest::StatusCode),
    #[error("unknown order type")]
    UnknownOrderType,
    #[error("order signature rejected: {0}")]
    SignatureRejected(#[from] appliance_rules::VerifyError),
    #[error("order payload is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("state persistence error: {0}")]
    Storage(#[from] appliance_storage::MarkerError),
}
