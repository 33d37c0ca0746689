// SPDX-License-Identifier: MIT

//! `POST /api/orders/{id}/complete` request body.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CompletionPayload {
    pub fn success(result: serde_json::Value) -> Self {
        Self { success: true, result: Some(result), error_message: None }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self { success: false, result: None, error_message: Some(error_message.into()) }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
