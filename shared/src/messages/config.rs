//! Configuration request/response exchange with individual workers
//!
//! A configuration request is a free-form query answered synchronously by a
//! single worker. The transaction id correlates the reply with its request.

use serde::{Deserialize, Serialize};

use crate::types::WorkerKind;

/// Error code attached to configuration responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[default]
    NoError,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationRequest {
    pub node_id: WorkerKind,
    pub transaction_id: u32,
    pub configuration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationResponse {
    pub node_id: WorkerKind,
    pub transaction_id: u32,
    pub configuration: String,
    pub success: bool,
    pub err_code: ErrorCode,
}

impl ConfigurationResponse {
    /// Successful reply to `request` carrying `configuration`
    pub fn success(request: &ConfigurationRequest, configuration: impl Into<String>) -> Self {
        Self {
            node_id: request.node_id,
            transaction_id: request.transaction_id,
            configuration: configuration.into(),
            success: true,
            err_code: ErrorCode::NoError,
        }
    }

    pub fn failure(request: &ConfigurationRequest, err_code: ErrorCode) -> Self {
        Self {
            node_id: request.node_id,
            transaction_id: request.transaction_id,
            configuration: String::new(),
            success: false,
            err_code,
        }
    }
}
