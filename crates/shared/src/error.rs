use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Validation,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorCode::Unauthorized,
            404 => ErrorCode::NotFound,
            400 | 422 => ErrorCode::Validation,
            502..=504 => ErrorCode::Unavailable,
            _ => ErrorCode::Internal,
        }
    }
}

/// A list service call that the host rejected.
#[derive(Debug, Error)]
#[error("{service} rejected ({code:?}): {message}")]
pub struct GatewayException {
    pub service: String,
    pub code: ErrorCode,
    pub message: String,
}

impl GatewayException {
    pub fn new(service: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HostStateError {
    #[error("entity {entity_id} has a malformed `lists` attribute: {source}")]
    MalformedLists {
        entity_id: String,
        source: serde_json::Error,
    },
    #[error("malformed entity state payload: {0}")]
    MalformedEntity(#[from] serde_json::Error),
}
