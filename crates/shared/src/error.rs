use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ViewKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Malformed,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Reasons an inbound view change is refused.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("{view} payload must be an object, got {found}")]
    PayloadNotObject { view: ViewKind, found: &'static str },
    #[error("{view} payload does not match: {source}")]
    PayloadMismatch {
        view: ViewKind,
        source: serde_json::Error,
    },
}

impl From<ViewError> for ApiError {
    fn from(value: ViewError) -> Self {
        Self::new(ErrorCode::Validation, value.to_string())
    }
}
