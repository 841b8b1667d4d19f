use thiserror::Error;

use crate::adapter::AdapterError;
use crate::adapter::r#trait::{STATUS_NOT_FOUND, StatusCode};

/// Entity lifecycle error.
///
/// `NotFound` and `LoadFailure` are the structured `{message, status}` errors
/// raised by `Document::load`. Adapter failures pass through untouched.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{message}")]
    NotFound { message: String, status: StatusCode },

    #[error("{message}")]
    LoadFailure { message: String, status: StatusCode },

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("failed to deserialize record: {0}")]
    Deserialize(String),

    #[error("invalid adapter response: {0}")]
    InvalidResponse(String),
}

impl DocumentError {
    pub(crate) fn not_found(partition: &str, id: &str) -> Self {
        Self::NotFound {
            message: format!("document not found (partition: {partition}, id: {id})"),
            status: STATUS_NOT_FOUND,
        }
    }

    pub(crate) fn load_failure(partition: &str, id: &str, status: StatusCode) -> Self {
        Self::LoadFailure {
            message: format!(
                "failed to load document (partition: {partition}, id: {id}, status: {status})"
            ),
            status,
        }
    }

    /// Structured status of a load error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { status, .. } | Self::LoadFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
