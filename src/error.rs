use reqwest::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy shared by the order and payment workflows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// Bad or missing input. Never retried.
    #[error("{0}")]
    Caller(String),
    #[error("{0}")]
    NotFound(String),
    /// The user directory or payment gateway failed.
    #[error("dependency failure: {0}")]
    Dependency(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Caller(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Dependency(_) | ServiceError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Status a boundary should answer with for a workflow result.
pub fn status_for<T>(result: &Result<T, ServiceError>, creates: bool) -> StatusCode {
    match result {
        Ok(_) if creates => StatusCode::CREATED,
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Persistence(other.to_string()),
        }
    }
}
