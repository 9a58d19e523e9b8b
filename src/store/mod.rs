//! Persistence of orders and payments.
//!
//! Each store is a capability trait listing exactly the operations the workflows
//! need, plus an implementation backed by a
//! [`ResourceActor`](crate::actor_framework::ResourceActor) that owns the rows.
//! Update and delete on a missing id report [`StoreError::NotFound`], the
//! equivalent of zero rows affected.

pub mod order_store;
pub mod payment_store;

pub use order_store::*;
pub use payment_store::*;

use thiserror::Error;

use crate::actor_framework::FrameworkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("row encoding error: {0}")]
    Encoding(String),
}

impl StoreError {
    pub(crate) fn from_framework(kind: &str, err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => {
                StoreError::NotFound(format!("{} {} not found", kind, id))
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Empty ids ask the store to generate one.
pub(crate) fn requested(id: &str) -> Option<String> {
    (!id.is_empty()).then(|| id.to_string())
}
