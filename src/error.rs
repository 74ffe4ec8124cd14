//! Error types for the key-value server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

// == KV Error Enum ==
/// Unified error type for request handling.
///
/// Every failed request maps to exactly one of these; cache operations
/// cannot fail and contribute no variants.
#[derive(Error, Debug)]
pub enum KvError {
    /// Key absent in both the cache and the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The request could not be decoded into a valid operation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing store rejected a write; the cache was left untouched
    #[error("Store write failed for key '{key}'")]
    StoreWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The backing store rejected a delete; the cache was left untouched
    #[error("Store delete failed for key '{key}'")]
    StoreDelete {
        key: String,
        #[source]
        source: StoreError,
    },
}

// == IntoResponse Implementation ==
impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let status = match &self {
            KvError::NotFound(_) => StatusCode::NOT_FOUND,
            KvError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvError::StoreWrite { .. } | KvError::StoreDelete { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the key-value server.
pub type Result<T> = std::result::Result<T, KvError>;
