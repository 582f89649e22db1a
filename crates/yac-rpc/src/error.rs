use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use yac_consensus::{ConsensusError, TxQueueError};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Transaction queue error: {0}")]
    TxQueue(#[from] TxQueueError),

    #[error("Core error: {0}")]
    Core(#[from] yac_core::CoreError),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RpcError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            RpcError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RpcError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            RpcError::Consensus(e @ (ConsensusError::Ledger(_) | ConsensusError::Core(_))) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            RpcError::Consensus(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RpcError::TxQueue(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RpcError::Core(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}
