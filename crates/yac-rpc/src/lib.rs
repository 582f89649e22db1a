//! Yac RPC - HTTP API
//!
//! Peers exchange proposals, votes and commit certificates over these
//! routes; clients use them to submit transactions and follow the chain.

pub mod error;
pub mod http;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::info;
use yac_ledger::Storage;

use http::{create_router, AppState};

pub use error::RpcError;
pub use http::handlers::{BlockResponse, StatusResponse, TxSubmitRequest, TxSubmitResponse};

/// RPC server configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// HTTP bind address
    pub http_addr: SocketAddr,
}

impl Default for RpcConfig {
    fn default() -> Self {
        RpcConfig {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// RPC server
pub struct RpcServer<S: Storage> {
    config: RpcConfig,
    app_state: Arc<AppState<S>>,
}

impl<S: Storage + 'static> RpcServer<S> {
    pub fn new(config: RpcConfig, app_state: AppState<S>) -> Self {
        RpcServer {
            config,
            app_state: Arc::new(app_state),
        }
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.app_state))
    }

    /// Run the RPC server
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.router();
        let addr = self.config.http_addr;

        info!("Starting RPC server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    }
}
