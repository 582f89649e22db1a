use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use yac_ledger::Storage;

use super::handlers::{
    get_answer, get_block, get_status, submit_commit, submit_proposal, submit_reject, submit_tx,
    submit_votes, AppState,
};

/// Create the HTTP router
pub fn create_router<S: Storage + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(get_status::<S>))
        .route("/tx", post(submit_tx::<S>))
        .route("/block/{height}", get(get_block::<S>))
        .route("/yac/vote", post(submit_votes::<S>))
        .route("/yac/commit", post(submit_commit::<S>))
        .route("/yac/reject", post(submit_reject::<S>))
        .route("/yac/propose", post(submit_proposal::<S>))
        .route("/yac/answer/{proposal_hash}", get(get_answer::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
