//! Axum router construction for the dispatch server.

use std::sync::Arc;

use agora_types::AgentId;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::ws;

/// Build the dispatch router.
///
/// - `GET /ws` -- endpoint `WebSocket`
/// - `GET /endpoints` -- agents with a connected endpoint
pub fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_endpoint))
        .route("/endpoints", get(list_endpoints))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// List agents whose endpoint is connected.
async fn list_endpoints(State(dispatcher): State<Arc<Dispatcher>>) -> Json<Vec<AgentId>> {
    Json(dispatcher.connected().await)
}
