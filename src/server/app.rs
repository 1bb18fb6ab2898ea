use axum::{middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::api_routes;
use crate::audit::audit_recorder;

use super::middleware::identity;
use super::AppState;

pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.settings.server.body_limit_bytes;

    // Layer order (outermost first at request time): cors, trace, body
    // limit, identity, audit recorder, routes. Identity runs before the
    // recorder so the actor id is present when the entry is captured.
    Router::new()
        .merge(api_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), audit_recorder))
        .layer(middleware::from_fn(identity))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
