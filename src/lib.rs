use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod mxp_client;

use mxp_client::UpstreamProvider;

#[derive(Clone)]
pub struct AppState {
    pub api_token: Option<Arc<str>>,
    pub upstream: Arc<dyn UpstreamProvider>,
}

impl AppState {
    pub fn new(api_token: Option<String>, upstream: Arc<dyn UpstreamProvider>) -> Self {
        Self {
            api_token: api_token.map(Arc::<str>::from),
            upstream,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route("/account/{charge_id}", get(api::account))
        .route("/crew", get(api::crew))
        .route("/folio/{folio_id}", get(api::folio))
        .route("/document/{document_id}", get(api::document))
        .route("/icafe", get(api::icafe))
        .route("/person-image/{person_id}", get(api::person_image))
        .route("/quick-code", get(api::quick_code))
        .route("/sailor-manifest", get(api::sailor_manifest))
        .route("/receipt-image/{receipt_id}", get(api::receipt_image))
        .route("/person-invoice/{person_id}", get(api::person_invoice))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/", get(http::handlers::root))
        .route("/healthz", get(http::handlers::healthz))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
