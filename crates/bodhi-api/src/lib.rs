//! bodhi-api - HTTP API server for the Bodhi interactor
//!
//! Thin read/write proxy in front of the Bodhi asset tables, plus a wallet
//! holder check against the Bodhi share contract. The binary in `main.rs`
//! wires configuration, logging, and the backend; everything routable lives
//! here so integration tests can serve the same router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query_types;
pub mod services;
pub mod state;
pub mod telemetry;

use std::time::Duration;

use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

pub use config::{AllowedOrigins, BackendKind, ConfigError, LogConfig, LogFormat, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

use handlers::{assets, auth, catalog, images};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Every route, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::root))
        .route("/spaces", get(catalog::list_spaces))
        .route("/collections", get(catalog::list_collections))
        .route("/constant", get(catalog::get_constant))
        .route("/assets", get(assets::assets_by_range))
        .route("/assets_by_space", get(assets::assets_by_space))
        .route("/assets_by_space_v2", get(assets::assets_by_space_v2))
        .route("/assets_by_table_name", get(assets::assets_by_table_name))
        .route("/text_search", get(assets::text_search))
        .route("/assets_index_latest", get(assets::assets_index_latest))
        .route("/imgs", get(images::list_images))
        .route("/imgs_page", get(images::list_images_page))
        .route("/imgs_latest_id", get(images::latest_image_id))
        .route("/set_img", get(images::set_image_category))
        .route("/batch_to_img", get(images::batch_to_img))
        .route("/bodhi_auth", get(auth::bodhi_auth))
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        // hosted-backend clients send apikey, x-client-info, and the like
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(3600));
    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => layer.allow_origin(AllowOrigin::list(list.clone())),
    }
}

/// The full application: routes, request tracing, request ids, and CORS.
pub fn build_router(state: AppState, origins: &AllowedOrigins) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(origins))
        .with_state(state)
}
