pub mod bundle;
pub mod cleanup;
pub mod files;
pub mod health;
pub mod space;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::BasicAuthLayer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Headroom over the single-file limit for multipart framing.
    let max_body = (state.config.max_file_size_bytes() + 1024 * 1024) as usize;

    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health::health));

    // Authenticated API routes
    let api_routes = Router::new()
        .route("/status", get(health::status))
        // Files
        .route("/files", post(files::upload_files))
        .route("/files", get(files::list_files))
        .route("/files/{file_name}", get(files::download_file))
        .route("/files/{file_name}", delete(files::delete_file))
        .route("/files/{file_name}/checksum", get(files::file_checksum))
        .route("/files-rename", post(files::rename_file))
        .route("/files-copy", post(files::copy_file))
        .route("/bundle", post(bundle::download_bundle))
        // Quota
        .route("/space", get(space::available_space))
        // Cleanup jobs
        .route("/cleanup", post(cleanup::trigger_cleanup))
        .route("/cleanup/expired", post(cleanup::trigger_expiry_cleanup))
        .layer(BasicAuthLayer::new(state.users.clone()));

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID
    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
