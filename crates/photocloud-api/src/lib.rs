pub mod auth;
pub mod error;
pub mod middleware;
pub mod photos;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use photocloud_db::Database;
use photocloud_media::MediaStore;

use crate::error::ApiError;
use crate::middleware::require_auth;

/// Cloudinary's own ceiling for a single image on the free plan.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub media: Arc<dyn MediaStore>,
    pub max_upload_bytes: usize,
}

/// All HTTP routes. Transport-level layers (CORS, tracing, static files)
/// are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/photos/public", get(photos::list_public));

    let protected_routes = Router::new()
        .route("/api/photos", get(photos::list_mine))
        .route(
            "/api/photos/upload",
            post(photos::upload).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/api/photos/{id}", delete(photos::delete_photo))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn root() -> &'static str {
    "API is running..."
}

/// Run a blocking database call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::Internal)
}
