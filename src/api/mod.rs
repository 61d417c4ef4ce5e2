use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod comments;
mod error;
mod forms;
mod observability;
mod posts;
mod shares;
mod tags;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let (media_path, cors_origins, body_limit) = {
        let config = state.config();
        (
            config.assets.root_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.assets.max_upload_bytes,
        )
    };

    let api_router = create_api_router().layer(DefaultBodyLimit::max(body_limit));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .nest_service("/media", ServeDir::new(media_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/refresh", post(auth::refresh))
        .route(
            "/users/me",
            get(users::me).patch(users::update_me).delete(users::delete_me),
        )
        .route("/users/me/avatar", put(users::update_avatar))
        .route("/users/me/password", put(users::change_password))
        .route("/users/search", get(users::search))
        .route("/users/{username}/posts", get(users::posts_of))
        .route(
            "/users/{username}/follow",
            post(users::follow).delete(users::unfollow),
        )
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/{id}/like", post(posts::toggle_like))
        .route("/posts/{id}/share", post(posts::share))
        .route(
            "/posts/{id}/tags",
            post(posts::attach_tag).put(posts::replace_tags),
        )
        .route("/posts/{id}/comments", post(posts::add_comment))
        .route(
            "/comments/{id}",
            axum::routing::patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/shares/me", get(shares::my_shares))
        .route("/shares/{id}", axum::routing::delete(shares::unshare))
        .route("/tags", post(tags::create_tag))
        .route("/tags/posts", get(tags::posts_by_tag))
}
