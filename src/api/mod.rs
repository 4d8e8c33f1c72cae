pub mod auth;
pub mod donations;
pub mod orphanages;
pub mod users;
pub mod volunteers;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/donations", donations::router())
        // axum's `nest` does not match the bare prefix with a trailing
        // slash, but `POST /donations/` is the canonical path in the
        // original API (FastAPI serves `@router.post("/")` there).
        .route("/donations/", axum::routing::post(donations::create_donation))
        .nest("/orphanages", orphanages::router())
        .nest("/volunteers", volunteers::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    users: usize,
    orphanages: usize,
    donations: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        users: state.users.len(),
        orphanages: state.orphanages.len(),
        donations: state.donations.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
