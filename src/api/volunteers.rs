use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::lifecycle::donations;
use crate::models::donation::Donation;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/available", get(available))
        .route("/claim/:id", post(claim))
        .route("/deliver/:id", post(deliver))
        .route("/my-deliveries", get(my_deliveries))
}

async fn available(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(donations::available_for_pickup(&state, &actor)?))
}

async fn claim(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Donation>, AppError> {
    Ok(Json(donations::claim(&state, &actor, id)?))
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Donation>, AppError> {
    Ok(Json(donations::mark_delivered(&state, &actor, id)?))
}

async fn my_deliveries(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(donations::deliveries_for(&state, &actor)?))
}
