use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::lifecycle::donations::{self, Decision, NewDonation};
use crate::models::donation::Donation;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_donation))
        .route("/me", get(my_donations))
        .route("/pending", get(all_pending))
        .route("/:id/decision", patch(decide))
}

pub(crate) async fn create_donation(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Json(body): Json<NewDonation>,
) -> Result<Json<Donation>, AppError> {
    let donation = donations::create(&state, &actor, body)?;
    Ok(Json(donation))
}

async fn my_donations(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(donations::for_donor(&state, &actor)?))
}

async fn all_pending(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(donations::pending_all(&state, &actor)?))
}

async fn decide(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<Decision>,
) -> Result<Json<Donation>, AppError> {
    let donation = donations::decide(&state, &actor, id, body)?;
    Ok(Json(donation))
}
