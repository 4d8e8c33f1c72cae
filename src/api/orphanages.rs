use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::lifecycle::{donations, orphanages};
use crate::models::donation::Donation;
use crate::models::orphanage::Orphanage;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register_orphanage).get(list_orphanages))
        .route("/pending-approval", get(pending_approval))
        .route("/:id", get(get_orphanage))
        .route("/:id/pending", get(pending_donations))
        .route("/:id/approve", patch(approve_orphanage))
}

#[derive(Deserialize)]
pub struct RegisterOrphanageBody {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
}

async fn register_orphanage(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Json(body): Json<RegisterOrphanageBody>,
) -> Result<Json<Orphanage>, AppError> {
    actor.require_any(&[Role::Orphanage, Role::Admin])?;

    // An admin registers on behalf of an organization without becoming
    // its representative.
    let owner = actor.has_role(Role::Orphanage).then_some(actor.id);

    let orphanage = orphanages::register(
        &state,
        owner,
        orphanages::NewOrphanage {
            name: body.name,
            address: body.address,
            phone: body.phone,
            contact_person: body.contact_person,
        },
    )?;

    Ok(Json(orphanage))
}

async fn list_orphanages(
    State(state): State<Arc<AppState>>,
    _actor: CurrentUser,
) -> Json<Vec<Orphanage>> {
    Json(orphanages::list_approved(&state))
}

async fn pending_approval(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
) -> Result<Json<Vec<Orphanage>>, AppError> {
    Ok(Json(orphanages::pending_approval(&state, &actor)?))
}

async fn get_orphanage(
    State(state): State<Arc<AppState>>,
    _actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Orphanage>, AppError> {
    Ok(Json(orphanages::get(&state, id)?))
}

async fn pending_donations(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(donations::pending_for_orphanage(&state, &actor, id)?))
}

async fn approve_orphanage(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Orphanage>, AppError> {
    Ok(Json(orphanages::approve(&state, &actor, id)?))
}
