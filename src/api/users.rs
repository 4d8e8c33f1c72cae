use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me))
        .route("/all", get(list_users))
        .route("/assign-role", post(assign_role))
}

#[derive(Serialize)]
struct UserResponse {
    id: Uuid,
    phone: String,
    full_name: Option<String>,
    roles: Vec<Role>,
}

async fn me(actor: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: actor.id,
        phone: actor.phone,
        full_name: actor.full_name,
        roles: actor.roles,
    })
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    actor.require(Role::Admin)?;

    let users = state
        .users
        .iter()
        .map(|entry| {
            let user = entry.value();
            UserResponse {
                id: user.id,
                phone: user.phone.clone(),
                full_name: user.full_name.clone(),
                roles: user.roles.clone(),
            }
        })
        .collect();

    Ok(Json(users))
}

#[derive(Deserialize)]
pub struct AssignRoleBody {
    pub user_id: Uuid,
    pub role: Role,
}

async fn assign_role(
    State(state): State<Arc<AppState>>,
    actor: CurrentUser,
    Json(body): Json<AssignRoleBody>,
) -> Result<Json<UserResponse>, AppError> {
    actor.require(Role::Admin)?;

    let mut user = state
        .users
        .get_mut(&body.user_id)
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", body.user_id)))?;

    if !user.has_role(body.role) {
        user.roles.push(body.role);
        tracing::info!(user_id = %user.id, role = body.role.as_str(), "role assigned");
    }

    Ok(Json(UserResponse {
        id: user.id,
        phone: user.phone.clone(),
        full_name: user.full_name.clone(),
        roles: user.roles.clone(),
    }))
}
