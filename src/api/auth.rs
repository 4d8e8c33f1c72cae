use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde::{Deserialize, Serialize};

use crate::auth::{self, OrphanageSignup, otp};
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
}

#[derive(Deserialize)]
pub struct RequestOtpBody {
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_login: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
struct RequestOtpResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_otp: Option<String>,
}

async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RequestOtpBody>,
) -> Result<Json<RequestOtpResponse>, AppError> {
    let phone = body.phone.trim();
    if phone.is_empty() {
        return Err(AppError::Validation("phone: cannot be empty".to_string()));
    }

    let code = otp::issue(&state, phone, body.is_login)?;

    Ok(Json(RequestOtpResponse {
        status: "ok",
        debug_otp: state.auth.debug_return_otp.then_some(code),
    }))
}

#[derive(Deserialize)]
pub struct VerifyOtpBody {
    pub phone: String,
    pub otp: String,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub orphanage_details: Option<OrphanageSignup>,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = auth::verify_otp(
        &state,
        body.phone.trim(),
        &body.otp,
        body.full_name,
        body.role,
        body.orphanage_details,
    )?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
    }))
}
