pub mod otp;
pub mod sessions;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle::orphanages::{self, NewOrphanage};
use crate::models::user::{Role, User};
use crate::state::AppState;

/// The verified caller, resolved from the bearer token and passed explicitly
/// into every operation. Nothing reads credentials from ambient state.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub phone: String,
    pub full_name: Option<String>,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "requires the {} role",
                role.as_str()
            )))
        }
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.iter().any(|role| self.has_role(*role)) {
            Ok(())
        } else {
            let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
            Err(AppError::Authorization(format!(
                "requires one of the roles: {}",
                names.join(", ")
            )))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Authentication("invalid auth scheme".to_string()))?;

        let user_id = sessions::resolve(state, token.trim())?;

        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::Authentication("user no longer exists".to_string()))?;

        Ok(CurrentUser {
            id: user.id,
            phone: user.phone.clone(),
            full_name: user.full_name.clone(),
            roles: user.roles.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrphanageSignup {
    pub name: String,
    pub address: String,
}

/// Outcome of a successful signup or login. An orphanage signup does not get a
/// token; the account stays locked until an admin approves the organization.
pub fn verify_otp(
    state: &AppState,
    phone: &str,
    code: &str,
    full_name: Option<String>,
    role: Option<Role>,
    orphanage_details: Option<OrphanageSignup>,
) -> Result<String, AppError> {
    otp::verify(state, phone, code)?;

    let user_id = match state.users_by_phone.get(phone).map(|entry| *entry) {
        Some(id) => id,
        None => {
            let full_name = full_name.ok_or_else(|| {
                AppError::Validation("full_name: required for signup".to_string())
            })?;
            let role = role.unwrap_or(Role::Donor);

            // Validate before the user record exists, so a failed orphanage
            // signup does not leave a representative with no organization.
            if role == Role::Orphanage {
                match &orphanage_details {
                    None => {
                        return Err(AppError::Validation(
                            "orphanage_details: required for orphanage signup".to_string(),
                        ));
                    }
                    Some(details)
                        if details.name.trim().is_empty()
                            || details.address.trim().is_empty() =>
                    {
                        return Err(AppError::Validation(
                            "orphanage_details: name and address are required".to_string(),
                        ));
                    }
                    Some(_) => {}
                }
            }

            let user = User {
                id: Uuid::new_v4(),
                phone: phone.to_string(),
                full_name: Some(full_name),
                roles: vec![role],
                created_at: Utc::now(),
            };
            state.users_by_phone.insert(user.phone.clone(), user.id);
            state.users.insert(user.id, user.clone());
            tracing::info!(user_id = %user.id, role = role.as_str(), "user created");

            if let Some(details) = orphanage_details.filter(|_| role == Role::Orphanage) {
                orphanages::register(
                    state,
                    Some(user.id),
                    NewOrphanage {
                        name: details.name,
                        address: details.address,
                        phone: Some(user.phone.clone()),
                        contact_person: user.full_name.clone(),
                    },
                )?;
                return Err(AppError::Authorization(
                    "account created; pending admin approval".to_string(),
                ));
            }

            user.id
        }
    };

    let holds_orphanage_role = state
        .users
        .get(&user_id)
        .map(|user| user.has_role(Role::Orphanage))
        .unwrap_or(false);

    // An orphanage representative stays locked out until their organization
    // is approved; never downgrade them to a partial session.
    if holds_orphanage_role {
        let approved = orphanages::owned_by(state, user_id)
            .map(|org| org.approved)
            .unwrap_or(false);
        if !approved {
            return Err(AppError::Authorization(
                "account pending admin approval".to_string(),
            ));
        }
    }

    Ok(sessions::issue(state, user_id))
}

/// Ensures the configured bootstrap admin exists and holds the admin role, so
/// the first admin can log in through the normal OTP flow.
pub fn seed_admin(state: &AppState, phone: &str) {
    if let Some(user_id) = state.users_by_phone.get(phone).map(|entry| *entry) {
        if let Some(mut user) = state.users.get_mut(&user_id) {
            if !user.has_role(Role::Admin) {
                user.roles.push(Role::Admin);
                tracing::info!(user_id = %user_id, "admin role granted to existing user");
            }
        }
        return;
    }

    let user = User {
        id: Uuid::new_v4(),
        phone: phone.to_string(),
        full_name: None,
        roles: vec![Role::Admin],
        created_at: Utc::now(),
    };
    state.users_by_phone.insert(user.phone.clone(), user.id);
    tracing::info!(user_id = %user.id, "bootstrap admin created");
    state.users.insert(user.id, user);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AuthSettings;

    fn signup(
        state: &AppState,
        phone: &str,
        role: Role,
        orphanage: Option<OrphanageSignup>,
    ) -> Result<String, AppError> {
        let code = otp::issue(state, phone, false).unwrap();
        verify_otp(
            state,
            phone,
            &code,
            Some("Test User".to_string()),
            Some(role),
            orphanage,
        )
    }

    #[test]
    fn donor_signup_issues_a_token() {
        let state = AppState::new(AuthSettings::default());
        let token = signup(&state, "+2000", Role::Donor, None).unwrap();

        let user_id = sessions::resolve(&state, &token).unwrap();
        let user = state.users.get(&user_id).unwrap();
        assert!(user.has_role(Role::Donor));
    }

    #[test]
    fn signup_without_name_fails_validation() {
        let state = AppState::new(AuthSettings::default());
        let code = otp::issue(&state, "+2000", false).unwrap();
        let err = verify_otp(&state, "+2000", &code, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn orphanage_signup_registers_org_and_withholds_token() {
        let state = AppState::new(AuthSettings::default());
        let err = signup(
            &state,
            "+2001",
            Role::Orphanage,
            Some(OrphanageSignup {
                name: "Sunrise Home".to_string(),
                address: "12 Hill Rd".to_string(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let user_id = *state.users_by_phone.get("+2001").unwrap();
        let org = orphanages::owned_by(&state, user_id).unwrap();
        assert!(!org.approved);
    }

    #[test]
    fn unapproved_orphanage_login_is_rejected() {
        let state = AppState::new(AuthSettings::default());
        let _ = signup(
            &state,
            "+2001",
            Role::Orphanage,
            Some(OrphanageSignup {
                name: "Sunrise Home".to_string(),
                address: "12 Hill Rd".to_string(),
            }),
        );

        let code = otp::issue(&state, "+2001", true).unwrap();
        let err = verify_otp(&state, "+2001", &code, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn approved_orphanage_login_succeeds() {
        let state = AppState::new(AuthSettings::default());
        let _ = signup(
            &state,
            "+2001",
            Role::Orphanage,
            Some(OrphanageSignup {
                name: "Sunrise Home".to_string(),
                address: "12 Hill Rd".to_string(),
            }),
        );

        let user_id = *state.users_by_phone.get("+2001").unwrap();
        let org = orphanages::owned_by(&state, user_id).unwrap();
        state.orphanages.get_mut(&org.id).unwrap().approved = true;

        let code = otp::issue(&state, "+2001", true).unwrap();
        let token = verify_otp(&state, "+2001", &code, None, None, None).unwrap();
        assert_eq!(sessions::resolve(&state, &token).unwrap(), user_id);
    }

    #[test]
    fn seed_admin_is_idempotent() {
        let state = AppState::new(AuthSettings::default());
        seed_admin(&state, "+9000");
        seed_admin(&state, "+9000");

        let user_id = *state.users_by_phone.get("+9000").unwrap();
        let user = state.users.get(&user_id).unwrap();
        assert_eq!(user.roles, vec![Role::Admin]);
    }
}
