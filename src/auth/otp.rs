use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct OtpEntry {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

fn generate_code(length: u32) -> String {
    let length = length.clamp(4, 10);
    let start = 10u64.pow(length - 1);
    let end = 10u64.pow(length);

    rand::rng().random_range(start..end).to_string()
}

/// Issues a fresh code for the phone, replacing any outstanding one. Login
/// requires a registered phone; signup requires an unregistered one.
pub fn issue(state: &AppState, phone: &str, is_login: bool) -> Result<String, AppError> {
    let registered = state.users_by_phone.contains_key(phone);

    if is_login && !registered {
        return Err(AppError::Validation(
            "phone: not registered, please sign up".to_string(),
        ));
    }
    if !is_login && registered {
        return Err(AppError::Validation(
            "phone: already registered, please log in".to_string(),
        ));
    }

    let code = generate_code(state.auth.otp_length);
    let entry = OtpEntry {
        code: code.clone(),
        expires_at: Utc::now() + Duration::seconds(state.auth.otp_ttl_seconds),
        used: false,
    };
    state.otps.insert(phone.to_string(), entry);

    let flow = if is_login { "login" } else { "signup" };
    state.metrics.otp_requests_total.with_label_values(&[flow]).inc();
    tracing::info!(phone = %phone, flow = flow, code = %code, "otp issued");

    Ok(code)
}

/// Checks and consumes the outstanding code for the phone.
pub fn verify(state: &AppState, phone: &str, code: &str) -> Result<(), AppError> {
    let mut entry = state
        .otps
        .get_mut(phone)
        .ok_or_else(|| AppError::Authentication("no code requested for this phone".to_string()))?;

    if entry.used {
        return Err(AppError::Authentication("code already used".to_string()));
    }
    if entry.expires_at < Utc::now() {
        return Err(AppError::Authentication("code expired".to_string()));
    }
    if entry.code != code {
        return Err(AppError::Authentication("invalid code".to_string()));
    }

    entry.used = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::models::user::{Role, User};
    use crate::state::{AppState, AuthSettings};

    fn state_with_user(phone: &str) -> AppState {
        let state = AppState::new(AuthSettings::default());
        let user = User {
            id: Uuid::new_v4(),
            phone: phone.to_string(),
            full_name: Some("Test User".to_string()),
            roles: vec![Role::Donor],
            created_at: Utc::now(),
        };
        state.users_by_phone.insert(phone.to_string(), user.id);
        state.users.insert(user.id, user);
        state
    }

    #[test]
    fn login_requires_registered_phone() {
        let state = AppState::new(AuthSettings::default());
        let err = issue(&state, "+1000", true).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn signup_rejects_registered_phone() {
        let state = state_with_user("+1000");
        let err = issue(&state, "+1000", false).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn verify_consumes_the_code() {
        let state = state_with_user("+1000");
        let code = issue(&state, "+1000", true).unwrap();

        verify(&state, "+1000", &code).unwrap();

        let err = verify(&state, "+1000", &code).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn verify_rejects_wrong_code() {
        let state = state_with_user("+1000");
        let code = issue(&state, "+1000", true).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let err = verify(&state, "+1000", wrong).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn verify_rejects_expired_code() {
        let state = state_with_user("+1000");
        let code = issue(&state, "+1000", true).unwrap();

        state.otps.get_mut("+1000").unwrap().expires_at = Utc::now() - Duration::seconds(1);

        let err = verify(&state, "+1000", &code).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn generated_code_has_configured_length() {
        let state = state_with_user("+1000");
        let code = issue(&state, "+1000", true).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
