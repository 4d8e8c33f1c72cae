use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Opaque bearer session. The token never encodes anything; it is only a key
/// into the session table.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub fn issue(state: &AppState, user_id: Uuid) -> String {
    let token = Uuid::new_v4().to_string();
    let session = Session {
        user_id,
        expires_at: Utc::now() + Duration::seconds(state.auth.session_ttl_seconds),
    };
    state.sessions.insert(token.clone(), session);
    token
}

pub fn resolve(state: &AppState, token: &str) -> Result<Uuid, AppError> {
    let session = state
        .sessions
        .get(token)
        .ok_or_else(|| AppError::Authentication("invalid or expired token".to_string()))?;

    if session.expires_at < Utc::now() {
        let user_id = session.user_id;
        drop(session);
        state.sessions.remove(token);
        tracing::debug!(user_id = %user_id, "session expired");
        return Err(AppError::Authentication("invalid or expired token".to_string()));
    }

    Ok(session.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, AuthSettings};

    #[test]
    fn issued_token_resolves_to_user() {
        let state = AppState::new(AuthSettings::default());
        let user_id = Uuid::new_v4();

        let token = issue(&state, user_id);
        assert_eq!(resolve(&state, &token).unwrap(), user_id);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let state = AppState::new(AuthSettings::default());
        let err = resolve(&state, "not-a-token").unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn expired_session_is_evicted() {
        let state = AppState::new(AuthSettings::default());
        let user_id = Uuid::new_v4();
        let token = issue(&state, user_id);

        state.sessions.get_mut(&token).unwrap().expires_at = Utc::now() - Duration::seconds(1);

        let err = resolve(&state, &token).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert!(!state.sessions.contains_key(&token));
    }
}
