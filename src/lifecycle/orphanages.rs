use chrono::Utc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::orphanage::Orphanage;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct NewOrphanage {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
}

/// Registers an organization awaiting admin approval. Until approved it is
/// invisible donor-side and not a valid donation target.
pub fn register(
    state: &AppState,
    owner: Option<Uuid>,
    input: NewOrphanage,
) -> Result<Orphanage, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name: cannot be empty".to_string()));
    }
    if input.address.trim().is_empty() {
        return Err(AppError::Validation("address: cannot be empty".to_string()));
    }

    let orphanage = Orphanage {
        id: Uuid::new_v4(),
        user_id: owner,
        name: input.name,
        address: input.address,
        phone: input.phone,
        contact_person: input.contact_person,
        approved: false,
        created_at: Utc::now(),
    };

    state.orphanages.insert(orphanage.id, orphanage.clone());
    state.metrics.orphanages_awaiting_approval.inc();
    tracing::info!(orphanage_id = %orphanage.id, name = %orphanage.name, "orphanage registered");

    Ok(orphanage)
}

/// Admin-only, one-directional, idempotent when already approved.
pub fn approve(
    state: &AppState,
    actor: &CurrentUser,
    orphanage_id: Uuid,
) -> Result<Orphanage, AppError> {
    actor.require(Role::Admin)?;

    let mut orphanage = state
        .orphanages
        .get_mut(&orphanage_id)
        .ok_or_else(|| AppError::NotFound(format!("orphanage {orphanage_id} not found")))?;

    if !orphanage.approved {
        orphanage.approved = true;
        state.metrics.orphanages_awaiting_approval.dec();
        tracing::info!(orphanage_id = %orphanage_id, admin = %actor.id, "orphanage approved");
    }

    Ok(orphanage.clone())
}

/// Donor-facing list: approved organizations only, newest first.
pub fn list_approved(state: &AppState) -> Vec<Orphanage> {
    let mut orphanages: Vec<Orphanage> = state
        .orphanages
        .iter()
        .filter(|entry| entry.value().approved)
        .map(|entry| entry.value().clone())
        .collect();

    orphanages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orphanages
}

pub fn pending_approval(state: &AppState, actor: &CurrentUser) -> Result<Vec<Orphanage>, AppError> {
    actor.require(Role::Admin)?;

    let mut orphanages: Vec<Orphanage> = state
        .orphanages
        .iter()
        .filter(|entry| !entry.value().approved)
        .map(|entry| entry.value().clone())
        .collect();

    orphanages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orphanages)
}

pub fn get(state: &AppState, orphanage_id: Uuid) -> Result<Orphanage, AppError> {
    state
        .orphanages
        .get(&orphanage_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("orphanage {orphanage_id} not found")))
}

pub fn owned_by(state: &AppState, user_id: Uuid) -> Option<Orphanage> {
    state
        .orphanages
        .iter()
        .find(|entry| entry.value().user_id == Some(user_id))
        .map(|entry| entry.value().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AuthSettings;

    fn admin() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            phone: "+9000".to_string(),
            full_name: None,
            roles: vec![Role::Admin],
        }
    }

    fn volunteer() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            phone: "+9001".to_string(),
            full_name: None,
            roles: vec![Role::Volunteer],
        }
    }

    fn new_org(name: &str) -> NewOrphanage {
        NewOrphanage {
            name: name.to_string(),
            address: "1 Main St".to_string(),
            phone: None,
            contact_person: None,
        }
    }

    #[test]
    fn register_requires_name_and_address() {
        let state = AppState::new(AuthSettings::default());
        let err = register(
            &state,
            None,
            NewOrphanage {
                name: "  ".to_string(),
                address: "1 Main St".to_string(),
                phone: None,
                contact_person: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn approve_is_idempotent() {
        let state = AppState::new(AuthSettings::default());
        let org = register(&state, None, new_org("Sunrise Home")).unwrap();
        let admin = admin();

        let first = approve(&state, &admin, org.id).unwrap();
        assert!(first.approved);

        let second = approve(&state, &admin, org.id).unwrap();
        assert!(second.approved);
        assert_eq!(state.metrics.orphanages_awaiting_approval.get(), 0);
    }

    #[test]
    fn approve_requires_admin_role() {
        let state = AppState::new(AuthSettings::default());
        let org = register(&state, None, new_org("Sunrise Home")).unwrap();

        let err = approve(&state, &volunteer(), org.id).unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn approve_unknown_org_is_not_found() {
        let state = AppState::new(AuthSettings::default());
        let err = approve(&state, &admin(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn unapproved_orgs_are_invisible_donor_side() {
        let state = AppState::new(AuthSettings::default());
        let hidden = register(&state, None, new_org("Hidden Home")).unwrap();
        let visible = register(&state, None, new_org("Visible Home")).unwrap();
        approve(&state, &admin(), visible.id).unwrap();

        let listed = list_approved(&state);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, visible.id);
        assert!(!listed.iter().any(|org| org.id == hidden.id));
    }
}
