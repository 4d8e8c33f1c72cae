use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::donation::{
    DeliveryMethod, Donation, DonationDetails, DonationStatus, DonationType,
};
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewDonation {
    pub donation_type: DonationType,
    pub details: Option<Value>,
    pub delivery_method: DeliveryMethod,
    pub orphanage_id: Option<Uuid>,
    pub pickup_address: Option<String>,
    pub pickup_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Decision {
    pub approve: bool,
    pub note: Option<String>,
}

/// Creates a `pending` donation. A targeted orphanage must exist and be
/// approved; an unapproved one is treated as absent donor-side.
pub fn create(
    state: &AppState,
    actor: &CurrentUser,
    input: NewDonation,
) -> Result<Donation, AppError> {
    actor.require(Role::Donor)?;

    let details = DonationDetails::parse(input.donation_type, input.details)?;

    if let Some(orphanage_id) = input.orphanage_id {
        let approved = state
            .orphanages
            .get(&orphanage_id)
            .map(|entry| entry.value().approved)
            .unwrap_or(false);
        if !approved {
            return Err(AppError::NotFound(format!(
                "orphanage {orphanage_id} not found"
            )));
        }
    }

    let now = Utc::now();
    let donation = Donation {
        id: Uuid::new_v4(),
        donor_id: actor.id,
        orphanage_id: input.orphanage_id,
        details,
        delivery_method: input.delivery_method,
        pickup_address: input.pickup_address,
        pickup_date: input.pickup_date,
        assigned_volunteer_id: None,
        status: DonationStatus::Pending,
        decision_note: None,
        created_at: now,
        updated_at: now,
    };

    state.donations.insert(donation.id, donation.clone());
    state
        .metrics
        .donations_created_total
        .with_label_values(&[input.donation_type.as_str()])
        .inc();
    tracing::info!(
        donation_id = %donation.id,
        donor_id = %actor.id,
        donation_type = input.donation_type.as_str(),
        "donation created"
    );

    Ok(donation)
}

/// Approves or rejects a `pending` donation. Admins may decide on anything;
/// an orphanage holder only on donations untargeted or targeted at the
/// organization they own. The ownership check is the same for approve and
/// reject.
pub fn decide(
    state: &AppState,
    actor: &CurrentUser,
    donation_id: Uuid,
    decision: Decision,
) -> Result<Donation, AppError> {
    actor.require_any(&[Role::Orphanage, Role::Admin])?;

    let mut donation = state
        .donations
        .get_mut(&donation_id)
        .ok_or_else(|| AppError::NotFound(format!("donation {donation_id} not found")))?;

    if !actor.has_role(Role::Admin) {
        if let Some(orphanage_id) = donation.orphanage_id {
            let owns = state
                .orphanages
                .get(&orphanage_id)
                .map(|entry| entry.value().user_id == Some(actor.id))
                .unwrap_or(false);
            if !owns {
                return Err(AppError::Authorization(
                    "only the targeted orphanage may decide on this donation".to_string(),
                ));
            }
        }
    }

    let next = if decision.approve {
        DonationStatus::Approved
    } else {
        DonationStatus::Rejected
    };

    if !donation.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "donation is {}, only pending donations can be decided",
            donation.status.as_str()
        )));
    }

    donation.status = next;
    donation.decision_note = decision.note;
    donation.updated_at = Utc::now();

    state
        .metrics
        .donation_transitions_total
        .with_label_values(&[next.as_str()])
        .inc();
    tracing::info!(
        donation_id = %donation_id,
        decided_by = %actor.id,
        status = next.as_str(),
        "donation decided"
    );

    Ok(donation.clone())
}

/// Claims an approved pickup donation for delivery. First claim wins: the
/// check and the write happen while holding the record's map entry, so a
/// concurrent second claim always observes the assignment and fails.
pub fn claim(
    state: &AppState,
    actor: &CurrentUser,
    donation_id: Uuid,
) -> Result<Donation, AppError> {
    actor.require(Role::Volunteer)?;

    let mut donation = state
        .donations
        .get_mut(&donation_id)
        .ok_or_else(|| AppError::NotFound(format!("donation {donation_id} not found")))?;

    if !donation.status.can_transition_to(DonationStatus::InTransit) {
        return Err(AppError::Conflict(format!(
            "donation is {}, not available for pickup",
            donation.status.as_str()
        )));
    }
    if donation.assigned_volunteer_id.is_some() {
        return Err(AppError::Conflict("donation already claimed".to_string()));
    }
    if donation.delivery_method != DeliveryMethod::Pickup {
        return Err(AppError::Conflict(
            "the donor delivers this donation themselves".to_string(),
        ));
    }

    donation.assigned_volunteer_id = Some(actor.id);
    donation.status = DonationStatus::InTransit;
    donation.updated_at = Utc::now();

    state
        .metrics
        .donation_transitions_total
        .with_label_values(&[DonationStatus::InTransit.as_str()])
        .inc();
    tracing::info!(donation_id = %donation_id, volunteer_id = %actor.id, "donation claimed");

    Ok(donation.clone())
}

/// Completes a delivery. Only the volunteer who claimed it may do so; the
/// state is terminal afterwards.
pub fn mark_delivered(
    state: &AppState,
    actor: &CurrentUser,
    donation_id: Uuid,
) -> Result<Donation, AppError> {
    actor.require(Role::Volunteer)?;

    let mut donation = state
        .donations
        .get_mut(&donation_id)
        .ok_or_else(|| AppError::NotFound(format!("donation {donation_id} not found")))?;

    if !donation.status.can_transition_to(DonationStatus::Delivered) {
        return Err(AppError::Conflict(format!(
            "donation is {}, not in transit",
            donation.status.as_str()
        )));
    }
    if donation.assigned_volunteer_id != Some(actor.id) {
        return Err(AppError::Authorization(
            "donation is assigned to another volunteer".to_string(),
        ));
    }

    donation.status = DonationStatus::Delivered;
    donation.updated_at = Utc::now();

    state
        .metrics
        .donation_transitions_total
        .with_label_values(&[DonationStatus::Delivered.as_str()])
        .inc();
    tracing::info!(donation_id = %donation_id, volunteer_id = %actor.id, "donation delivered");

    Ok(donation.clone())
}

pub fn pending_for_orphanage(
    state: &AppState,
    actor: &CurrentUser,
    orphanage_id: Uuid,
) -> Result<Vec<Donation>, AppError> {
    actor.require_any(&[Role::Orphanage, Role::Admin])?;

    let orphanage = state
        .orphanages
        .get(&orphanage_id)
        .ok_or_else(|| AppError::NotFound(format!("orphanage {orphanage_id} not found")))?;

    if !actor.has_role(Role::Admin) && orphanage.user_id != Some(actor.id) {
        return Err(AppError::Authorization(
            "not the representative of this orphanage".to_string(),
        ));
    }
    drop(orphanage);

    Ok(newest_first(collect(state, |donation| {
        donation.status == DonationStatus::Pending && donation.orphanage_id == Some(orphanage_id)
    })))
}

pub fn pending_all(state: &AppState, actor: &CurrentUser) -> Result<Vec<Donation>, AppError> {
    actor.require(Role::Admin)?;
    Ok(newest_first(collect(state, |donation| {
        donation.status == DonationStatus::Pending
    })))
}

pub fn for_donor(state: &AppState, actor: &CurrentUser) -> Result<Vec<Donation>, AppError> {
    actor.require(Role::Donor)?;
    let actor_id = actor.id;
    Ok(newest_first(collect(state, move |donation| {
        donation.donor_id == actor_id
    })))
}

/// Claimable donations: approved, pickup method, nobody assigned yet.
pub fn available_for_pickup(
    state: &AppState,
    actor: &CurrentUser,
) -> Result<Vec<Donation>, AppError> {
    actor.require(Role::Volunteer)?;
    Ok(newest_first(collect(state, |donation| {
        donation.status == DonationStatus::Approved
            && donation.delivery_method == DeliveryMethod::Pickup
            && donation.assigned_volunteer_id.is_none()
    })))
}

pub fn deliveries_for(state: &AppState, actor: &CurrentUser) -> Result<Vec<Donation>, AppError> {
    actor.require(Role::Volunteer)?;
    let actor_id = actor.id;
    Ok(newest_first(collect(state, move |donation| {
        donation.assigned_volunteer_id == Some(actor_id)
    })))
}

fn collect<F>(state: &AppState, keep: F) -> Vec<Donation>
where
    F: Fn(&Donation) -> bool,
{
    state
        .donations
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect()
}

fn newest_first(mut donations: Vec<Donation>) -> Vec<Donation> {
    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    donations
}
