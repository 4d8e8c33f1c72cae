use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `user_id` stays empty until a representative registers the organization
/// themselves. `approved` flips false -> true exactly once, by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orphanage {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}
