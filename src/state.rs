use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::otp::OtpEntry;
use crate::auth::sessions::Session;
use crate::models::donation::Donation;
use crate::models::orphanage::Orphanage;
use crate::models::user::User;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub otp_ttl_seconds: i64,
    pub otp_length: u32,
    pub session_ttl_seconds: i64,
    pub debug_return_otp: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            otp_ttl_seconds: 300,
            otp_length: 6,
            session_ttl_seconds: 7 * 24 * 3600,
            debug_return_otp: true,
        }
    }
}

pub struct AppState {
    pub users: DashMap<Uuid, User>,
    /// phone -> user id; phones are unique.
    pub users_by_phone: DashMap<String, Uuid>,
    pub orphanages: DashMap<Uuid, Orphanage>,
    pub donations: DashMap<Uuid, Donation>,
    /// phone -> latest outstanding code; a new request replaces the old entry.
    pub otps: DashMap<String, OtpEntry>,
    /// opaque bearer token -> session.
    pub sessions: DashMap<String, Session>,
    pub auth: AuthSettings,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(auth: AuthSettings) -> Self {
        Self {
            users: DashMap::new(),
            users_by_phone: DashMap::new(),
            orphanages: DashMap::new(),
            donations: DashMap::new(),
            otps: DashMap::new(),
            sessions: DashMap::new(),
            auth,
            metrics: Metrics::new(),
        }
    }
}
