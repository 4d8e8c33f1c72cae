pub mod donation;
pub mod orphanage;
pub mod user;
