pub mod donations;
pub mod orphanages;
