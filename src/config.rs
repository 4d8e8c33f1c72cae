use std::env;

use crate::error::AppError;
use crate::state::AuthSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub allowed_origins: Vec<String>,
    pub otp_ttl_seconds: i64,
    pub otp_length: u32,
    pub session_ttl_seconds: i64,
    pub debug_return_otp: bool,
    pub admin_phone: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let allowed_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            allowed_origins,
            otp_ttl_seconds: parse_or_default("OTP_TTL_SECONDS", 300)?,
            otp_length: parse_or_default("OTP_LENGTH", 6)?,
            session_ttl_seconds: parse_or_default("SESSION_TTL_SECONDS", 7 * 24 * 3600)?,
            debug_return_otp: parse_or_default("DEBUG_RETURN_OTP", true)?,
            admin_phone: env::var("ADMIN_PHONE").ok(),
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            otp_ttl_seconds: self.otp_ttl_seconds,
            otp_length: self.otp_length,
            session_ttl_seconds: self.session_ttl_seconds,
            debug_return_otp: self.debug_return_otp,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
