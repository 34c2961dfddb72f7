//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services by handle. Nothing in this crate reads environment variables on
//! a request path; the binaries call [`AppConfig::from_env`] exactly once.

use std::path::PathBuf;

use crate::error::{ServiceError, ServiceResult};

/// Application configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
    /// Maximum size of the connection pool.
    pub max_connections: u32,
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Secret used to sign access and reset tokens.
    pub jwt_secret: String,
    /// Lifetime of an access token, in minutes.
    pub jwt_expiry_minutes: i64,
    /// Lifetime of a password-reset token, in minutes.
    pub reset_expiry_minutes: i64,
    /// Lifetime of a login one-time code, in minutes.
    pub otp_expiry_minutes: i64,
    /// bcrypt cost factor for password hashing.
    pub bcrypt_cost: u32,
    /// Development mode: error detail is included in 500 responses.
    pub development: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("bidanku.db"),
            max_connections: 5,
            bind_addr: "0.0.0.0:3000".into(),
            jwt_secret: "bidanku-dev-secret".into(),
            jwt_expiry_minutes: 12 * 60,
            reset_expiry_minutes: 15,
            otp_expiry_minutes: 5,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            development: true,
        }
    }
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    ///
    /// Every key has a local-development default except `JWT_SECRET`, which
    /// is mandatory outside development mode.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a numeric value fails to parse or the
    /// production secret is missing.
    pub fn from_env() -> ServiceResult<Self> {
        let defaults = Self::default();
        let development = match std::env::var("APP_ENV").ok().as_deref() {
            Some("production") => false,
            _ => true,
        };

        let jwt_secret = match std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if development => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                defaults.jwt_secret.clone()
            }
            None => {
                return Err(ServiceError::invalid(
                    "JWT_SECRET",
                    "JWT_SECRET must be set outside development mode",
                ));
            }
        };

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret,
            jwt_expiry_minutes: parse_env("JWT_EXPIRY_MINUTES", defaults.jwt_expiry_minutes)?,
            reset_expiry_minutes: parse_env(
                "RESET_TOKEN_EXPIRY_MINUTES",
                defaults.reset_expiry_minutes,
            )?,
            otp_expiry_minutes: parse_env("OTP_EXPIRY_MINUTES", defaults.otp_expiry_minutes)?,
            bcrypt_cost: parse_env("BCRYPT_COST", defaults.bcrypt_cost)?,
            development,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> ServiceResult<T> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ServiceError::invalid(key, format!("{key} is not a valid number"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development_friendly() {
        let cfg = AppConfig::default();
        assert!(cfg.development);
        assert_eq!(cfg.otp_expiry_minutes, 5);
        assert_eq!(cfg.bcrypt_cost, bcrypt::DEFAULT_COST);
    }
}
