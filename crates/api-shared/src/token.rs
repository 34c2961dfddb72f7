//! JWT minting and verification.
//!
//! Two token kinds share one signing key: the access token carried in the
//! `Authorization` header, and a short-lived password-reset token marked by
//! the `is_reset` claim. A reset token never authenticates an API call and
//! an access token never completes a password reset.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Header that carries the password-reset token.
pub const RESET_TOKEN_HEADER: &str = "x-reset-token";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Marks a password-reset token.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_reset: bool,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token tidak valid atau kadaluarsa")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies both token kinds with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_minutes: i64,
    reset_minutes: i64,
}

impl TokenService {
    pub fn new(secret: &str, access_minutes: i64, reset_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_minutes,
            reset_minutes,
        }
    }

    /// Mints an access token for an authenticated user.
    pub fn mint_access(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
    ) -> Result<String, TokenError> {
        self.mint(user_id, username, email, false, self.access_minutes)
    }

    /// Mints a short-lived password-reset token.
    pub fn mint_reset(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
    ) -> Result<String, TokenError> {
        self.mint(user_id, username, email, true, self.reset_minutes)
    }

    fn mint(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
        is_reset: bool,
        minutes: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_owned(),
            username: username.to_owned(),
            email: email.to_owned(),
            is_reset,
            exp: (now + Duration::minutes(minutes)).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verifies an access token; reset tokens are rejected here.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.is_reset {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Verifies a reset token; access tokens are rejected here.
    pub fn verify_reset(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if !claims.is_reset {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 60, 15)
    }

    #[test]
    fn access_token_round_trip() {
        let svc = service();
        let token = svc.mint_access("u1", "bidan", "bidan@example.com").unwrap();
        let claims = svc.verify_access(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "bidan");
        assert!(!claims.is_reset);
    }

    #[test]
    fn reset_token_does_not_authenticate_requests() {
        let svc = service();
        let token = svc.mint_reset("u1", "bidan", "bidan@example.com").unwrap();
        assert!(svc.verify_access(&token).is_err());
        assert!(svc.verify_reset(&token).is_ok());
    }

    #[test]
    fn access_token_cannot_complete_reset() {
        let svc = service();
        let token = svc.mint_access("u1", "bidan", "bidan@example.com").unwrap();
        assert!(svc.verify_reset(&token).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let svc = service();
        let other = TokenService::new("other-secret", 60, 15);
        let token = svc.mint_access("u1", "bidan", "bidan@example.com").unwrap();
        assert!(other.verify_access(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative lifetime backdates the expiry past the default leeway.
        let svc = TokenService::new("test-secret", -2, -2);
        let token = svc.mint_access("u1", "bidan", "bidan@example.com").unwrap();
        assert!(svc.verify_access(&token).is_err());
    }
}
