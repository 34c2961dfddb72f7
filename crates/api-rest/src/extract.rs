//! Request extractors: bearer authentication, the reset-token header, and a
//! JSON body extractor whose rejection speaks the response envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;

use api_shared::{Claims, RESET_TOKEN_HEADER};
use bidanku_core::ServiceError;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, extracted from `Authorization: Bearer <JWT>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Token tidak ditemukan".into()))?;

        let claims = state
            .tokens
            .verify_access(token)
            .map_err(|_| ApiError::Unauthorized("Token tidak valid atau kadaluarsa".into()))?;

        Ok(AuthUser(claims))
    }
}

/// A verified password-reset claim, from the `X-Reset-Token` header.
#[derive(Debug, Clone)]
pub struct ResetClaims(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for ResetClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(RESET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Token reset tidak ditemukan".into()))?;

        let claims = state
            .tokens
            .verify_reset(token)
            .map_err(|_| ApiError::Unauthorized("Token reset tidak valid atau kadaluarsa".into()))?;

        Ok(ResetClaims(claims))
    }
}

/// `Json` wrapper that reports malformed bodies as a 400 validation error in
/// the envelope instead of axum's plain-text rejection.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ApiError::Service(ServiceError::invalid(
                "body",
                rejection.body_text(),
            ))),
        }
    }
}
