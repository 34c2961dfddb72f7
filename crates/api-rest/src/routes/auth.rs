//! Authentication endpoints: the two-step login, and password reset.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use api_shared::Envelope;
use bidanku_core::User;

use crate::error::ApiError;
use crate::extract::{AppJson, ResetClaims};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/verify-otp", post(verify_otp))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Best-effort client address for the access log.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Password accepted, OTP sent by email"),
        (status = 401, description = "Wrong username or password")
    )
)]
/// Step one: verify the password and issue a one-time code.
pub(crate) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<LoginReq>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state
        .auth
        .login(&req.username, &req.password, client_ip(&headers).as_deref())
        .await?;
    Ok(Json(Envelope::message(
        "Kode OTP telah dikirim ke email Anda",
    )))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct VerifyOtpReq {
    pub username: String,
    pub kode: String,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct LoginRes {
    pub token: String,
    pub user: User,
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpReq,
    responses(
        (status = 200, description = "Code accepted, JWT issued", body = LoginRes),
        (status = 401, description = "Invalid or expired code")
    )
)]
/// Step two: exchange the one-time code for a JWT.
pub(crate) async fn verify_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<VerifyOtpReq>,
) -> Result<Json<Envelope<LoginRes>>, ApiError> {
    let user = state
        .auth
        .verify_otp(&req.username, &req.kode, client_ip(&headers).as_deref())
        .await?;

    let token = state
        .tokens
        .mint_access(&user.id, &user.username, &user.email)
        .map_err(|_| ApiError::Unauthorized("Gagal menerbitkan token".into()))?;

    Ok(Json(Envelope::ok("Login berhasil", LoginRes { token, user })))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordReq {
    pub email: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Reset token sent by email"),
        (status = 404, description = "Unknown email address")
    )
)]
/// Issues a short-lived reset token and hands it to the mailer.
pub(crate) async fn forgot_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ForgotPasswordReq>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let user = state.auth.user_by_email(&req.email).await?;

    let token = state
        .tokens
        .mint_reset(&user.id, &user.username, &user.email)
        .map_err(|_| ApiError::Unauthorized("Gagal menerbitkan token".into()))?;

    state.auth.deliver_reset_token(&user, &token);
    Ok(Json(Envelope::message(
        "Token reset password telah dikirim ke email Anda",
    )))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordReq {
    pub user_id: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordReq,
    responses(
        (status = 200, description = "Password replaced"),
        (status = 401, description = "Missing or invalid reset token"),
        (status = 403, description = "Token does not belong to the given user")
    )
)]
/// Completes a reset: the `X-Reset-Token` header must carry a reset token
/// whose subject matches the user id in the body.
pub(crate) async fn reset_password(
    State(state): State<AppState>,
    ResetClaims(claims): ResetClaims,
    AppJson(req): AppJson<ResetPasswordReq>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if claims.sub != req.user_id {
        return Err(ApiError::Forbidden(
            "Token reset tidak sesuai dengan pengguna".into(),
        ));
    }

    state.auth.reset_password(&req.user_id, &req.password).await?;
    Ok(Json(Envelope::message("Password berhasil diperbarui")))
}
