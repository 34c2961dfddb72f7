//! Audit-trail query endpoints.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;

use api_shared::Envelope;
use bidanku_core::{AccessEntry, AuditEntry, AuditFilter};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_audit))
        .route("/akses", get(list_access))
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct AuditParams {
    /// Exact action (CREATE/UPDATE/DELETE/RESTORE), case-insensitive.
    pub aksi: Option<String>,
    /// Substring match on the affected table.
    pub tabel: Option<String>,
    /// Substring match on the acting user's username.
    pub username: Option<String>,
    /// Inclusive start date.
    pub dari: Option<NaiveDate>,
    /// Inclusive end date.
    pub sampai: Option<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/api/audit",
    params(AuditParams),
    responses((status = 200, description = "Audit entries, newest first, capped at 1000"))
)]
pub(crate) async fn list_audit(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<AuditParams>,
) -> Result<Json<Envelope<Vec<AuditEntry>>>, ApiError> {
    let filter = AuditFilter {
        aksi: params.aksi,
        tabel: params.tabel,
        username: params.username,
        dari: params.dari,
        sampai: params.sampai,
    };
    let entries = state.audit.query(&filter).await?;
    Ok(Json(Envelope::ok("Riwayat audit", entries)))
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct AccessParams {
    /// Substring match on the attempted username.
    pub username: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/audit/akses",
    params(AccessParams),
    responses((status = 200, description = "Login attempts, newest first, capped at 1000"))
)]
pub(crate) async fn list_access(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<AccessParams>,
) -> Result<Json<Envelope<Vec<AccessEntry>>>, ApiError> {
    let entries = state.audit.access_log(params.username.as_deref()).await?;
    Ok(Json(Envelope::ok("Riwayat akses", entries)))
}
