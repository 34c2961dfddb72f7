//! Reporting endpoints: live per-period summary and stored snapshots.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use api_shared::Envelope;
use bidanku_core::{Laporan, ServiceCounts};

use crate::error::ApiError;
use crate::extract::{AppJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(snapshot_report))
        .route("/ringkasan", get(summary))
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct SummaryParams {
    /// Reporting period, `YYYY-MM`.
    pub periode: String,
}

#[utoipa::path(
    get,
    path = "/api/laporan/ringkasan",
    params(SummaryParams),
    responses(
        (status = 200, description = "Live encounter counts per service type", body = ServiceCounts),
        (status = 400, description = "Malformed period")
    )
)]
pub(crate) async fn summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Envelope<ServiceCounts>>, ApiError> {
    let counts = state.laporan.summary(&params.periode).await?;
    Ok(Json(Envelope::ok("Ringkasan layanan", counts)))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct SnapshotReq {
    /// Reporting period, `YYYY-MM`.
    pub periode: String,
}

#[utoipa::path(
    post,
    path = "/api/laporan",
    request_body = SnapshotReq,
    responses(
        (status = 201, description = "Summary frozen into a laporan row", body = Laporan),
        (status = 400, description = "Malformed period")
    )
)]
pub(crate) async fn snapshot_report(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(req): AppJson<SnapshotReq>,
) -> Result<(StatusCode, Json<Envelope<Laporan>>), ApiError> {
    let laporan = state.laporan.snapshot(Some(&claims.sub), &req.periode).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Laporan berhasil disimpan", laporan)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/laporan",
    responses((status = 200, description = "Stored report snapshots, newest first"))
)]
pub(crate) async fn list_reports(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Envelope<Vec<Laporan>>>, ApiError> {
    let reports = state.laporan.list().await?;
    Ok(Json(Envelope::ok("Daftar laporan", reports)))
}
