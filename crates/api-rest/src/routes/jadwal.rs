//! Appointment endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;

use api_shared::Envelope;
use bidanku_core::{Schedule, ScheduleInput};

use crate::error::ApiError;
use crate::extract::{AppJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route(
            "/:id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct ScheduleListParams {
    /// Restrict to one calendar date.
    pub tanggal: Option<NaiveDate>,
    /// Restrict to one patient.
    pub pasien_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/jadwal",
    params(ScheduleListParams),
    responses((status = 200, description = "Appointments ordered by date and time"))
)]
pub(crate) async fn list_schedules(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ScheduleListParams>,
) -> Result<Json<Envelope<Vec<Schedule>>>, ApiError> {
    let schedules = state
        .jadwal
        .list(params.tanggal, params.pasien_id.as_deref())
        .await?;
    Ok(Json(Envelope::ok("Daftar jadwal", schedules)))
}

#[utoipa::path(
    post,
    path = "/api/jadwal",
    request_body = ScheduleInput,
    responses(
        (status = 201, description = "Appointment created", body = Schedule),
        (status = 404, description = "Unknown patient or staff member")
    )
)]
pub(crate) async fn create_schedule(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(input): AppJson<ScheduleInput>,
) -> Result<(StatusCode, Json<Envelope<Schedule>>), ApiError> {
    let schedule = state.jadwal.create(Some(&claims.sub), &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Jadwal berhasil dibuat", schedule)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/jadwal/{id}",
    params(("id" = String, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Appointment detail", body = Schedule),
        (status = 404, description = "Unknown appointment")
    )
)]
pub(crate) async fn get_schedule(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Schedule>>, ApiError> {
    let schedule = state.jadwal.get(&id).await?;
    Ok(Json(Envelope::ok("Detail jadwal", schedule)))
}

#[utoipa::path(
    put,
    path = "/api/jadwal/{id}",
    params(("id" = String, Path, description = "Schedule id")),
    request_body = ScheduleInput,
    responses(
        (status = 200, description = "Appointment replaced", body = Schedule),
        (status = 404, description = "Unknown appointment")
    )
)]
pub(crate) async fn update_schedule(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    AppJson(input): AppJson<ScheduleInput>,
) -> Result<Json<Envelope<Schedule>>, ApiError> {
    let schedule = state.jadwal.update(Some(&claims.sub), &id, &input).await?;
    Ok(Json(Envelope::ok("Jadwal berhasil diperbarui", schedule)))
}

#[utoipa::path(
    delete,
    path = "/api/jadwal/{id}",
    params(("id" = String, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Appointment removed"),
        (status = 404, description = "Unknown appointment")
    )
)]
pub(crate) async fn delete_schedule(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state.jadwal.delete(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Jadwal berhasil dihapus")))
}
