//! Patient CRUD and lifecycle endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};

use api_shared::Envelope;
use bidanku_core::{Patient, PatientInput};

use crate::error::ApiError;
use crate::extract::{AppJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route("/deleted", get(deleted_patients))
        .route(
            "/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/restore/:id", put(restore_patient))
        .route("/permanent/:id", delete(purge_patient))
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct PatientListParams {
    /// Substring match on name or NIK.
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/pasien",
    params(PatientListParams),
    responses(
        (status = 200, description = "Patients that are neither deleted nor purged"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub(crate) async fn list_patients(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<PatientListParams>,
) -> Result<Json<Envelope<Vec<Patient>>>, ApiError> {
    let patients = state.patients.list(params.q.as_deref()).await?;
    Ok(Json(Envelope::ok("Daftar pasien", patients)))
}

#[utoipa::path(
    post,
    path = "/api/pasien",
    request_body = PatientInput,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Validation failure or duplicate NIK")
    )
)]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(input): AppJson<PatientInput>,
) -> Result<(StatusCode, Json<Envelope<Patient>>), ApiError> {
    let patient = state.patients.create(Some(&claims.sub), &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Pasien berhasil ditambahkan", patient)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/pasien/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient detail", body = Patient),
        (status = 404, description = "Unknown, deleted or purged patient")
    )
)]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Patient>>, ApiError> {
    let patient = state.patients.get(&id).await?;
    Ok(Json(Envelope::ok("Detail pasien", patient)))
}

#[utoipa::path(
    put,
    path = "/api/pasien/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientInput,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 404, description = "Unknown, deleted or purged patient")
    )
)]
pub(crate) async fn update_patient(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    AppJson(input): AppJson<PatientInput>,
) -> Result<Json<Envelope<Patient>>, ApiError> {
    let patient = state.patients.update(Some(&claims.sub), &id, &input).await?;
    Ok(Json(Envelope::ok("Data pasien berhasil diperbarui", patient)))
}

#[utoipa::path(
    delete,
    path = "/api/pasien/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient soft-deleted"),
        (status = 404, description = "Unknown or already deleted patient")
    )
)]
pub(crate) async fn delete_patient(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state.patients.soft_delete(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Pasien berhasil dihapus")))
}

#[utoipa::path(
    get,
    path = "/api/pasien/deleted",
    responses((status = 200, description = "Soft-deleted patients"))
)]
pub(crate) async fn deleted_patients(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Envelope<Vec<Patient>>>, ApiError> {
    let patients = state.patients.deleted().await?;
    Ok(Json(Envelope::ok("Daftar pasien terhapus", patients)))
}

#[utoipa::path(
    put,
    path = "/api/pasien/restore/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient restored"),
        (status = 404, description = "Patient is not in the deleted state")
    )
)]
pub(crate) async fn restore_patient(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state.patients.restore(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Pasien berhasil dipulihkan")))
}

#[utoipa::path(
    delete,
    path = "/api/pasien/permanent/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient purged irreversibly"),
        (status = 404, description = "Patient is not in the deleted state")
    )
)]
pub(crate) async fn purge_patient(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state.patients.purge(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Pasien dihapus permanen")))
}
