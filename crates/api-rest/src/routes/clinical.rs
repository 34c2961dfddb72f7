//! The uniform endpoint set shared by all five clinical services.
//!
//! One generic router covers ANC, KB, imunisasi, persalinan and kunjungan;
//! the concrete instantiations are nested under `/api/{service}` by the
//! top-level router. These handlers are generic over the service
//! descriptor, which `utoipa::path` cannot express, so this surface is
//! documented in the README instead of the OpenAPI file.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};

use api_shared::Envelope;
use bidanku_core::{ClinicalService, EncounterRecord, RegistrationOutcome, RegistrationService};

use crate::error::ApiError;
use crate::extract::{AppJson, AuthUser};
use crate::state::AppState;

/// Gives the generic handlers access to the right service instance on
/// [`AppState`]; implemented once per clinical service.
pub trait HasService<S: ClinicalService> {
    fn service(&self) -> &RegistrationService<S>;
}

#[derive(Debug, serde::Deserialize)]
pub struct EncounterListParams {
    /// Substring match on the patient name.
    pub q: Option<String>,
    /// Exact NIK match.
    pub nik: Option<String>,
}

pub fn router<S>() -> Router<AppState>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    Router::new()
        .route("/", get(list::<S>).post(register::<S>))
        .route("/deleted", get(deleted::<S>))
        .route("/:id", get(detail::<S>).put(update::<S>).delete(remove::<S>))
        .route("/restore/:id", put(restore::<S>))
        .route("/permanent/:id", delete(purge::<S>))
}

async fn list<S>(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<EncounterListParams>,
) -> Result<Json<Envelope<Vec<EncounterRecord<S::Detail>>>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    let records = state
        .service()
        .list(params.q.as_deref(), params.nik.as_deref())
        .await?;
    Ok(Json(Envelope::ok("Daftar pemeriksaan", records)))
}

async fn register<S>(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(payload): AppJson<S::Payload>,
) -> Result<(StatusCode, Json<Envelope<RegistrationOutcome>>), ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    let outcome = state.service().register(Some(&claims.sub), &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Pendaftaran berhasil disimpan", outcome)),
    ))
}

async fn detail<S>(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<EncounterRecord<S::Detail>>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    let record = state.service().get(&id).await?;
    Ok(Json(Envelope::ok("Detail pemeriksaan", record)))
}

async fn update<S>(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<S::Payload>,
) -> Result<Json<Envelope<()>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    state.service().update(Some(&claims.sub), &id, &payload).await?;
    Ok(Json(Envelope::message("Pemeriksaan berhasil diperbarui")))
}

async fn remove<S>(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    state.service().soft_delete(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Pemeriksaan berhasil dihapus")))
}

async fn deleted<S>(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Envelope<Vec<EncounterRecord<S::Detail>>>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    let records = state.service().deleted().await?;
    Ok(Json(Envelope::ok("Daftar pemeriksaan terhapus", records)))
}

async fn restore<S>(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    state.service().restore(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Pemeriksaan berhasil dipulihkan")))
}

async fn purge<S>(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError>
where
    S: ClinicalService,
    AppState: HasService<S>,
{
    state.service().purge(Some(&claims.sub), &id).await?;
    Ok(Json(Envelope::message("Pemeriksaan dihapus permanen")))
}
