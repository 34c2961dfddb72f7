//! # API REST
//!
//! The HTTP surface of the clinic backend:
//! - axum routers per domain, with one generic router instantiated for each
//!   of the five clinical services
//! - bearer-token authentication on everything except `/health` and the
//!   login flow
//! - the uniform response envelope and error mapping
//! - the OpenAPI document served at `/api-docs/openapi.json`

pub mod error;
pub mod extract;
pub mod routes;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use api_shared::{HealthRes, HealthService};
use bidanku_core::services::{Anc, Imunisasi, Kb, Kunjungan, Persalinan};

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        routes::auth::login,
        routes::auth::verify_otp,
        routes::auth::forgot_password,
        routes::auth::reset_password,
        routes::patients::list_patients,
        routes::patients::create_patient,
        routes::patients::get_patient,
        routes::patients::update_patient,
        routes::patients::delete_patient,
        routes::patients::deleted_patients,
        routes::patients::restore_patient,
        routes::patients::purge_patient,
        routes::jadwal::list_schedules,
        routes::jadwal::create_schedule,
        routes::jadwal::get_schedule,
        routes::jadwal::update_schedule,
        routes::jadwal::delete_schedule,
        routes::laporan::summary,
        routes::laporan::snapshot_report,
        routes::laporan::list_reports,
        routes::audit::list_audit,
        routes::audit::list_access,
    ),
    components(schemas(
        HealthRes,
        routes::auth::LoginReq,
        routes::auth::VerifyOtpReq,
        routes::auth::LoginRes,
        routes::auth::ForgotPasswordReq,
        routes::auth::ResetPasswordReq,
        routes::laporan::SnapshotReq,
        bidanku_core::Patient,
        bidanku_core::PatientInput,
        bidanku_core::Schedule,
        bidanku_core::ScheduleInput,
        bidanku_core::ServiceCounts,
        bidanku_core::Laporan,
        bidanku_core::AuditEntry,
        bidanku_core::AccessEntry,
        bidanku_core::User,
        bidanku_core::FieldError,
    ))
)]
struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthRes))
)]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Builds the full application router on the given state.
pub fn router(state: AppState) -> Router {
    error::set_development(state.config.development);

    let api = Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/pasien", routes::patients::router())
        .nest("/anc", routes::clinical::router::<Anc>())
        .nest("/kb", routes::clinical::router::<Kb>())
        .nest("/imunisasi", routes::clinical::router::<Imunisasi>())
        .nest("/persalinan", routes::clinical::router::<Persalinan>())
        .nest("/kunjungan", routes::clinical::router::<Kunjungan>())
        .nest("/jadwal", routes::jadwal::router())
        .nest("/laporan", routes::laporan::router())
        .nest("/audit", routes::audit::router());

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
