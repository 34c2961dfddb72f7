//! # Bidanku Core
//!
//! Domain logic for the clinic backend of a midwife practice: patient
//! identity, the shared clinical-registration protocol, the soft-delete
//! lifecycle, schedules, reports, staff auth with one-time codes, and the
//! append-only audit trail.
//!
//! **No API concerns**: HTTP routing, token minting and response envelopes
//! live in `api-rest` and `api-shared`. Everything here takes a database
//! pool and configuration by handle and returns [`error::ServiceError`] on
//! failure.

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod patients;
pub mod registration;
pub mod reports;
pub mod schedule;
pub mod services;

mod validate;

pub use audit::{AccessEntry, AuditAction, AuditEntry, AuditFilter, AuditLog};
pub use auth::{AuthService, LogMailer, NewUser, OtpMailer, User};
pub use config::AppConfig;
pub use db::SqlitePool;
pub use error::{FieldError, ServiceError, ServiceResult};
pub use patients::{Patient, PatientInput, PatientService};
pub use registration::{
    ClinicalService, EncounterRecord, Examination, RegistrationOutcome, RegistrationService,
    ServiceKind, SoapNote,
};
pub use reports::{Laporan, ReportService, ServiceCounts};
pub use schedule::{Schedule, ScheduleInput, ScheduleService};
