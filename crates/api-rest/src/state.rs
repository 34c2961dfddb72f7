//! Shared application state for the REST handlers.

use std::sync::Arc;

use api_shared::TokenService;
use bidanku_core::services::{
    Anc, AncService, Imunisasi, ImunisasiService, Kb, KbService, Kunjungan, KunjunganService,
    Persalinan, PersalinanService,
};
use bidanku_core::{
    AppConfig, AuditLog, AuthService, OtpMailer, PatientService, RegistrationService,
    ReportService, ScheduleService, SqlitePool,
};

use crate::routes::clinical::HasService;

/// Everything a handler needs, cloned per request. Services share the one
/// connection pool; no component reads process state of its own.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub audit: AuditLog,
    pub auth: AuthService,
    pub patients: PatientService,
    pub anc: AncService,
    pub kb: KbService,
    pub imunisasi: ImunisasiService,
    pub persalinan: PersalinanService,
    pub kunjungan: KunjunganService,
    pub jadwal: ScheduleService,
    pub laporan: ReportService,
}

impl AppState {
    /// Wires every service onto the pool and configuration.
    pub fn new(pool: SqlitePool, config: AppConfig, mailer: Arc<dyn OtpMailer>) -> Self {
        let audit = AuditLog::new(pool.clone());
        let tokens = TokenService::new(
            &config.jwt_secret,
            config.jwt_expiry_minutes,
            config.reset_expiry_minutes,
        );
        let auth = AuthService::new(
            pool.clone(),
            audit.clone(),
            mailer,
            config.otp_expiry_minutes,
            config.bcrypt_cost,
        );

        Self {
            tokens,
            auth,
            patients: PatientService::new(pool.clone(), audit.clone()),
            anc: RegistrationService::new(pool.clone(), audit.clone()),
            kb: RegistrationService::new(pool.clone(), audit.clone()),
            imunisasi: RegistrationService::new(pool.clone(), audit.clone()),
            persalinan: RegistrationService::new(pool.clone(), audit.clone()),
            kunjungan: RegistrationService::new(pool.clone(), audit.clone()),
            jadwal: ScheduleService::new(pool.clone(), audit.clone()),
            laporan: ReportService::new(pool, audit.clone()),
            audit,
            config: Arc::new(config),
        }
    }
}

impl HasService<Anc> for AppState {
    fn service(&self) -> &RegistrationService<Anc> {
        &self.anc
    }
}

impl HasService<Kb> for AppState {
    fn service(&self) -> &RegistrationService<Kb> {
        &self.kb
    }
}

impl HasService<Imunisasi> for AppState {
    fn service(&self) -> &RegistrationService<Imunisasi> {
        &self.imunisasi
    }
}

impl HasService<Persalinan> for AppState {
    fn service(&self) -> &RegistrationService<Persalinan> {
        &self.persalinan
    }
}

impl HasService<Kunjungan> for AppState {
    fn service(&self) -> &RegistrationService<Kunjungan> {
        &self.kunjungan
    }
}
