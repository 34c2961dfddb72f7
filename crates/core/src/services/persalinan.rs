//! Delivery (persalinan) service descriptor.
//!
//! Deliveries share the uniform soft-delete lifecycle of every other
//! service type; a purge is a flag, never a physical row removal.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::patients::PatientInput;
use crate::registration::{
    num_or_dash, or_dash, ClinicalService, RegistrationPayload, ServiceKind, SoapNote,
};
use crate::validate::Validator;

/// Start time used when the payload does not carry one.
pub const DEFAULT_JAM_MULAI: &str = "08:00:00";

/// Registration payload for a delivery.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct PersalinanPayload {
    pub pasien: PatientInput,
    pub tanggal: NaiveDate,
    /// Delivery mode (normal, vakum, sectio, ...).
    pub jenis_persalinan: String,
    /// Attending midwife or physician.
    #[serde(default)]
    pub penolong: Option<String>,
    /// Newborn weight in grams.
    #[serde(default)]
    pub berat_bayi: Option<f64>,
    /// Newborn length in centimetres.
    #[serde(default)]
    pub panjang_bayi: Option<f64>,
    /// Start of labour, `HH:MM:SS`; defaults to 08:00:00 when absent.
    #[serde(default)]
    pub jam_mulai: Option<String>,
    #[serde(default)]
    pub jam_selesai: Option<String>,
}

impl PersalinanPayload {
    /// Start time with the fixed default applied.
    fn jam_mulai_or_default(&self) -> &str {
        match self.jam_mulai.as_deref().map(str::trim) {
            Some(jam) if !jam.is_empty() => jam,
            _ => DEFAULT_JAM_MULAI,
        }
    }
}

impl RegistrationPayload for PersalinanPayload {
    fn patient(&self) -> &PatientInput {
        &self.pasien
    }

    fn tanggal(&self) -> NaiveDate {
        self.tanggal
    }

    fn validate(&self) -> ServiceResult<()> {
        self.pasien.validate()?;
        let mut v = Validator::new();
        v.require("jenis_persalinan", &self.jenis_persalinan);
        v.positive("berat_bayi", self.berat_bayi);
        v.positive("panjang_bayi", self.panjang_bayi);
        v.time_format("jam_mulai", self.jam_mulai.as_deref().filter(|s| !s.trim().is_empty()));
        v.time_format("jam_selesai", self.jam_selesai.as_deref().filter(|s| !s.trim().is_empty()));
        v.finish()
    }
}

/// Delivery detail row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct PersalinanDetail {
    pub id: String,
    pub pemeriksaan_id: String,
    pub jenis_persalinan: String,
    pub penolong: Option<String>,
    pub berat_bayi: Option<f64>,
    pub panjang_bayi: Option<f64>,
    pub jam_mulai: String,
    pub jam_selesai: Option<String>,
}

pub struct Persalinan;

impl ClinicalService for Persalinan {
    const KIND: ServiceKind = ServiceKind::Persalinan;

    type Payload = PersalinanPayload;
    type Detail = PersalinanDetail;

    fn soap(payload: &PersalinanPayload) -> SoapNote {
        SoapNote {
            subjektif: format!(
                "Persalinan dengan metode {}",
                payload.jenis_persalinan.trim()
            ),
            objektif: format!(
                "Bayi lahir, BB: {} gram, PB: {} cm",
                num_or_dash(payload.berat_bayi),
                num_or_dash(payload.panjang_bayi)
            ),
            analisa: format!("Persalinan ditolong oleh {}", or_dash(payload.penolong.as_deref())),
            penatalaksanaan: "Observasi ibu dan bayi pasca persalinan".to_string(),
        }
    }

    async fn insert_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &PersalinanPayload,
    ) -> ServiceResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO persalinan \
             (id, pemeriksaan_id, jenis_persalinan, penolong, berat_bayi, panjang_bayi, \
              jam_mulai, jam_selesai) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(pemeriksaan_id)
        .bind(payload.jenis_persalinan.trim())
        .bind(payload.penolong.as_deref())
        .bind(payload.berat_bayi)
        .bind(payload.panjang_bayi)
        .bind(payload.jam_mulai_or_default())
        .bind(payload.jam_selesai.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn update_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &PersalinanPayload,
    ) -> ServiceResult<String> {
        let id: String = sqlx::query_scalar("SELECT id FROM persalinan WHERE pemeriksaan_id = ?")
            .bind(pemeriksaan_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ServiceError::NotFound("persalinan"))?;

        sqlx::query(
            "UPDATE persalinan SET jenis_persalinan = ?, penolong = ?, berat_bayi = ?, \
             panjang_bayi = ?, jam_mulai = ?, jam_selesai = ? WHERE id = ?",
        )
        .bind(payload.jenis_persalinan.trim())
        .bind(payload.penolong.as_deref())
        .bind(payload.berat_bayi)
        .bind(payload.panjang_bayi)
        .bind(payload.jam_mulai_or_default())
        .bind(payload.jam_selesai.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(&id)
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn fetch_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
    ) -> ServiceResult<PersalinanDetail> {
        sqlx::query_as::<_, PersalinanDetail>(
            "SELECT id, pemeriksaan_id, jenis_persalinan, penolong, berat_bayi, panjang_bayi, \
             jam_mulai, jam_selesai FROM persalinan WHERE pemeriksaan_id = ?",
        )
        .bind(pemeriksaan_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("persalinan"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> PersalinanPayload {
        PersalinanPayload {
            pasien: PatientInput {
                nama: "Dewi".into(),
                nik: Some("3201234567890002".into()),
                umur: Some(29),
                alamat: None,
                telepon: None,
            },
            tanggal: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            jenis_persalinan: "normal".into(),
            penolong: Some("Bidan Ratna".into()),
            berat_bayi: Some(3100.0),
            panjang_bayi: Some(49.0),
            jam_mulai: None,
            jam_selesai: Some("10:45:00".into()),
        }
    }

    #[test]
    fn start_time_defaults_to_eight() {
        assert_eq!(payload().jam_mulai_or_default(), "08:00:00");
        let mut p = payload();
        p.jam_mulai = Some("  ".into());
        assert_eq!(p.jam_mulai_or_default(), "08:00:00");
        p.jam_mulai = Some("06:30:00".into());
        assert_eq!(p.jam_mulai_or_default(), "06:30:00");
    }

    #[test]
    fn soap_reports_mode_and_newborn() {
        let soap = Persalinan::soap(&payload());
        assert_eq!(soap.subjektif, "Persalinan dengan metode normal");
        assert_eq!(soap.objektif, "Bayi lahir, BB: 3100 gram, PB: 49 cm");
        assert_eq!(soap.analisa, "Persalinan ditolong oleh Bidan Ratna");
    }

    #[test]
    fn malformed_time_is_rejected() {
        let mut p = payload();
        p.jam_selesai = Some("25:99".into());
        assert!(p.validate().is_err());
    }
}
