//! General visit (kunjungan umum) service descriptor.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::patients::PatientInput;
use crate::registration::{or_dash, ClinicalService, RegistrationPayload, ServiceKind, SoapNote};
use crate::validate::Validator;

/// Registration payload for a general visit.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct KunjunganPayload {
    pub pasien: PatientInput,
    pub tanggal: NaiveDate,
    /// Presenting complaint.
    pub keluhan: String,
    /// Physical-examination findings.
    #[serde(default)]
    pub pemeriksaan_fisik: Option<String>,
    #[serde(default)]
    pub diagnosa: Option<String>,
    #[serde(default)]
    pub terapi: Option<String>,
}

impl RegistrationPayload for KunjunganPayload {
    fn patient(&self) -> &PatientInput {
        &self.pasien
    }

    fn tanggal(&self) -> NaiveDate {
        self.tanggal
    }

    fn validate(&self) -> ServiceResult<()> {
        self.pasien.validate()?;
        let mut v = Validator::new();
        v.require("keluhan", &self.keluhan);
        v.finish()
    }
}

/// General-visit detail row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct KunjunganDetail {
    pub id: String,
    pub pemeriksaan_id: String,
    pub keluhan: String,
    pub pemeriksaan_fisik: Option<String>,
    pub diagnosa: Option<String>,
    pub terapi: Option<String>,
}

pub struct Kunjungan;

impl ClinicalService for Kunjungan {
    const KIND: ServiceKind = ServiceKind::Kunjungan;

    type Payload = KunjunganPayload;
    type Detail = KunjunganDetail;

    fn soap(payload: &KunjunganPayload) -> SoapNote {
        SoapNote {
            subjektif: format!("Keluhan: {}", payload.keluhan.trim()),
            objektif: or_dash(payload.pemeriksaan_fisik.as_deref()).to_string(),
            analisa: or_dash(payload.diagnosa.as_deref()).to_string(),
            penatalaksanaan: or_dash(payload.terapi.as_deref()).to_string(),
        }
    }

    async fn insert_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &KunjunganPayload,
    ) -> ServiceResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO kunjungan \
             (id, pemeriksaan_id, keluhan, pemeriksaan_fisik, diagnosa, terapi) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(pemeriksaan_id)
        .bind(payload.keluhan.trim())
        .bind(payload.pemeriksaan_fisik.as_deref())
        .bind(payload.diagnosa.as_deref())
        .bind(payload.terapi.as_deref())
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn update_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &KunjunganPayload,
    ) -> ServiceResult<String> {
        let id: String = sqlx::query_scalar("SELECT id FROM kunjungan WHERE pemeriksaan_id = ?")
            .bind(pemeriksaan_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ServiceError::NotFound("kunjungan"))?;

        sqlx::query(
            "UPDATE kunjungan SET keluhan = ?, pemeriksaan_fisik = ?, diagnosa = ?, terapi = ? \
             WHERE id = ?",
        )
        .bind(payload.keluhan.trim())
        .bind(payload.pemeriksaan_fisik.as_deref())
        .bind(payload.diagnosa.as_deref())
        .bind(payload.terapi.as_deref())
        .bind(&id)
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn fetch_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
    ) -> ServiceResult<KunjunganDetail> {
        sqlx::query_as::<_, KunjunganDetail>(
            "SELECT id, pemeriksaan_id, keluhan, pemeriksaan_fisik, diagnosa, terapi \
             FROM kunjungan WHERE pemeriksaan_id = ?",
        )
        .bind(pemeriksaan_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("kunjungan"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> KunjunganPayload {
        KunjunganPayload {
            pasien: PatientInput {
                nama: "Sari".into(),
                nik: None,
                umur: Some(25),
                alamat: None,
                telepon: None,
            },
            tanggal: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            keluhan: "demam 2 hari".into(),
            pemeriksaan_fisik: Some("suhu 38.2 C".into()),
            diagnosa: Some("ISPA ringan".into()),
            terapi: Some("paracetamol 3x500mg".into()),
        }
    }

    #[test]
    fn soap_maps_fields_one_to_one() {
        let soap = Kunjungan::soap(&payload());
        assert_eq!(soap.subjektif, "Keluhan: demam 2 hari");
        assert_eq!(soap.objektif, "suhu 38.2 C");
        assert_eq!(soap.analisa, "ISPA ringan");
        assert_eq!(soap.penatalaksanaan, "paracetamol 3x500mg");
    }

    #[test]
    fn optional_fields_fall_back_to_dash() {
        let mut p = payload();
        p.pemeriksaan_fisik = None;
        p.diagnosa = None;
        p.terapi = None;
        let soap = Kunjungan::soap(&p);
        assert_eq!(soap.objektif, "-");
        assert_eq!(soap.analisa, "-");
        assert_eq!(soap.penatalaksanaan, "-");
    }

    #[test]
    fn blank_complaint_is_rejected() {
        let mut p = payload();
        p.keluhan = " ".into();
        assert!(p.validate().is_err());
    }
}
