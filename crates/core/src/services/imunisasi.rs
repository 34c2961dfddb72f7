//! Immunization service descriptor.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::patients::PatientInput;
use crate::registration::{
    date_or_dash, num_or_dash, ClinicalService, RegistrationPayload, ServiceKind, SoapNote,
};
use crate::validate::Validator;

/// Registration payload for an immunization visit. The `pasien` sub-object
/// carries the infant's demographics.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct ImunisasiPayload {
    pub pasien: PatientInput,
    pub tanggal: NaiveDate,
    /// Vaccine administered (BCG, DPT-HB-Hib, polio, campak, ...).
    pub jenis_imunisasi: String,
    /// Infant weight in kilograms.
    #[serde(default)]
    pub berat_badan: Option<f64>,
    /// Infant length in centimetres.
    #[serde(default)]
    pub tinggi_badan: Option<f64>,
    /// Scheduled date of the next dose.
    #[serde(default)]
    pub jadwal_selanjutnya: Option<NaiveDate>,
}

impl RegistrationPayload for ImunisasiPayload {
    fn patient(&self) -> &PatientInput {
        &self.pasien
    }

    fn tanggal(&self) -> NaiveDate {
        self.tanggal
    }

    fn validate(&self) -> ServiceResult<()> {
        self.pasien.validate()?;
        let mut v = Validator::new();
        v.require("jenis_imunisasi", &self.jenis_imunisasi);
        v.positive("berat_badan", self.berat_badan);
        v.positive("tinggi_badan", self.tinggi_badan);
        v.finish()
    }
}

/// Immunization detail row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct ImunisasiDetail {
    pub id: String,
    pub pemeriksaan_id: String,
    pub jenis_imunisasi: String,
    pub berat_badan: Option<f64>,
    pub tinggi_badan: Option<f64>,
    pub jadwal_selanjutnya: Option<NaiveDate>,
}

pub struct Imunisasi;

impl ClinicalService for Imunisasi {
    const KIND: ServiceKind = ServiceKind::Imunisasi;

    type Payload = ImunisasiPayload;
    type Detail = ImunisasiDetail;

    fn soap(payload: &ImunisasiPayload) -> SoapNote {
        SoapNote {
            subjektif: format!("Imunisasi {}", payload.jenis_imunisasi.trim()),
            objektif: format!(
                "BB: {} kg, TB: {} cm",
                num_or_dash(payload.berat_badan),
                num_or_dash(payload.tinggi_badan)
            ),
            analisa: "Kondisi bayi baik, layak imunisasi".to_string(),
            penatalaksanaan: format!(
                "Imunisasi {} diberikan. Jadwal berikutnya: {}",
                payload.jenis_imunisasi.trim(),
                date_or_dash(payload.jadwal_selanjutnya)
            ),
        }
    }

    async fn insert_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &ImunisasiPayload,
    ) -> ServiceResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO imunisasi \
             (id, pemeriksaan_id, jenis_imunisasi, berat_badan, tinggi_badan, jadwal_selanjutnya) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(pemeriksaan_id)
        .bind(payload.jenis_imunisasi.trim())
        .bind(payload.berat_badan)
        .bind(payload.tinggi_badan)
        .bind(payload.jadwal_selanjutnya)
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn update_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &ImunisasiPayload,
    ) -> ServiceResult<String> {
        let id: String = sqlx::query_scalar("SELECT id FROM imunisasi WHERE pemeriksaan_id = ?")
            .bind(pemeriksaan_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ServiceError::NotFound("imunisasi"))?;

        sqlx::query(
            "UPDATE imunisasi SET jenis_imunisasi = ?, berat_badan = ?, tinggi_badan = ?, \
             jadwal_selanjutnya = ? WHERE id = ?",
        )
        .bind(payload.jenis_imunisasi.trim())
        .bind(payload.berat_badan)
        .bind(payload.tinggi_badan)
        .bind(payload.jadwal_selanjutnya)
        .bind(&id)
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn fetch_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
    ) -> ServiceResult<ImunisasiDetail> {
        sqlx::query_as::<_, ImunisasiDetail>(
            "SELECT id, pemeriksaan_id, jenis_imunisasi, berat_badan, tinggi_badan, \
             jadwal_selanjutnya FROM imunisasi WHERE pemeriksaan_id = ?",
        )
        .bind(pemeriksaan_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("imunisasi"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImunisasiPayload {
        ImunisasiPayload {
            pasien: PatientInput {
                nama: "Bayi Ani".into(),
                nik: None,
                umur: Some(0),
                alamat: None,
                telepon: None,
            },
            tanggal: NaiveDate::from_ymd_opt(2026, 4, 20).unwrap(),
            jenis_imunisasi: "BCG".into(),
            berat_badan: Some(4.1),
            tinggi_badan: Some(54.0),
            jadwal_selanjutnya: NaiveDate::from_ymd_opt(2026, 5, 20),
        }
    }

    #[test]
    fn soap_reports_vaccine_and_measurements() {
        let soap = Imunisasi::soap(&payload());
        assert_eq!(soap.subjektif, "Imunisasi BCG");
        assert_eq!(soap.objektif, "BB: 4.1 kg, TB: 54 cm");
        assert_eq!(
            soap.penatalaksanaan,
            "Imunisasi BCG diberikan. Jadwal berikutnya: 20-05-2026"
        );
    }

    #[test]
    fn missing_vaccine_type_is_rejected() {
        let mut p = payload();
        p.jenis_imunisasi = "".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn non_positive_measurements_are_rejected() {
        let mut p = payload();
        p.berat_badan = Some(0.0);
        assert!(p.validate().is_err());
    }
}
