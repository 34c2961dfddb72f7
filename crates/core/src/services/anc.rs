//! Antenatal care (ANC) service descriptor.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::patients::PatientInput;
use crate::registration::{
    date_or_dash, or_dash, ClinicalService, RegistrationPayload, ServiceKind, SoapNote,
};
use crate::validate::Validator;

/// Registration payload for an ANC visit.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct AncPayload {
    /// Demographics of the expecting mother.
    pub pasien: PatientInput,
    /// Visit date.
    pub tanggal: NaiveDate,
    /// Last menstrual period.
    #[serde(default)]
    pub hpht: Option<NaiveDate>,
    /// Estimated due date.
    #[serde(default)]
    pub hpl: Option<NaiveDate>,
    #[serde(default)]
    pub nama_suami: Option<String>,
    #[serde(default)]
    pub telepon_suami: Option<String>,
    /// Free-text findings of the physical examination.
    #[serde(default)]
    pub hasil_pemeriksaan: Option<String>,
}

impl RegistrationPayload for AncPayload {
    fn patient(&self) -> &PatientInput {
        &self.pasien
    }

    fn tanggal(&self) -> NaiveDate {
        self.tanggal
    }

    fn validate(&self) -> ServiceResult<()> {
        self.pasien.validate()?;
        let mut v = Validator::new();
        if let (Some(hpht), Some(hpl)) = (self.hpht, self.hpl) {
            if hpl < hpht {
                v.push("hpl", "HPL tidak boleh sebelum HPHT");
            }
        }
        v.finish()
    }
}

/// ANC detail row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AncDetail {
    pub id: String,
    pub pemeriksaan_id: String,
    pub hpht: Option<NaiveDate>,
    pub hpl: Option<NaiveDate>,
    pub nama_suami: Option<String>,
    pub telepon_suami: Option<String>,
    pub hasil_pemeriksaan: Option<String>,
}

pub struct Anc;

impl ClinicalService for Anc {
    const KIND: ServiceKind = ServiceKind::Anc;

    type Payload = AncPayload;
    type Detail = AncDetail;

    fn soap(payload: &AncPayload) -> SoapNote {
        SoapNote {
            subjektif: format!(
                "Kunjungan ANC. HPHT: {}, HPL: {}",
                date_or_dash(payload.hpht),
                date_or_dash(payload.hpl)
            ),
            objektif: format!(
                "Hasil pemeriksaan: {}",
                or_dash(payload.hasil_pemeriksaan.as_deref())
            ),
            analisa: "Kehamilan dalam pemantauan rutin".to_string(),
            penatalaksanaan: "Edukasi ibu hamil, kontrol ulang sesuai jadwal".to_string(),
        }
    }

    async fn insert_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &AncPayload,
    ) -> ServiceResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO anc \
             (id, pemeriksaan_id, hpht, hpl, nama_suami, telepon_suami, hasil_pemeriksaan) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(pemeriksaan_id)
        .bind(payload.hpht)
        .bind(payload.hpl)
        .bind(payload.nama_suami.as_deref())
        .bind(payload.telepon_suami.as_deref())
        .bind(payload.hasil_pemeriksaan.as_deref())
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn update_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &AncPayload,
    ) -> ServiceResult<String> {
        let id: String = sqlx::query_scalar("SELECT id FROM anc WHERE pemeriksaan_id = ?")
            .bind(pemeriksaan_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ServiceError::NotFound("anc"))?;

        sqlx::query(
            "UPDATE anc SET hpht = ?, hpl = ?, nama_suami = ?, telepon_suami = ?, \
             hasil_pemeriksaan = ? WHERE id = ?",
        )
        .bind(payload.hpht)
        .bind(payload.hpl)
        .bind(payload.nama_suami.as_deref())
        .bind(payload.telepon_suami.as_deref())
        .bind(payload.hasil_pemeriksaan.as_deref())
        .bind(&id)
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn fetch_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
    ) -> ServiceResult<AncDetail> {
        sqlx::query_as::<_, AncDetail>(
            "SELECT id, pemeriksaan_id, hpht, hpl, nama_suami, telepon_suami, hasil_pemeriksaan \
             FROM anc WHERE pemeriksaan_id = ?",
        )
        .bind(pemeriksaan_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("anc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> AncPayload {
        AncPayload {
            pasien: PatientInput {
                nama: "Siti Aminah".into(),
                nik: Some("3201234567890001".into()),
                umur: Some(27),
                alamat: None,
                telepon: None,
            },
            tanggal: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            hpht: NaiveDate::from_ymd_opt(2025, 12, 1),
            hpl: NaiveDate::from_ymd_opt(2026, 9, 7),
            nama_suami: Some("Budi".into()),
            telepon_suami: None,
            hasil_pemeriksaan: Some("TD 110/70, DJJ 140x/menit".into()),
        }
    }

    #[test]
    fn soap_renders_dates_and_findings() {
        let soap = Anc::soap(&payload());
        assert_eq!(soap.subjektif, "Kunjungan ANC. HPHT: 01-12-2025, HPL: 07-09-2026");
        assert_eq!(soap.objektif, "Hasil pemeriksaan: TD 110/70, DJJ 140x/menit");
    }

    #[test]
    fn soap_uses_dash_for_missing_fields() {
        let mut p = payload();
        p.hpht = None;
        p.hpl = None;
        p.hasil_pemeriksaan = None;
        let soap = Anc::soap(&p);
        assert_eq!(soap.subjektif, "Kunjungan ANC. HPHT: -, HPL: -");
        assert_eq!(soap.objektif, "Hasil pemeriksaan: -");
    }

    #[test]
    fn due_date_before_lmp_is_rejected() {
        let mut p = payload();
        p.hpl = NaiveDate::from_ymd_opt(2025, 11, 1);
        assert!(p.validate().is_err());
    }
}
