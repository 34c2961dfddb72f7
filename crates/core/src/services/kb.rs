//! Family planning (KB) service descriptor.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::patients::PatientInput;
use crate::registration::{
    date_or_dash, or_dash, ClinicalService, RegistrationPayload, ServiceKind, SoapNote,
};
use crate::validate::Validator;

/// Registration payload for a family-planning visit.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct KbPayload {
    pub pasien: PatientInput,
    pub tanggal: NaiveDate,
    /// Contraceptive method (suntik, pil, IUD, implan, ...).
    pub metode: String,
    /// Scheduled follow-up date.
    #[serde(default)]
    pub tanggal_kontrol: Option<NaiveDate>,
    #[serde(default)]
    pub keluhan: Option<String>,
}

impl RegistrationPayload for KbPayload {
    fn patient(&self) -> &PatientInput {
        &self.pasien
    }

    fn tanggal(&self) -> NaiveDate {
        self.tanggal
    }

    fn validate(&self) -> ServiceResult<()> {
        self.pasien.validate()?;
        let mut v = Validator::new();
        v.require("metode", &self.metode);
        if let Some(kontrol) = self.tanggal_kontrol {
            if kontrol < self.tanggal {
                v.push("tanggal_kontrol", "tanggal kontrol tidak boleh sebelum tanggal pelayanan");
            }
        }
        v.finish()
    }
}

/// KB detail row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct KbDetail {
    pub id: String,
    pub pemeriksaan_id: String,
    pub metode: String,
    pub tanggal_kontrol: Option<NaiveDate>,
}

pub struct Kb;

impl ClinicalService for Kb {
    const KIND: ServiceKind = ServiceKind::Kb;

    type Payload = KbPayload;
    type Detail = KbDetail;

    fn soap(payload: &KbPayload) -> SoapNote {
        SoapNote {
            subjektif: format!("Pelayanan KB. Keluhan: {}", or_dash(payload.keluhan.as_deref())),
            objektif: format!("Metode kontrasepsi: {}", payload.metode.trim()),
            analisa: "Akseptor KB aktif".to_string(),
            penatalaksanaan: format!(
                "Pelayanan kontrasepsi diberikan. Kontrol ulang: {}",
                date_or_dash(payload.tanggal_kontrol)
            ),
        }
    }

    async fn insert_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &KbPayload,
    ) -> ServiceResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO kb (id, pemeriksaan_id, metode, tanggal_kontrol) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(pemeriksaan_id)
        .bind(payload.metode.trim())
        .bind(payload.tanggal_kontrol)
        .execute(&mut *conn)
        .await?;
        Ok(id)
    }

    async fn update_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &KbPayload,
    ) -> ServiceResult<String> {
        let id: String = sqlx::query_scalar("SELECT id FROM kb WHERE pemeriksaan_id = ?")
            .bind(pemeriksaan_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ServiceError::NotFound("kb"))?;

        sqlx::query("UPDATE kb SET metode = ?, tanggal_kontrol = ? WHERE id = ?")
            .bind(payload.metode.trim())
            .bind(payload.tanggal_kontrol)
            .bind(&id)
            .execute(&mut *conn)
            .await?;
        Ok(id)
    }

    async fn fetch_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
    ) -> ServiceResult<KbDetail> {
        sqlx::query_as::<_, KbDetail>(
            "SELECT id, pemeriksaan_id, metode, tanggal_kontrol FROM kb WHERE pemeriksaan_id = ?",
        )
        .bind(pemeriksaan_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("kb"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> KbPayload {
        KbPayload {
            pasien: PatientInput {
                nama: "Rina".into(),
                nik: None,
                umur: Some(31),
                alamat: None,
                telepon: None,
            },
            tanggal: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            metode: "suntik 3 bulan".into(),
            tanggal_kontrol: NaiveDate::from_ymd_opt(2026, 5, 2),
            keluhan: None,
        }
    }

    #[test]
    fn soap_carries_method_and_follow_up() {
        let soap = Kb::soap(&payload());
        assert_eq!(soap.subjektif, "Pelayanan KB. Keluhan: -");
        assert_eq!(soap.objektif, "Metode kontrasepsi: suntik 3 bulan");
        assert_eq!(
            soap.penatalaksanaan,
            "Pelayanan kontrasepsi diberikan. Kontrol ulang: 02-05-2026"
        );
    }

    #[test]
    fn blank_method_is_rejected() {
        let mut p = payload();
        p.metode = "  ".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn follow_up_before_visit_is_rejected() {
        let mut p = payload();
        p.tanggal_kontrol = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(p.validate().is_err());
    }
}
