//! Appointment schedules (`jadwal`).
//!
//! Schedules reference a patient and a staff member but are deliberately
//! not linked to registrations: booking and recording an encounter are
//! independent operations.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLog};
use crate::error::{ServiceError, ServiceResult};
use crate::validate::Validator;

const TABLE: &str = "jadwal";

/// Allowed schedule states.
const STATUSES: &[&str] = &["terjadwal", "selesai", "batal"];

/// One appointment, joined with the patient and staff names for display.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Schedule {
    pub id: String,
    pub pasien_id: String,
    pub nama_pasien: String,
    pub petugas_id: String,
    pub nama_petugas: String,
    pub tanggal: NaiveDate,
    pub jam: String,
    pub keperluan: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing an appointment.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct ScheduleInput {
    pub pasien_id: String,
    pub petugas_id: String,
    pub tanggal: NaiveDate,
    /// Appointment time, `HH:MM:SS`.
    pub jam: String,
    pub keperluan: String,
    /// One of `terjadwal`, `selesai`, `batal`; defaults to `terjadwal`.
    #[serde(default)]
    pub status: Option<String>,
}

impl ScheduleInput {
    fn validate(&self) -> ServiceResult<()> {
        let mut v = Validator::new();
        v.require("pasien_id", &self.pasien_id);
        v.require("petugas_id", &self.petugas_id);
        v.require("keperluan", &self.keperluan);
        v.time_format("jam", Some(&self.jam));
        if let Some(status) = self.status.as_deref() {
            if !STATUSES.contains(&status) {
                v.push("status", "status harus terjadwal, selesai, atau batal");
            }
        }
        v.finish()
    }

    fn status_or_default(&self) -> &str {
        self.status.as_deref().unwrap_or("terjadwal")
    }
}

const SELECT: &str = "SELECT j.id, j.pasien_id, p.nama AS nama_pasien, j.petugas_id, \
     u.nama AS nama_petugas, j.tanggal, j.jam, j.keperluan, j.status, j.created_at, j.updated_at \
     FROM jadwal j \
     JOIN pasien p ON p.id = j.pasien_id \
     JOIN users u ON u.id = j.petugas_id";

#[derive(Clone)]
pub struct ScheduleService {
    pool: SqlitePool,
    audit: AuditLog,
}

impl ScheduleService {
    pub fn new(pool: SqlitePool, audit: AuditLog) -> Self {
        Self { pool, audit }
    }

    pub async fn create(
        &self,
        actor: Option<&str>,
        input: &ScheduleInput,
    ) -> ServiceResult<Schedule> {
        input.validate()?;
        self.ensure_references(input).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO jadwal \
             (id, pasien_id, petugas_id, tanggal, jam, keperluan, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(input.pasien_id.trim())
        .bind(input.petugas_id.trim())
        .bind(input.tanggal)
        .bind(input.jam.trim())
        .bind(input.keperluan.trim())
        .bind(input.status_or_default())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.audit.record(actor, AuditAction::Create, TABLE, &id).await;
        self.get(&id).await
    }

    /// Lists appointments, optionally narrowed to one date or one patient.
    pub async fn list(
        &self,
        tanggal: Option<NaiveDate>,
        pasien_id: Option<&str>,
    ) -> ServiceResult<Vec<Schedule>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!("{SELECT} WHERE 1 = 1"));
        if let Some(tanggal) = tanggal {
            qb.push(" AND j.tanggal = ").push_bind(tanggal);
        }
        if let Some(pasien_id) = pasien_id {
            qb.push(" AND j.pasien_id = ").push_bind(pasien_id.to_owned());
        }
        qb.push(" ORDER BY j.tanggal, j.jam LIMIT 200");

        let rows = qb
            .build_query_as::<Schedule>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Schedule> {
        sqlx::query_as::<_, Schedule>(&format!("{SELECT} WHERE j.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("jadwal"))
    }

    pub async fn update(
        &self,
        actor: Option<&str>,
        id: &str,
        input: &ScheduleInput,
    ) -> ServiceResult<Schedule> {
        input.validate()?;
        self.ensure_references(input).await?;

        let done = sqlx::query(
            "UPDATE jadwal SET pasien_id = ?, petugas_id = ?, tanggal = ?, jam = ?, \
             keperluan = ?, status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(input.pasien_id.trim())
        .bind(input.petugas_id.trim())
        .bind(input.tanggal)
        .bind(input.jam.trim())
        .bind(input.keperluan.trim())
        .bind(input.status_or_default())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("jadwal"));
        }
        self.audit.record(actor, AuditAction::Update, TABLE, id).await;
        self.get(id).await
    }

    pub async fn delete(&self, actor: Option<&str>, id: &str) -> ServiceResult<()> {
        let done = sqlx::query("DELETE FROM jadwal WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("jadwal"));
        }
        self.audit.record(actor, AuditAction::Delete, TABLE, id).await;
        Ok(())
    }

    /// Appointments may only reference live patients and existing staff.
    async fn ensure_references(&self, input: &ScheduleInput) -> ServiceResult<()> {
        let pasien: Option<String> = sqlx::query_scalar(
            "SELECT id FROM pasien WHERE id = ? AND deleted_at IS NULL AND is_purged = 0",
        )
        .bind(input.pasien_id.trim())
        .fetch_optional(&self.pool)
        .await?;
        if pasien.is_none() {
            return Err(ServiceError::NotFound("pasien"));
        }

        let petugas: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(input.petugas_id.trim())
            .fetch_optional(&self.pool)
            .await?;
        if petugas.is_none() {
            return Err(ServiceError::NotFound("petugas"));
        }
        Ok(())
    }
}
