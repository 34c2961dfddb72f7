//! Patient identity store.
//!
//! Patients are keyed by an opaque id; the NIK (national identity number)
//! is the dedup key used by [`reconcile_patient`], the find-or-create step
//! every clinical registration runs inside its transaction. Soft delete is
//! a `deleted_at` timestamp; purge flips `is_purged` and releases the NIK
//! for reuse (the unique index only covers non-purged rows).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use bidanku_types::Nik;

use crate::audit::{AuditAction, AuditLog};
use crate::error::{ServiceError, ServiceResult};
use crate::validate::Validator;

const TABLE: &str = "pasien";

/// A patient row as exposed to callers (`is_purged` stays internal; purged
/// rows are never returned).
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Patient {
    pub id: String,
    pub nama: String,
    pub nik: Option<String>,
    pub umur: Option<i64>,
    pub alamat: Option<String>,
    pub telepon: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Demographic payload for creating or updating a patient. Also embedded in
/// every registration payload as the `pasien` sub-object.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, utoipa::ToSchema)]
pub struct PatientInput {
    pub nama: String,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub umur: Option<i64>,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default)]
    pub telepon: Option<String>,
}

impl PatientInput {
    /// Validates the payload: a name is mandatory and the NIK, when present
    /// and non-blank, must be 16 digits.
    pub fn validate(&self) -> ServiceResult<()> {
        let mut v = Validator::new();
        v.require("nama", &self.nama);
        if Nik::parse_opt(self.nik.as_deref()).is_err() {
            v.push("nik", "NIK harus terdiri dari 16 digit angka");
        }
        if let Some(umur) = self.umur {
            if !(0..=130).contains(&umur) {
                v.push("umur", "umur di luar rentang yang masuk akal");
            }
        }
        v.finish()
    }

    /// Returns the normalised NIK; blank input collapses to `None`.
    pub fn normalized_nik(&self) -> ServiceResult<Option<Nik>> {
        Nik::parse_opt(self.nik.as_deref())
            .map_err(|_| ServiceError::invalid("nik", "NIK harus terdiri dari 16 digit angka"))
    }
}

/// Find-or-create step of the registration protocol, running on the
/// caller's transaction so a later failure rolls it back too.
///
/// With a non-blank NIK, an existing non-purged row wins regardless of its
/// soft-delete state, and its mutable demographics (nama, umur, alamat,
/// telepon) are overwritten with the payload values; `deleted_at` is left
/// untouched, so a hidden patient stays hidden until explicitly restored.
/// Without a usable NIK a fresh row is always created.
///
/// The payload is assumed validated; only the NIK format is re-checked
/// because it feeds the lookup.
pub(crate) async fn reconcile_patient(
    conn: &mut SqliteConnection,
    input: &PatientInput,
) -> ServiceResult<String> {
    let now = Utc::now();

    if let Some(nik) = input.normalized_nik()? {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM pasien WHERE nik = ? AND is_purged = 0")
                .bind(nik.as_str())
                .fetch_optional(&mut *conn)
                .await?;

        if let Some(id) = existing {
            sqlx::query(
                "UPDATE pasien SET nama = ?, umur = ?, alamat = ?, telepon = ?, updated_at = ? \
                 WHERE id = ?",
            )
            .bind(input.nama.trim())
            .bind(input.umur)
            .bind(input.alamat.as_deref())
            .bind(input.telepon.as_deref())
            .bind(now)
            .bind(&id)
            .execute(&mut *conn)
            .await?;
            return Ok(id);
        }
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO pasien (id, nama, nik, umur, alamat, telepon, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(input.nama.trim())
    .bind(input.normalized_nik()?.map(|n| n.as_str().to_owned()))
    .bind(input.umur)
    .bind(input.alamat.as_deref())
    .bind(input.telepon.as_deref())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

const SELECT_COLUMNS: &str =
    "id, nama, nik, umur, alamat, telepon, deleted_at, created_at, updated_at";

#[derive(Clone)]
pub struct PatientService {
    pool: SqlitePool,
    audit: AuditLog,
}

impl PatientService {
    pub fn new(pool: SqlitePool, audit: AuditLog) -> Self {
        Self { pool, audit }
    }

    /// Creates a patient directly (outside any registration). A duplicate
    /// NIK among non-purged rows is a conflict.
    pub async fn create(&self, actor: Option<&str>, input: &PatientInput) -> ServiceResult<Patient> {
        input.validate()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO pasien (id, nama, nik, umur, alamat, telepon, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(input.nama.trim())
        .bind(input.normalized_nik()?.map(|n| n.as_str().to_owned()))
        .bind(input.umur)
        .bind(input.alamat.as_deref())
        .bind(input.telepon.as_deref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.audit.record(actor, AuditAction::Create, TABLE, &id).await;
        self.fetch_any(&id).await
    }

    /// Lists live patients, optionally filtered by a name/NIK substring.
    pub async fn list(&self, q: Option<&str>) -> ServiceResult<Vec<Patient>> {
        let rows = match q.map(str::trim).filter(|s| !s.is_empty()) {
            Some(q) => {
                let like = format!("%{q}%");
                sqlx::query_as::<_, Patient>(&format!(
                    "SELECT {SELECT_COLUMNS} FROM pasien \
                     WHERE deleted_at IS NULL AND is_purged = 0 \
                       AND (nama LIKE ? OR nik LIKE ?) \
                     ORDER BY created_at DESC LIMIT 200",
                ))
                .bind(&like)
                .bind(&like)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Patient>(&format!(
                    "SELECT {SELECT_COLUMNS} FROM pasien \
                     WHERE deleted_at IS NULL AND is_purged = 0 \
                     ORDER BY created_at DESC LIMIT 200",
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Fetches one live patient.
    pub async fn get(&self, id: &str) -> ServiceResult<Patient> {
        sqlx::query_as::<_, Patient>(&format!(
            "SELECT {SELECT_COLUMNS} FROM pasien \
             WHERE id = ? AND deleted_at IS NULL AND is_purged = 0",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("pasien"))
    }

    /// The dedicated demographic-edit path: the only place a patient's
    /// fields change outside identity reconciliation.
    pub async fn update(
        &self,
        actor: Option<&str>,
        id: &str,
        input: &PatientInput,
    ) -> ServiceResult<Patient> {
        input.validate()?;
        let done = sqlx::query(
            "UPDATE pasien SET nama = ?, nik = ?, umur = ?, alamat = ?, telepon = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL AND is_purged = 0",
        )
        .bind(input.nama.trim())
        .bind(input.normalized_nik()?.map(|n| n.as_str().to_owned()))
        .bind(input.umur)
        .bind(input.alamat.as_deref())
        .bind(input.telepon.as_deref())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pasien"));
        }

        self.audit.record(actor, AuditAction::Update, TABLE, id).await;
        self.fetch_any(id).await
    }

    /// Hides the patient from default queries. Does not cascade to the
    /// patient's examinations; those become invisible through the owner
    /// filter on the listing side.
    pub async fn soft_delete(&self, actor: Option<&str>, id: &str) -> ServiceResult<()> {
        let done = sqlx::query(
            "UPDATE pasien SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL AND is_purged = 0",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pasien"));
        }
        self.audit.record(actor, AuditAction::Delete, TABLE, id).await;
        Ok(())
    }

    /// Lists soft-deleted (but not purged) patients.
    pub async fn deleted(&self) -> ServiceResult<Vec<Patient>> {
        let rows = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {SELECT_COLUMNS} FROM pasien \
             WHERE deleted_at IS NOT NULL AND is_purged = 0 \
             ORDER BY deleted_at DESC LIMIT 200",
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Restores a soft-deleted patient. Restoring an active or purged row
    /// reports not-found rather than silently succeeding.
    pub async fn restore(&self, actor: Option<&str>, id: &str) -> ServiceResult<()> {
        let done = sqlx::query(
            "UPDATE pasien SET deleted_at = NULL, updated_at = ? \
             WHERE id = ? AND deleted_at IS NOT NULL AND is_purged = 0",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pasien"));
        }
        self.audit.record(actor, AuditAction::Restore, TABLE, id).await;
        Ok(())
    }

    /// Irreversibly removes a soft-deleted patient from every listing and
    /// releases its NIK. Purging an active row is rejected.
    pub async fn purge(&self, actor: Option<&str>, id: &str) -> ServiceResult<()> {
        let done = sqlx::query(
            "UPDATE pasien SET is_purged = 1, updated_at = ? \
             WHERE id = ? AND deleted_at IS NOT NULL AND is_purged = 0",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pasien"));
        }
        self.audit.record(actor, AuditAction::Delete, TABLE, id).await;
        Ok(())
    }

    /// Fetch regardless of soft-delete state (purged rows stay hidden).
    async fn fetch_any(&self, id: &str) -> ServiceResult<Patient> {
        sqlx::query_as::<_, Patient>(&format!(
            "SELECT {SELECT_COLUMNS} FROM pasien WHERE id = ? AND is_purged = 0",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("pasien"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(nama: &str, nik: Option<&str>) -> PatientInput {
        PatientInput {
            nama: nama.into(),
            nik: nik.map(String::from),
            umur: Some(28),
            alamat: Some("Jl. Melati 3".into()),
            telepon: Some("081234567890".into()),
        }
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_nik() {
        let bad = input("  ", Some("123"));
        let err = bad.validate().expect_err("must fail");
        match err {
            ServiceError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn blank_nik_normalises_to_none() {
        let p = input("Siti", Some("   "));
        assert!(p.normalized_nik().unwrap().is_none());
        let p = input("Siti", None);
        assert!(p.normalized_nik().unwrap().is_none());
    }
}
