//! The shared write path for clinical encounters.
//!
//! Every service type (ANC, KB, imunisasi, persalinan, kunjungan) records an
//! encounter the same way: resolve the patient by NIK, write one
//! `pemeriksaan` row carrying the SOAP note, write one service-specific
//! detail row, commit, then append an audit entry. The five variants differ
//! only in their payload shape, their SOAP templates and their detail
//! table, so the protocol is implemented once here and parameterised by a
//! [`ClinicalService`] descriptor.
//!
//! All statements of one operation run on a single [`sqlx::Transaction`];
//! its drop guard rolls back on any early return, so no partial
//! examination/detail pair can ever be observed.

use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLog};
use crate::error::{ServiceError, ServiceResult};
use crate::patients::{self, Patient, PatientInput};

/// Service-type discriminator stored on every `pemeriksaan` row. The string
/// form doubles as the detail table name and the audit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Anc,
    Kb,
    Imunisasi,
    Persalinan,
    Kunjungan,
}

impl ServiceKind {
    /// Detail table name, also used as the `jenis` discriminator value.
    pub fn table(self) -> &'static str {
        match self {
            ServiceKind::Anc => "anc",
            ServiceKind::Kb => "kb",
            ServiceKind::Imunisasi => "imunisasi",
            ServiceKind::Persalinan => "persalinan",
            ServiceKind::Kunjungan => "kunjungan",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// The four free-text clinical note fields attached to every examination.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct SoapNote {
    pub subjektif: String,
    pub objektif: String,
    pub analisa: String,
    pub penatalaksanaan: String,
}

/// Renders an optional free-text field for a SOAP template; blank input
/// becomes the placeholder dash.
pub(crate) fn or_dash(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

/// Renders an optional date for a SOAP template.
pub(crate) fn date_or_dash(value: Option<NaiveDate>) -> String {
    match value {
        Some(d) => d.format("%d-%m-%Y").to_string(),
        None => "-".to_string(),
    }
}

/// Renders an optional numeric measurement for a SOAP template.
pub(crate) fn num_or_dash(value: Option<f64>) -> String {
    match value {
        Some(n) => format!("{n}"),
        None => "-".to_string(),
    }
}

/// One clinical encounter (`pemeriksaan` row).
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Examination {
    pub id: String,
    pub pasien_id: String,
    pub jenis: String,
    pub subjektif: String,
    pub objektif: String,
    pub analisa: String,
    pub penatalaksanaan: String,
    pub tanggal: NaiveDate,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload contract shared by all registration payloads.
pub trait RegistrationPayload {
    /// The embedded patient demographics.
    fn patient(&self) -> &PatientInput;
    /// Encounter date.
    fn tanggal(&self) -> NaiveDate;
    /// Full payload validation; must pass before any database write.
    fn validate(&self) -> ServiceResult<()>;
}

/// Per-service descriptor: payload shape, SOAP templates and detail-table
/// statements. Implemented by the unit types in [`crate::services`].
pub trait ClinicalService: Send + Sync + 'static {
    const KIND: ServiceKind;

    type Payload: RegistrationPayload + serde::de::DeserializeOwned + serde::Serialize + Send + Sync + 'static;
    type Detail: serde::Serialize + Send + Unpin + 'static;

    /// Derives the SOAP note from the structured payload fields.
    fn soap(payload: &Self::Payload) -> SoapNote;

    /// Inserts the detail row for a new examination; returns the detail id.
    fn insert_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &Self::Payload,
    ) -> impl std::future::Future<Output = ServiceResult<String>> + Send;

    /// Overwrites the detail row of an existing examination; returns the
    /// detail id, or not-found when the examination has no detail row.
    fn update_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
        payload: &Self::Payload,
    ) -> impl std::future::Future<Output = ServiceResult<String>> + Send;

    /// Fetches the detail row of an examination.
    fn fetch_detail(
        conn: &mut SqliteConnection,
        pemeriksaan_id: &str,
    ) -> impl std::future::Future<Output = ServiceResult<Self::Detail>> + Send;
}

/// Ids produced by a successful registration.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct RegistrationOutcome {
    pub pasien_id: String,
    pub pemeriksaan_id: String,
    pub detail_id: String,
}

/// One encounter joined with its owner and detail row, as returned by the
/// read paths.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EncounterRecord<T> {
    pub pemeriksaan: Examination,
    pub pasien: Patient,
    pub detail: T,
}

/// The generic registration/read/lifecycle service, instantiated once per
/// [`ClinicalService`].
pub struct RegistrationService<S> {
    pool: SqlitePool,
    audit: AuditLog,
    _marker: PhantomData<S>,
}

impl<S> Clone for RegistrationService<S> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            audit: self.audit.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S: ClinicalService> RegistrationService<S> {
    pub fn new(pool: SqlitePool, audit: AuditLog) -> Self {
        Self {
            pool,
            audit,
            _marker: PhantomData,
        }
    }

    /// Records a new encounter: validate, then atomically reconcile the
    /// patient, insert the examination and its detail row, and finally
    /// append the audit entry outside the transaction.
    pub async fn register(
        &self,
        actor: Option<&str>,
        payload: &S::Payload,
    ) -> ServiceResult<RegistrationOutcome> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        let pasien_id = patients::reconcile_patient(&mut *tx, payload.patient()).await?;
        let soap = S::soap(payload);
        let pemeriksaan_id =
            insert_examination(&mut *tx, &pasien_id, S::KIND, &soap, payload.tanggal()).await?;
        let detail_id = S::insert_detail(&mut *tx, &pemeriksaan_id, payload).await?;

        tx.commit().await?;

        self.audit
            .record(actor, AuditAction::Create, S::KIND.table(), &detail_id)
            .await;

        Ok(RegistrationOutcome {
            pasien_id,
            pemeriksaan_id,
            detail_id,
        })
    }

    /// Replaces the SOAP note and detail fields of an existing encounter.
    /// Patient demographics are deliberately untouched; demographic edits go
    /// through the dedicated patient endpoint.
    pub async fn update(
        &self,
        actor: Option<&str>,
        pemeriksaan_id: &str,
        payload: &S::Payload,
    ) -> ServiceResult<()> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        let soap = S::soap(payload);
        update_examination(&mut *tx, pemeriksaan_id, S::KIND, &soap, payload.tanggal()).await?;
        let detail_id = S::update_detail(&mut *tx, pemeriksaan_id, payload).await?;

        tx.commit().await?;

        self.audit
            .record(actor, AuditAction::Update, S::KIND.table(), &detail_id)
            .await;

        Ok(())
    }

    /// Fetches one live encounter. Soft-deleted examinations and encounters
    /// of soft-deleted patients report not-found.
    pub async fn get(&self, pemeriksaan_id: &str) -> ServiceResult<EncounterRecord<S::Detail>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, JoinedRow>(&format!(
            "SELECT {JOINED_COLUMNS} \
             FROM pemeriksaan e JOIN pasien p ON p.id = e.pasien_id \
             WHERE e.id = ? AND e.jenis = ? \
               AND e.deleted_at IS NULL AND e.is_purged = 0 \
               AND p.deleted_at IS NULL AND p.is_purged = 0",
        ))
        .bind(pemeriksaan_id)
        .bind(S::KIND.table())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::NotFound("pemeriksaan"))?;

        let detail = S::fetch_detail(&mut *conn, pemeriksaan_id).await?;
        let (pemeriksaan, pasien) = row.split();
        Ok(EncounterRecord {
            pemeriksaan,
            pasien,
            detail,
        })
    }

    /// Lists live encounters of this service type, newest first, optionally
    /// filtered by a patient-name substring and/or an exact NIK.
    pub async fn list(
        &self,
        q: Option<&str>,
        nik: Option<&str>,
    ) -> ServiceResult<Vec<EncounterRecord<S::Detail>>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT {JOINED_COLUMNS} \
             FROM pemeriksaan e JOIN pasien p ON p.id = e.pasien_id \
             WHERE e.jenis = ",
        ));
        qb.push_bind(S::KIND.table());
        qb.push(
            " AND e.deleted_at IS NULL AND e.is_purged = 0 \
              AND p.deleted_at IS NULL AND p.is_purged = 0",
        );

        if let Some(q) = q.map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND p.nama LIKE ").push_bind(format!("%{q}%"));
        }
        if let Some(nik) = nik.map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND p.nik = ").push_bind(nik.to_owned());
        }

        qb.push(" ORDER BY e.tanggal DESC, e.created_at DESC LIMIT 200");

        self.collect(qb).await
    }

    /// Lists soft-deleted (but not purged) encounters of this service type.
    pub async fn deleted(&self) -> ServiceResult<Vec<EncounterRecord<S::Detail>>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT {JOINED_COLUMNS} \
             FROM pemeriksaan e JOIN pasien p ON p.id = e.pasien_id \
             WHERE e.jenis = ",
        ));
        qb.push_bind(S::KIND.table());
        qb.push(
            " AND e.deleted_at IS NOT NULL AND e.is_purged = 0 \
              AND p.deleted_at IS NULL AND p.is_purged = 0 \
              ORDER BY e.deleted_at DESC LIMIT 200",
        );

        self.collect(qb).await
    }

    async fn collect(
        &self,
        mut qb: sqlx::QueryBuilder<'_, sqlx::Sqlite>,
    ) -> ServiceResult<Vec<EncounterRecord<S::Detail>>> {
        let mut conn = self.pool.acquire().await?;

        let rows = qb
            .build_query_as::<JoinedRow>()
            .fetch_all(&mut *conn)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let (pemeriksaan, pasien) = row.split();
            let detail = S::fetch_detail(&mut *conn, &pemeriksaan.id).await?;
            records.push(EncounterRecord {
                pemeriksaan,
                pasien,
                detail,
            });
        }
        Ok(records)
    }

    /// Hides an encounter: `Active -> SoftDeleted`. Reports not-found when
    /// the row is absent, already deleted, or purged.
    pub async fn soft_delete(&self, actor: Option<&str>, pemeriksaan_id: &str) -> ServiceResult<()> {
        let done = sqlx::query(
            "UPDATE pemeriksaan SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND jenis = ? AND deleted_at IS NULL AND is_purged = 0",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(pemeriksaan_id)
        .bind(S::KIND.table())
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pemeriksaan"));
        }
        self.audit
            .record(actor, AuditAction::Delete, S::KIND.table(), pemeriksaan_id)
            .await;
        Ok(())
    }

    /// `SoftDeleted -> Active`. Restoring an active or purged row reports
    /// not-found, making restore idempotent in effect.
    pub async fn restore(&self, actor: Option<&str>, pemeriksaan_id: &str) -> ServiceResult<()> {
        let done = sqlx::query(
            "UPDATE pemeriksaan SET deleted_at = NULL, updated_at = ? \
             WHERE id = ? AND jenis = ? AND deleted_at IS NOT NULL AND is_purged = 0",
        )
        .bind(Utc::now())
        .bind(pemeriksaan_id)
        .bind(S::KIND.table())
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pemeriksaan"));
        }
        self.audit
            .record(actor, AuditAction::Restore, S::KIND.table(), pemeriksaan_id)
            .await;
        Ok(())
    }

    /// `SoftDeleted -> Purged` (terminal). Purge requires a prior soft
    /// delete; the detail row follows its examination and the pair never
    /// reappears in any listing.
    pub async fn purge(&self, actor: Option<&str>, pemeriksaan_id: &str) -> ServiceResult<()> {
        let done = sqlx::query(
            "UPDATE pemeriksaan SET is_purged = 1, updated_at = ? \
             WHERE id = ? AND jenis = ? AND deleted_at IS NOT NULL AND is_purged = 0",
        )
        .bind(Utc::now())
        .bind(pemeriksaan_id)
        .bind(S::KIND.table())
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("pemeriksaan"));
        }
        self.audit
            .record(actor, AuditAction::Delete, S::KIND.table(), pemeriksaan_id)
            .await;
        Ok(())
    }
}

/// Inserts the parent `pemeriksaan` row; returns its id.
async fn insert_examination(
    conn: &mut SqliteConnection,
    pasien_id: &str,
    kind: ServiceKind,
    soap: &SoapNote,
    tanggal: NaiveDate,
) -> ServiceResult<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO pemeriksaan \
         (id, pasien_id, jenis, subjektif, objektif, analisa, penatalaksanaan, tanggal, \
          created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(pasien_id)
    .bind(kind.table())
    .bind(&soap.subjektif)
    .bind(&soap.objektif)
    .bind(&soap.analisa)
    .bind(&soap.penatalaksanaan)
    .bind(tanggal)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Overwrites the SOAP fields and date of an existing, non-purged
/// examination of the given kind.
async fn update_examination(
    conn: &mut SqliteConnection,
    pemeriksaan_id: &str,
    kind: ServiceKind,
    soap: &SoapNote,
    tanggal: NaiveDate,
) -> ServiceResult<()> {
    let done = sqlx::query(
        "UPDATE pemeriksaan \
         SET subjektif = ?, objektif = ?, analisa = ?, penatalaksanaan = ?, tanggal = ?, \
             updated_at = ? \
         WHERE id = ? AND jenis = ? AND is_purged = 0",
    )
    .bind(&soap.subjektif)
    .bind(&soap.objektif)
    .bind(&soap.analisa)
    .bind(&soap.penatalaksanaan)
    .bind(tanggal)
    .bind(Utc::now())
    .bind(pemeriksaan_id)
    .bind(kind.table())
    .execute(&mut *conn)
    .await?;

    if done.rows_affected() == 0 {
        return Err(ServiceError::NotFound("pemeriksaan"));
    }
    Ok(())
}

const JOINED_COLUMNS: &str = "e.id, e.pasien_id, e.jenis, e.subjektif, e.objektif, e.analisa, \
     e.penatalaksanaan, e.tanggal, e.deleted_at, e.created_at, e.updated_at, \
     p.id AS p_id, p.nama AS p_nama, p.nik AS p_nik, p.umur AS p_umur, \
     p.alamat AS p_alamat, p.telepon AS p_telepon, p.deleted_at AS p_deleted_at, \
     p.created_at AS p_created_at, p.updated_at AS p_updated_at";

/// Flat row produced by the examination/patient join.
#[derive(sqlx::FromRow)]
struct JoinedRow {
    id: String,
    pasien_id: String,
    jenis: String,
    subjektif: String,
    objektif: String,
    analisa: String,
    penatalaksanaan: String,
    tanggal: NaiveDate,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    p_id: String,
    p_nama: String,
    p_nik: Option<String>,
    p_umur: Option<i64>,
    p_alamat: Option<String>,
    p_telepon: Option<String>,
    p_deleted_at: Option<DateTime<Utc>>,
    p_created_at: DateTime<Utc>,
    p_updated_at: DateTime<Utc>,
}

impl JoinedRow {
    fn split(self) -> (Examination, Patient) {
        (
            Examination {
                id: self.id,
                pasien_id: self.pasien_id,
                jenis: self.jenis,
                subjektif: self.subjektif,
                objektif: self.objektif,
                analisa: self.analisa,
                penatalaksanaan: self.penatalaksanaan,
                tanggal: self.tanggal,
                deleted_at: self.deleted_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            Patient {
                id: self.p_id,
                nama: self.p_nama,
                nik: self.p_nik,
                umur: self.p_umur,
                alamat: self.p_alamat,
                telepon: self.p_telepon,
                deleted_at: self.p_deleted_at,
                created_at: self.p_created_at,
                updated_at: self.p_updated_at,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_placeholders() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("   ")), "-");
        assert_eq!(or_dash(Some(" mual ")), "mual");
        assert_eq!(date_or_dash(None), "-");
        assert_eq!(
            date_or_dash(NaiveDate::from_ymd_opt(2026, 1, 15)),
            "15-01-2026"
        );
        assert_eq!(num_or_dash(None), "-");
        assert_eq!(num_or_dash(Some(3.5)), "3.5");
    }

    #[test]
    fn kind_table_names_match_discriminator() {
        assert_eq!(ServiceKind::Anc.table(), "anc");
        assert_eq!(ServiceKind::Kb.table(), "kb");
        assert_eq!(ServiceKind::Imunisasi.table(), "imunisasi");
        assert_eq!(ServiceKind::Persalinan.table(), "persalinan");
        assert_eq!(ServiceKind::Kunjungan.table(), "kunjungan");
    }
}
