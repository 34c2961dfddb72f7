//! Read-only reporting projections and `laporan` snapshots.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLog};
use crate::error::{ServiceError, ServiceResult};
use crate::registration::ServiceKind;

/// Encounter counts per service type for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct ServiceCounts {
    pub anc: i64,
    pub kb: i64,
    pub imunisasi: i64,
    pub persalinan: i64,
    pub kunjungan: i64,
}

/// A stored report snapshot (`laporan` row).
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Laporan {
    pub id: String,
    pub periode: String,
    pub jumlah_anc: i64,
    pub jumlah_kb: i64,
    pub jumlah_imunisasi: i64,
    pub jumlah_persalinan: i64,
    pub jumlah_kunjungan: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validates a `YYYY-MM` period string.
fn validate_periode(periode: &str) -> ServiceResult<()> {
    let b = periode.as_bytes();
    let ok = b.len() == 7
        && b[4] == b'-'
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[5..].iter().all(u8::is_ascii_digit)
        && matches!((b[5] - b'0') * 10 + (b[6] - b'0'), 1..=12);

    if ok {
        Ok(())
    } else {
        Err(ServiceError::invalid(
            "periode",
            "periode harus berformat YYYY-MM",
        ))
    }
}

#[derive(Clone)]
pub struct ReportService {
    pool: SqlitePool,
    audit: AuditLog,
}

impl ReportService {
    pub fn new(pool: SqlitePool, audit: AuditLog) -> Self {
        Self { pool, audit }
    }

    /// Live aggregation: counts visible encounters per service type within
    /// the given `YYYY-MM` period. Soft-deleted and purged encounters, and
    /// encounters of hidden patients, are excluded.
    pub async fn summary(&self, periode: &str) -> ServiceResult<ServiceCounts> {
        validate_periode(periode)?;

        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT e.jenis, COUNT(*) \
             FROM pemeriksaan e JOIN pasien p ON p.id = e.pasien_id \
             WHERE substr(e.tanggal, 1, 7) = ? \
               AND e.deleted_at IS NULL AND e.is_purged = 0 \
               AND p.deleted_at IS NULL AND p.is_purged = 0 \
             GROUP BY e.jenis",
        )
        .bind(periode)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = ServiceCounts::default();
        for (jenis, n) in rows {
            match jenis.as_str() {
                j if j == ServiceKind::Anc.table() => counts.anc = n,
                j if j == ServiceKind::Kb.table() => counts.kb = n,
                j if j == ServiceKind::Imunisasi.table() => counts.imunisasi = n,
                j if j == ServiceKind::Persalinan.table() => counts.persalinan = n,
                j if j == ServiceKind::Kunjungan.table() => counts.kunjungan = n,
                other => tracing::warn!(%other, "unknown service kind in pemeriksaan"),
            }
        }
        Ok(counts)
    }

    /// Freezes the current summary of a period into a `laporan` row.
    pub async fn snapshot(&self, actor: Option<&str>, periode: &str) -> ServiceResult<Laporan> {
        let counts = self.summary(periode).await?;

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO laporan \
             (id, periode, jumlah_anc, jumlah_kb, jumlah_imunisasi, jumlah_persalinan, \
              jumlah_kunjungan, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(periode)
        .bind(counts.anc)
        .bind(counts.kb)
        .bind(counts.imunisasi)
        .bind(counts.persalinan)
        .bind(counts.kunjungan)
        .bind(actor)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.audit.record(actor, AuditAction::Create, "laporan", &id).await;
        self.get(&id).await
    }

    pub async fn list(&self) -> ServiceResult<Vec<Laporan>> {
        let rows = sqlx::query_as::<_, Laporan>(
            "SELECT id, periode, jumlah_anc, jumlah_kb, jumlah_imunisasi, jumlah_persalinan, \
             jumlah_kunjungan, created_by, created_at \
             FROM laporan ORDER BY created_at DESC LIMIT 100",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: &str) -> ServiceResult<Laporan> {
        sqlx::query_as::<_, Laporan>(
            "SELECT id, periode, jumlah_anc, jumlah_kb, jumlah_imunisasi, jumlah_persalinan, \
             jumlah_kunjungan, created_by, created_at \
             FROM laporan WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("laporan"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periode_format() {
        assert!(validate_periode("2026-01").is_ok());
        assert!(validate_periode("2026-12").is_ok());
        assert!(validate_periode("2026-13").is_err());
        assert!(validate_periode("2026-00").is_err());
        assert!(validate_periode("202601").is_err());
        assert!(validate_periode("26-01").is_err());
        assert!(validate_periode("2026-1").is_err());
    }
}
