//! Append-only audit trail.
//!
//! Two append-only tables back this module: `audit_logs` for state-changing
//! business actions and `audit_log_akses` for login attempts. Writes are
//! best-effort: a failing audit sink is logged as a warning and never undoes
//! or fails the business operation that triggered it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ServiceResult;

/// The four recorded business actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Restore,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Restore => "RESTORE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable business-audit fact.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AuditEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub aksi: String,
    pub tabel: String,
    pub entitas_id: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable login-attempt fact.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AccessEntry {
    pub id: String,
    pub username: String,
    pub berhasil: bool,
    pub alamat_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filters for the audit query endpoint. All fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Exact action match (CREATE/UPDATE/DELETE/RESTORE).
    pub aksi: Option<String>,
    /// Substring match on the affected table/category.
    pub tabel: Option<String>,
    /// Substring match on the acting user's username.
    pub username: Option<String>,
    /// Inclusive start date.
    pub dari: Option<NaiveDate>,
    /// Inclusive end date.
    pub sampai: Option<NaiveDate>,
}

/// Responses are capped to bound their size; there is no pagination beyond
/// this limit.
const MAX_ROWS: i64 = 1000;

#[derive(Clone)]
pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records one business action. Best-effort: errors are warn-logged and
    /// swallowed, so a broken audit sink cannot fail a committed operation.
    pub async fn record(
        &self,
        user_id: Option<&str>,
        action: AuditAction,
        tabel: &str,
        entitas_id: &str,
    ) {
        if let Err(err) = self.insert(user_id, action, tabel, entitas_id).await {
            tracing::warn!(%tabel, %entitas_id, %action, error = %err, "audit write failed");
        }
    }

    async fn insert(
        &self,
        user_id: Option<&str>,
        action: AuditAction,
        tabel: &str,
        entitas_id: &str,
    ) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (id, user_id, aksi, tabel, entitas_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(action.as_str())
        .bind(tabel)
        .bind(entitas_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Records one login attempt, best-effort like [`AuditLog::record`].
    pub async fn record_access(&self, username: &str, berhasil: bool, alamat_ip: Option<&str>) {
        let result = sqlx::query(
            "INSERT INTO audit_log_akses (id, username, berhasil, alamat_ip, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(username)
        .bind(berhasil)
        .bind(alamat_ip)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(%username, error = %err, "access-log write failed");
        }
    }

    /// Queries the business audit trail, newest first, capped at 1000 rows.
    pub async fn query(&self, filter: &AuditFilter) -> ServiceResult<Vec<AuditEntry>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT a.id, a.user_id, a.aksi, a.tabel, a.entitas_id, a.created_at \
             FROM audit_logs a \
             LEFT JOIN users u ON u.id = a.user_id \
             WHERE 1 = 1",
        );

        if let Some(aksi) = &filter.aksi {
            qb.push(" AND a.aksi = ").push_bind(aksi.to_uppercase());
        }
        if let Some(tabel) = &filter.tabel {
            qb.push(" AND a.tabel LIKE ").push_bind(format!("%{tabel}%"));
        }
        if let Some(username) = &filter.username {
            qb.push(" AND u.username LIKE ")
                .push_bind(format!("%{username}%"));
        }
        if let Some(dari) = filter.dari {
            qb.push(" AND a.created_at >= ")
                .push_bind(dari.and_time(NaiveTime::MIN).and_utc());
        }
        if let Some(sampai) = filter.sampai {
            if let Some(next_day) = sampai.succ_opt() {
                qb.push(" AND a.created_at < ")
                    .push_bind(next_day.and_time(NaiveTime::MIN).and_utc());
            }
        }

        qb.push(" ORDER BY a.created_at DESC LIMIT ").push_bind(MAX_ROWS);

        let rows = qb
            .build_query_as::<AuditEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Queries the login-attempt log, newest first, capped at 1000 rows.
    pub async fn access_log(&self, username: Option<&str>) -> ServiceResult<Vec<AccessEntry>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, username, berhasil, alamat_ip, created_at \
             FROM audit_log_akses WHERE 1 = 1",
        );

        if let Some(username) = username {
            qb.push(" AND username LIKE ")
                .push_bind(format!("%{username}%"));
        }

        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(MAX_ROWS);

        let rows = qb
            .build_query_as::<AccessEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
