//! Staff accounts and the two-step login flow.
//!
//! Login is password-then-code: a correct password issues a 6-digit
//! one-time code that is upserted per user (only the latest code is ever
//! valid) and handed to the [`OtpMailer`]. A second call exchanges a valid,
//! unexpired code for an authenticated user; the HTTP layer mints the JWT.
//! Every attempt, successful or not, lands in the access log.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLog};
use crate::error::{ServiceError, ServiceResult};
use crate::validate::Validator;

/// A staff account. The password hash never leaves this module.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct User {
    pub id: String,
    pub nama: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a staff account.
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct NewUser {
    pub nama: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    fn validate(&self) -> ServiceResult<()> {
        let mut v = Validator::new();
        v.require("nama", &self.nama);
        v.require("username", &self.username);
        if !self.email.contains('@') {
            v.push("email", "email tidak valid");
        }
        if self.password.len() < 8 {
            v.push("password", "password minimal 8 karakter");
        }
        v.finish()
    }
}

/// Outbound delivery of one-time codes and reset tokens. Mail transport is
/// outside this system; the default implementation logs instead of sending.
pub trait OtpMailer: Send + Sync {
    fn send_otp(&self, email: &str, nama: &str, kode: &str);
    fn send_reset(&self, email: &str, nama: &str, token: &str);
}

/// Development mailer: writes the code to the log instead of sending mail.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl OtpMailer for LogMailer {
    fn send_otp(&self, email: &str, nama: &str, kode: &str) {
        tracing::info!(%email, %nama, %kode, "mail transport disabled, OTP code logged");
    }

    fn send_reset(&self, email: &str, nama: &str, token: &str) {
        tracing::info!(%email, %nama, %token, "mail transport disabled, reset token logged");
    }
}

/// Generates a 6-digit numeric one-time code, zero-padded.
fn generate_otp() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: String,
    nama: String,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            nama: self.nama,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CREDENTIAL_COLUMNS: &str =
    "id, nama, username, email, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    audit: AuditLog,
    mailer: std::sync::Arc<dyn OtpMailer>,
    otp_expiry_minutes: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        pool: SqlitePool,
        audit: AuditLog,
        mailer: std::sync::Arc<dyn OtpMailer>,
        otp_expiry_minutes: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            pool,
            audit,
            mailer,
            otp_expiry_minutes,
            bcrypt_cost,
        }
    }

    /// Creates a staff account. Username and email are unique.
    pub async fn create_user(&self, actor: Option<&str>, input: &NewUser) -> ServiceResult<User> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let hash = bcrypt::hash(&input.password, self.bcrypt_cost)?;

        sqlx::query(
            "INSERT INTO users (id, nama, username, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(input.nama.trim())
        .bind(input.username.trim())
        .bind(input.email.trim())
        .bind(&hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.audit.record(actor, AuditAction::Create, "users", &id).await;
        self.user_by_id(&id).await
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            "SELECT id, nama, username, email, created_at, updated_at \
             FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn user_by_id(&self, id: &str) -> ServiceResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, nama, username, email, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn user_by_email(&self, email: &str) -> ServiceResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, nama, username, email, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("user"))
    }

    /// Step one of login: verifies the password, then issues and delivers a
    /// fresh one-time code. The upsert keyed on the user id guarantees at
    /// most one outstanding code per user.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        alamat_ip: Option<&str>,
    ) -> ServiceResult<()> {
        let row = self.credentials_by_username(username).await?;

        let Some(row) = row else {
            self.audit.record_access(username, false, alamat_ip).await;
            return Err(ServiceError::Unauthorized(
                "username atau password salah".into(),
            ));
        };

        if !bcrypt::verify(password, &row.password_hash)? {
            self.audit.record_access(username, false, alamat_ip).await;
            return Err(ServiceError::Unauthorized(
                "username atau password salah".into(),
            ));
        }

        let kode = generate_otp();
        let kadaluarsa = Utc::now() + Duration::minutes(self.otp_expiry_minutes);

        sqlx::query(
            "INSERT INTO otp_codes (user_id, kode, kadaluarsa, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
               kode = excluded.kode, \
               kadaluarsa = excluded.kadaluarsa, \
               created_at = excluded.created_at",
        )
        .bind(&row.id)
        .bind(&kode)
        .bind(kadaluarsa)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.mailer.send_otp(&row.email, &row.nama, &kode);
        self.audit.record_access(username, true, alamat_ip).await;
        Ok(())
    }

    /// Step two of login: exchanges a valid, unexpired code for the user.
    /// The code is consumed; replaying it fails.
    pub async fn verify_otp(
        &self,
        username: &str,
        kode: &str,
        alamat_ip: Option<&str>,
    ) -> ServiceResult<User> {
        let row = self.credentials_by_username(username).await?;
        let Some(row) = row else {
            self.audit.record_access(username, false, alamat_ip).await;
            return Err(ServiceError::Unauthorized("kode OTP tidak valid".into()));
        };

        let stored: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT kode, kadaluarsa FROM otp_codes WHERE user_id = ?")
                .bind(&row.id)
                .fetch_optional(&self.pool)
                .await?;

        let valid = matches!(
            &stored,
            Some((stored_kode, kadaluarsa))
                if stored_kode == kode.trim() && *kadaluarsa > Utc::now()
        );

        if !valid {
            self.audit.record_access(username, false, alamat_ip).await;
            return Err(ServiceError::Unauthorized(
                "kode OTP tidak valid atau kadaluarsa".into(),
            ));
        }

        sqlx::query("DELETE FROM otp_codes WHERE user_id = ?")
            .bind(&row.id)
            .execute(&self.pool)
            .await?;

        self.audit.record_access(username, true, alamat_ip).await;
        Ok(row.into_user())
    }

    /// Hands a minted reset token to the mailer.
    pub fn deliver_reset_token(&self, user: &User, token: &str) {
        self.mailer.send_reset(&user.email, &user.nama, token);
    }

    /// Completes a password reset for the given user id.
    pub async fn reset_password(&self, user_id: &str, password: &str) -> ServiceResult<()> {
        if password.len() < 8 {
            return Err(ServiceError::invalid(
                "password",
                "password minimal 8 karakter",
            ));
        }

        let hash = bcrypt::hash(password, self.bcrypt_cost)?;
        let done = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(ServiceError::NotFound("user"));
        }

        self.audit
            .record(Some(user_id), AuditAction::Update, "users", user_id)
            .await;
        Ok(())
    }

    async fn credentials_by_username(
        &self,
        username: &str,
    ) -> ServiceResult<Option<CredentialRow>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE username = ?",
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
