//! The two-step login flow, OTP upsert semantics and password reset.

mod common;

use std::sync::Arc;

use bidanku_core::{AuditLog, AuthService, LogMailer, NewUser, ServiceError, SqlitePool};

// Minimum bcrypt cost keeps the suite fast.
const TEST_COST: u32 = 4;

fn service(pool: &SqlitePool, otp_expiry_minutes: i64) -> AuthService {
    AuthService::new(
        pool.clone(),
        AuditLog::new(pool.clone()),
        Arc::new(LogMailer),
        otp_expiry_minutes,
        TEST_COST,
    )
}

fn new_user() -> NewUser {
    NewUser {
        nama: "Bidan Ratna".into(),
        username: "ratna".into(),
        email: "ratna@example.com".into(),
        password: "rahasia-sekali".into(),
    }
}

async fn stored_code(pool: &SqlitePool, user_id: &str) -> Option<String> {
    sqlx::query_scalar("SELECT kode FROM otp_codes WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .expect("otp lookup")
}

#[tokio::test]
async fn login_issues_a_six_digit_code_and_records_access() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    auth.login("ratna", "rahasia-sekali", Some("10.0.0.7"))
        .await
        .expect("password accepted");

    let kode = stored_code(&pool, &user.id).await.expect("code stored");
    assert_eq!(kode.len(), 6);
    assert!(kode.bytes().all(|b| b.is_ascii_digit()));

    let (berhasil, alamat_ip): (bool, Option<String>) =
        sqlx::query_as("SELECT berhasil, alamat_ip FROM audit_log_akses ORDER BY rowid DESC")
            .fetch_one(&pool)
            .await
            .expect("access row");
    assert!(berhasil);
    assert_eq!(alamat_ip.as_deref(), Some("10.0.0.7"));
}

#[tokio::test]
async fn wrong_password_fails_and_is_recorded() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    let err = auth
        .login("ratna", "salah", None)
        .await
        .expect_err("wrong password");
    assert!(matches!(err, ServiceError::Unauthorized(_)));
    assert!(stored_code(&pool, &user.id).await.is_none());

    let berhasil: bool =
        sqlx::query_scalar("SELECT berhasil FROM audit_log_akses ORDER BY rowid DESC")
            .fetch_one(&pool)
            .await
            .expect("access row");
    assert!(!berhasil);
}

#[tokio::test]
async fn code_is_consumed_on_success_and_cannot_be_replayed() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    auth.login("ratna", "rahasia-sekali", None).await.expect("login");
    let kode = stored_code(&pool, &user.id).await.expect("code");

    let verified = auth.verify_otp("ratna", &kode, None).await.expect("verify");
    assert_eq!(verified.id, user.id);
    assert!(stored_code(&pool, &user.id).await.is_none());

    let err = auth
        .verify_otp("ratna", &kode, None)
        .await
        .expect_err("replay must fail");
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn a_new_login_replaces_the_outstanding_code() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    auth.login("ratna", "rahasia-sekali", None).await.expect("first login");
    let first = stored_code(&pool, &user.id).await.expect("first code");

    // Re-login until the generated code differs (codes are random and may
    // collide once in a million tries).
    let mut second = first.clone();
    for _ in 0..10 {
        auth.login("ratna", "rahasia-sekali", None).await.expect("re-login");
        second = stored_code(&pool, &user.id).await.expect("second code");
        if second != first {
            break;
        }
    }
    assert_ne!(first, second, "code was not replaced");

    // Exactly one outstanding row per user, and the old code is dead.
    assert_eq!(common::count(&pool, "otp_codes").await, 1);
    let err = auth
        .verify_otp("ratna", &first, None)
        .await
        .expect_err("old code must be invalid");
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    auth.verify_otp("ratna", &second, None).await.expect("latest code works");
}

#[tokio::test]
async fn expired_code_is_rejected() {
    let pool = common::pool().await;
    let auth = service(&pool, -1);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    auth.login("ratna", "rahasia-sekali", None).await.expect("login");
    let kode = stored_code(&pool, &user.id).await.expect("code");

    let err = auth
        .verify_otp("ratna", &kode, None)
        .await
        .expect_err("expired code");
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn wrong_code_is_rejected_and_code_survives() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    auth.login("ratna", "rahasia-sekali", None).await.expect("login");
    let kode = stored_code(&pool, &user.id).await.expect("code");
    let wrong = if kode == "000000" { "000001" } else { "000000" };

    let err = auth
        .verify_otp("ratna", wrong, None)
        .await
        .expect_err("wrong code");
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    // A failed guess does not burn the real code.
    auth.verify_otp("ratna", &kode, None).await.expect("real code still valid");
}

#[tokio::test]
async fn reset_password_replaces_the_credential() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    auth.reset_password(&user.id, "sandi-baru-123").await.expect("reset");

    let err = auth
        .login("ratna", "rahasia-sekali", None)
        .await
        .expect_err("old password dead");
    assert!(matches!(err, ServiceError::Unauthorized(_)));
    auth.login("ratna", "sandi-baru-123", None).await.expect("new password works");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    auth.create_user(None, &new_user()).await.expect("first");

    let mut dup = new_user();
    dup.email = "other@example.com".into();
    let err = auth.create_user(None, &dup).await.expect_err("duplicate");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn short_password_is_rejected_on_reset() {
    let pool = common::pool().await;
    let auth = service(&pool, 5);
    let user = auth.create_user(None, &new_user()).await.expect("user");

    let err = auth
        .reset_password(&user.id, "pendek")
        .await
        .expect_err("short password");
    assert!(matches!(err, ServiceError::Validation(_)));
}
