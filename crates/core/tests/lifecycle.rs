//! Soft-delete / restore / purge behaviour for examinations and patients.

mod common;

use bidanku_core::services::Anc;
use bidanku_core::{PatientService, RegistrationService, ServiceError};

#[tokio::test]
async fn soft_delete_then_restore_round_trips_unchanged() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    let outcome = anc
        .register(None, &common::anc_payload("Siti", Some("3201234567890010")))
        .await
        .expect("registration");
    let before = anc.get(&outcome.pemeriksaan_id).await.expect("before");

    anc.soft_delete(Some("user-1"), &outcome.pemeriksaan_id)
        .await
        .expect("soft delete");

    // Hidden from the default read paths...
    let err = anc.get(&outcome.pemeriksaan_id).await.expect_err("hidden");
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(anc.list(None, None).await.expect("list").is_empty());

    // ...but visible in the deleted listing.
    let deleted = anc.deleted().await.expect("deleted list");
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].pemeriksaan.id, outcome.pemeriksaan_id);
    assert!(deleted[0].pemeriksaan.deleted_at.is_some());

    anc.restore(Some("user-1"), &outcome.pemeriksaan_id)
        .await
        .expect("restore");

    let after = anc.get(&outcome.pemeriksaan_id).await.expect("after");
    assert_eq!(after.detail, before.detail);
    assert_eq!(after.pemeriksaan.subjektif, before.pemeriksaan.subjektif);
    assert_eq!(after.pemeriksaan.tanggal, before.pemeriksaan.tanggal);
    assert!(after.pemeriksaan.deleted_at.is_none());

    // DELETE then RESTORE were audited.
    let actions: Vec<(String,)> =
        sqlx::query_as("SELECT aksi FROM audit_logs ORDER BY rowid")
            .fetch_all(&pool)
            .await
            .expect("audit rows");
    let actions: Vec<&str> = actions.iter().map(|(a,)| a.as_str()).collect();
    assert_eq!(actions, vec!["CREATE", "DELETE", "RESTORE"]);
}

#[tokio::test]
async fn restoring_an_active_record_is_a_reported_no_op() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    let outcome = anc
        .register(None, &common::anc_payload("Siti", None))
        .await
        .expect("registration");

    let err = anc
        .restore(None, &outcome.pemeriksaan_id)
        .await
        .expect_err("restore of an active row must not succeed");
    assert!(matches!(err, ServiceError::NotFound(_)));

    // State is untouched.
    assert!(anc.get(&outcome.pemeriksaan_id).await.is_ok());
}

#[tokio::test]
async fn purge_requires_prior_soft_delete_and_is_terminal() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    let outcome = anc
        .register(None, &common::anc_payload("Siti", None))
        .await
        .expect("registration");

    // Active -> Purged is not a supported transition.
    let err = anc
        .purge(None, &outcome.pemeriksaan_id)
        .await
        .expect_err("purge without soft delete");
    assert!(matches!(err, ServiceError::NotFound(_)));

    anc.soft_delete(None, &outcome.pemeriksaan_id).await.expect("soft delete");
    anc.purge(None, &outcome.pemeriksaan_id).await.expect("purge");

    // Gone from both listings, and restore can no longer reach it.
    assert!(anc.list(None, None).await.expect("list").is_empty());
    assert!(anc.deleted().await.expect("deleted").is_empty());
    assert!(anc.get(&outcome.pemeriksaan_id).await.is_err());
    assert!(anc.restore(None, &outcome.pemeriksaan_id).await.is_err());

    // The row still exists physically, flagged as purged.
    assert_eq!(common::count(&pool, "pemeriksaan").await, 1);
}

#[tokio::test]
async fn soft_deleted_patient_hides_its_examinations() {
    let pool = common::pool().await;
    let audit = common::audit(&pool);
    let anc = RegistrationService::<Anc>::new(pool.clone(), audit.clone());
    let patients = PatientService::new(pool.clone(), audit);

    let outcome = anc
        .register(None, &common::anc_payload("Siti", Some("3201234567890011")))
        .await
        .expect("registration");

    patients
        .soft_delete(None, &outcome.pasien_id)
        .await
        .expect("patient delete");

    // The examination itself is still active...
    let deleted_at: Option<String> =
        sqlx::query_scalar("SELECT deleted_at FROM pemeriksaan WHERE id = ?")
            .bind(&outcome.pemeriksaan_id)
            .fetch_one(&pool)
            .await
            .expect("exam row");
    assert!(deleted_at.is_none());

    // ...yet invisible while its owner is hidden.
    assert!(anc.list(None, None).await.expect("list").is_empty());
    assert!(anc.get(&outcome.pemeriksaan_id).await.is_err());

    patients.restore(None, &outcome.pasien_id).await.expect("patient restore");
    assert_eq!(anc.list(None, None).await.expect("list").len(), 1);
}

#[tokio::test]
async fn patient_round_trip_preserves_fields() {
    let pool = common::pool().await;
    let patients = PatientService::new(pool.clone(), common::audit(&pool));

    let created = patients
        .create(None, &common::patient_input("Siti", Some("3201234567890012")))
        .await
        .expect("create");

    patients.soft_delete(None, &created.id).await.expect("delete");
    assert!(patients.get(&created.id).await.is_err());
    assert_eq!(patients.deleted().await.expect("deleted").len(), 1);

    patients.restore(None, &created.id).await.expect("restore");
    let restored = patients.get(&created.id).await.expect("get");

    assert_eq!(restored.nama, created.nama);
    assert_eq!(restored.nik, created.nik);
    assert_eq!(restored.umur, created.umur);
    assert_eq!(restored.alamat, created.alamat);
    assert_eq!(restored.telepon, created.telepon);
    assert_eq!(restored.created_at, created.created_at);
    assert!(restored.deleted_at.is_none());
}

#[tokio::test]
async fn purged_patient_releases_its_nik() {
    let pool = common::pool().await;
    let patients = PatientService::new(pool.clone(), common::audit(&pool));

    let nik = "3201234567890013";
    let first = patients
        .create(None, &common::patient_input("Siti", Some(nik)))
        .await
        .expect("create");

    // While the row exists (even soft-deleted), the NIK is taken.
    patients.soft_delete(None, &first.id).await.expect("delete");
    let err = patients
        .create(None, &common::patient_input("Lain", Some(nik)))
        .await
        .expect_err("duplicate NIK");
    assert!(matches!(err, ServiceError::Conflict(_)));

    patients.purge(None, &first.id).await.expect("purge");
    patients
        .create(None, &common::patient_input("Lain", Some(nik)))
        .await
        .expect("NIK is free again");
}

#[tokio::test]
async fn duplicate_nik_on_create_is_a_conflict() {
    let pool = common::pool().await;
    let patients = PatientService::new(pool.clone(), common::audit(&pool));

    patients
        .create(None, &common::patient_input("Siti", Some("3201234567890014")))
        .await
        .expect("first create");
    let err = patients
        .create(None, &common::patient_input("Lain", Some("3201234567890014")))
        .await
        .expect_err("second create must conflict");
    assert!(matches!(err, ServiceError::Conflict(_)));
}
