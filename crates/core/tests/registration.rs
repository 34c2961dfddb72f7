//! Write-path behaviour of the shared registration protocol.

mod common;

use bidanku_core::services::{Anc, Imunisasi, Kb, Persalinan};
use bidanku_core::{RegistrationService, ServiceError};

#[tokio::test]
async fn fresh_nik_creates_patient_examination_and_detail() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    let outcome = anc
        .register(Some("user-1"), &common::anc_payload("Siti", Some("3201234567890001")))
        .await
        .expect("registration succeeds");

    assert_eq!(common::count(&pool, "pasien").await, 1);
    assert_eq!(common::count(&pool, "pemeriksaan").await, 1);
    assert_eq!(common::count(&pool, "anc").await, 1);

    // The audit entry lands after commit, keyed to the detail row.
    let (aksi, tabel, entitas_id): (String, String, String) =
        sqlx::query_as("SELECT aksi, tabel, entitas_id FROM audit_logs")
            .fetch_one(&pool)
            .await
            .expect("one audit row");
    assert_eq!(aksi, "CREATE");
    assert_eq!(tabel, "anc");
    assert_eq!(entitas_id, outcome.detail_id);
}

#[tokio::test]
async fn reused_nik_reuses_patient_and_overwrites_demographics() {
    let pool = common::pool().await;
    let audit = common::audit(&pool);
    let anc = RegistrationService::<Anc>::new(pool.clone(), audit.clone());
    let kb = RegistrationService::<Kb>::new(pool.clone(), audit);

    let nik = "3201234567890002";
    let first = anc
        .register(None, &common::anc_payload("Siti A", Some(nik)))
        .await
        .expect("first registration");
    let second = kb
        .register(None, &common::kb_payload("Siti Aminah", Some(nik)))
        .await
        .expect("second registration");

    // One patient, shared by both encounters.
    assert_eq!(common::count(&pool, "pasien").await, 1);
    assert_eq!(first.pasien_id, second.pasien_id);

    // Demographics follow the most recent registration payload.
    let nama: String = sqlx::query_scalar("SELECT nama FROM pasien WHERE id = ?")
        .bind(&first.pasien_id)
        .fetch_one(&pool)
        .await
        .expect("patient row");
    assert_eq!(nama, "Siti Aminah");

    let owners: Vec<(String,)> = sqlx::query_as("SELECT pasien_id FROM pemeriksaan")
        .fetch_all(&pool)
        .await
        .expect("examinations");
    assert_eq!(owners.len(), 2);
    assert!(owners.iter().all(|(id,)| id == &first.pasien_id));
}

#[tokio::test]
async fn list_filtered_by_nik_returns_the_single_match() {
    let pool = common::pool().await;
    let audit = common::audit(&pool);
    let anc = RegistrationService::<Anc>::new(pool.clone(), audit);

    let nik = "9999999999999999";
    anc.register(None, &common::anc_payload("Ibu Uji", Some(nik)))
        .await
        .expect("registration");
    anc.register(None, &common::anc_payload("Ibu Lain", Some("1111111111111111")))
        .await
        .expect("other registration");

    let records = anc.list(None, Some(nik)).await.expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pasien.nama, "Ibu Uji");
    assert_eq!(records[0].pasien.nik.as_deref(), Some(nik));
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_any_write() {
    let pool = common::pool().await;
    let imunisasi = RegistrationService::<Imunisasi>::new(pool.clone(), common::audit(&pool));

    let mut payload = common::imunisasi_payload("Bayi Ani", "BCG");
    payload.jenis_imunisasi = "".into();

    let err = imunisasi
        .register(None, &payload)
        .await
        .expect_err("validation must fail");
    assert!(matches!(err, ServiceError::Validation(_)));

    // Zero side effects: no patient, no examination, no detail, no audit.
    for table in ["pasien", "pemeriksaan", "imunisasi", "audit_logs"] {
        assert_eq!(common::count(&pool, table).await, 0, "{table} must stay empty");
    }
}

#[tokio::test]
async fn delivery_start_time_defaults_when_absent() {
    let pool = common::pool().await;
    let persalinan = RegistrationService::<Persalinan>::new(pool.clone(), common::audit(&pool));

    let outcome = persalinan
        .register(None, &common::persalinan_payload("Dewi", Some("3201234567890003")))
        .await
        .expect("registration");

    let record = persalinan.get(&outcome.pemeriksaan_id).await.expect("detail");
    assert_eq!(record.detail.jam_mulai, "08:00:00");
    assert_eq!(record.detail.jam_selesai.as_deref(), Some("10:45:00"));
}

#[tokio::test]
async fn update_replaces_soap_and_detail_but_not_demographics() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    let outcome = anc
        .register(None, &common::anc_payload("Siti", Some("3201234567890004")))
        .await
        .expect("registration");

    let mut updated = common::anc_payload("Nama Baru", Some("3201234567890004"));
    updated.hasil_pemeriksaan = Some("TD 120/80".into());
    anc.update(Some("user-1"), &outcome.pemeriksaan_id, &updated)
        .await
        .expect("update");

    let record = anc.get(&outcome.pemeriksaan_id).await.expect("detail");
    assert_eq!(record.pemeriksaan.objektif, "Hasil pemeriksaan: TD 120/80");
    // Demographics only change through the dedicated patient endpoint.
    assert_eq!(record.pasien.nama, "Siti");
}

#[tokio::test]
async fn update_of_unknown_examination_reports_not_found() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    let err = anc
        .update(None, "missing-id", &common::anc_payload("Siti", None))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn blank_nik_always_creates_a_new_patient() {
    let pool = common::pool().await;
    let anc = RegistrationService::<Anc>::new(pool.clone(), common::audit(&pool));

    anc.register(None, &common::anc_payload("Ibu Satu", None))
        .await
        .expect("first");
    let mut payload = common::anc_payload("Ibu Dua", Some("   "));
    payload.pasien.nik = Some("   ".into());
    anc.register(None, &payload).await.expect("second");

    assert_eq!(common::count(&pool, "pasien").await, 2);
}
